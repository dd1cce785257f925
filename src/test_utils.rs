pub mod test_helpers {
    use std::collections::HashSet;
    use std::path::PathBuf;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::assets::{AssetInfo, AssetLoader, LoadCompletion, LoadFault, LoadPurpose, LoadTicket};
    use crate::catalog::{Catalog, ChapterKey, ImageRecord};
    use crate::event_source::{Event, KeyCode, SimulatedEventSource};
    use crate::pages::PageMap;

    pub fn key(n: u32) -> ChapterKey {
        ChapterKey::new(n).expect("test chapter keys are positive")
    }

    /// Loader that records every request; tests decide when and how each
    /// load finishes
    #[derive(Default)]
    pub struct RecordingLoader {
        requests: Vec<LoadTicket>,
        auto_complete: bool,
        failing: HashSet<String>,
        ready: Vec<LoadCompletion>,
    }

    impl RecordingLoader {
        pub fn new() -> Self {
            Self::default()
        }

        /// Finish every load as soon as it is requested; sources in
        /// `failing` fail, the rest succeed
        pub fn completing<I, T>(failing: I) -> Self
        where
            I: IntoIterator<Item = T>,
            T: Into<String>,
        {
            Self {
                auto_complete: true,
                failing: failing.into_iter().map(Into::into).collect(),
                ..Self::default()
            }
        }

        pub fn requests(&self) -> &[LoadTicket] {
            &self.requests
        }

        pub fn last(&self) -> Option<&LoadTicket> {
            self.requests.last()
        }

        pub fn with_purpose(&self, purpose: LoadPurpose) -> Vec<LoadTicket> {
            self.requests
                .iter()
                .filter(|t| t.purpose == purpose)
                .cloned()
                .collect()
        }

        pub fn sources(&self, purpose: LoadPurpose) -> Vec<String> {
            self.with_purpose(purpose)
                .into_iter()
                .map(|t| t.source)
                .collect()
        }
    }

    impl AssetLoader for RecordingLoader {
        fn request(&mut self, ticket: &LoadTicket) {
            self.requests.push(ticket.clone());
            if self.auto_complete {
                let completion = if self.failing.contains(&ticket.source) {
                    failed(ticket, "simulated failure")
                } else {
                    loaded(ticket)
                };
                self.ready.push(completion);
            }
        }

        fn poll_completions(&mut self) -> Vec<LoadCompletion> {
            std::mem::take(&mut self.ready)
        }
    }

    pub fn loaded(ticket: &LoadTicket) -> LoadCompletion {
        LoadCompletion::loaded(
            ticket.clone(),
            AssetInfo {
                path: PathBuf::from(&ticket.source),
                width: 64,
                height: 64,
            },
        )
    }

    pub fn failed(ticket: &LoadTicket, reason: &str) -> LoadCompletion {
        LoadCompletion::failed(ticket.clone(), LoadFault::generic(reason))
    }

    /// Two-record chapter 1 with page 5: rank 1 has both styles, rank 3
    /// only a naturalistic one
    pub fn two_record_catalog() -> (Catalog, PageMap) {
        let catalog = Catalog::from_chapter_map([(
            key(1),
            vec![
                ImageRecord::new(1)
                    .with_naturalistic("a.png")
                    .with_abstract("a2.png")
                    .with_description("the fish Kun")
                    .with_significance("Transformation"),
                ImageRecord::new(3).with_naturalistic("b.png"),
            ],
        )]);
        let pages = [(key(1), 5)].into_iter().collect();
        (catalog, pages)
    }

    /// Builder for simulated key presses
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self { events: Vec::new() }
        }

        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press_enter(mut self) -> Self {
            self.events.push(SimulatedEventSource::key(KeyCode::Enter));
            self
        }

        pub fn cursor_down(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('j'));
            }
            self
        }

        pub fn next_image(self) -> Self {
            self.press_char('l')
        }

        pub fn previous_image(self) -> Self {
            self.press_char('h')
        }

        pub fn toggle_style(self) -> Self {
            self.press_char('s')
        }

        pub fn toggle_theme(self) -> Self {
            self.press_char('t')
        }

        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    impl Default for TestScenarioBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).expect("test backend never fails")
    }

    /// Terminal buffer as text, trailing blanks trimmed
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use crate::assets::{AssetLoader, LoadPurpose, LoadTicket, RequestId};
    use crate::selection::Style;

    fn ticket(source: &str) -> LoadTicket {
        LoadTicket {
            id: RequestId::new(1),
            chapter: key(1),
            rank: 1,
            style: Style::Naturalistic,
            source: source.to_string(),
            purpose: LoadPurpose::Display,
        }
    }

    #[test]
    fn scenario_builder_counts_events() {
        let scenario = TestScenarioBuilder::new()
            .cursor_down(2)
            .press_enter()
            .next_image()
            .quit()
            .build();
        assert_eq!(scenario.remaining(), 5);
    }

    #[test]
    fn completing_loader_fails_listed_sources() {
        let mut loader = RecordingLoader::completing(["bad.png"]);
        loader.request(&ticket("good.png"));
        loader.request(&ticket("bad.png"));

        let done = loader.poll_completions();
        assert!(done[0].result.is_ok());
        assert!(done[1].result.is_err());
        assert!(loader.poll_completions().is_empty());
        assert_eq!(loader.requests().len(), 2);
    }
}
