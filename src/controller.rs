//! Gallery state machine: chapter selection, rank stepping, style and theme
//! toggles, preloading and document sync.
//!
//! The controller never draws anything. Every transition rewrites the
//! relevant parts of its `ViewModel` from current state, so repeating an
//! action (or replaying a late event) cannot accumulate drift.

use log::{debug, error, info, warn};

use crate::assets::{AssetLoader, LoadCompletion, LoadPurpose, LoadTicket, RequestId};
use crate::catalog::{Catalog, ChapterKey, ImageRecord, present};
use crate::document::{DocumentSync, DocumentViewer};
use crate::error::GalleryError;
use crate::pages::PageMap;
use crate::preferences::{PreferenceStore, THEME_KEY};
use crate::preload::{AssetHandle, PreloadCache};
use crate::selection::{SelectionState, Style};
use crate::theme::Theme;
use crate::view::{
    Artwork, Controls, NO_DESCRIPTION, NO_SIGNIFICANCE, NavItem, Presenter, UserAction, ViewModel,
};

pub struct GalleryController<L, S, V> {
    catalog: Catalog,
    pages: PageMap,
    loader: L,
    store: S,
    viewer: V,
    document_sync: DocumentSync,
    selection: SelectionState,
    preload: PreloadCache,
    theme: Theme,
    view: ViewModel,
    /// Display or toggle load whose completion may still change the artwork
    pending: Option<LoadTicket>,
    next_request_id: u64,
    disabled: bool,
}

impl<L, S, V> GalleryController<L, S, V>
where
    L: AssetLoader,
    S: PreferenceStore,
    V: DocumentViewer,
{
    /// Build the controller and show the first chapter that has artwork
    pub fn new(
        catalog: Catalog,
        pages: PageMap,
        loader: L,
        store: S,
        viewer: V,
        document_sync: DocumentSync,
    ) -> Self {
        let mut controller = Self {
            catalog,
            pages,
            loader,
            store,
            viewer,
            document_sync,
            selection: SelectionState::default(),
            preload: PreloadCache::new(),
            theme: Theme::default(),
            view: ViewModel::default(),
            pending: None,
            next_request_id: 1,
            disabled: false,
        };
        controller.initialize();
        controller
    }

    fn initialize(&mut self) {
        let theme = self.stored_theme();
        self.apply_theme(theme);
        self.view.document = self.viewer.current_target().to_string();

        if self.catalog.is_empty() {
            self.enter_fatal(GalleryError::MissingData);
            return;
        }

        self.view.nav = self
            .catalog
            .navigable_chapters()
            .into_iter()
            .map(|chapter| NavItem {
                chapter,
                label: format!("Chapter {chapter}"),
                highlighted: false,
            })
            .collect();
        self.view.controls.theme_toggle = true;

        let start = self
            .catalog
            .first_navigable()
            .or_else(|| self.catalog.chapters().next().map(|(key, _)| key));
        if let Some(chapter) = start {
            info!(
                "Gallery ready: {} navigable chapter(s), starting at {chapter}",
                self.view.nav.len()
            );
            self.select_chapter(chapter);
        }
    }

    fn stored_theme(&self) -> Theme {
        match self.store.get(THEME_KEY) {
            Ok(Some(value)) => Theme::parse(&value).unwrap_or_else(|| {
                warn!("Ignoring unknown theme preference {value:?}");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!("Could not read theme preference: {e:#}");
                Theme::default()
            }
        }
    }

    fn enter_fatal(&mut self, err: GalleryError) {
        error!("{err}");
        self.disabled = true;
        self.pending = None;
        self.selection = SelectionState::default();
        self.view.nav.clear();
        self.view.controls = Controls::default();
        self.view.artwork = Artwork::Message(err.to_string());
        self.view.fatal = Some(err.to_string());
    }

    pub fn handle(&mut self, action: UserAction) {
        if self.disabled {
            debug!("Ignoring {action:?}: gallery disabled");
            return;
        }
        match action {
            UserAction::SelectChapter(chapter) => self.select_chapter(chapter),
            UserAction::Previous => self.previous(),
            UserAction::Next => self.next(),
            UserAction::ToggleStyle => self.toggle_style(),
            UserAction::ToggleTheme => self.toggle_theme(),
            UserAction::ToggleSignificance => self.toggle_significance(),
        }
    }

    pub fn select_chapter(&mut self, chapter: ChapterKey) {
        if self.disabled {
            return;
        }
        debug!("Selecting chapter {chapter}");
        self.highlight(chapter);

        match self.catalog.first_rank(chapter) {
            None => {
                let err = GalleryError::EmptyChapter(chapter);
                warn!("{err}");
                self.pending = None;
                self.selection = SelectionState {
                    chapter: Some(chapter),
                    rank: None,
                    style: Style::default(),
                };
                self.view.title = format!("Chapter {chapter}");
                self.view.description.clear();
                self.view.significance.clear();
                self.view.significance_expanded = false;
                self.view.style = None;
                self.view.artwork = Artwork::Message(err.to_string());
                self.view.controls.previous = false;
                self.view.controls.next = false;
                self.view.controls.style_toggle = false;
                self.sync_document(chapter);
            }
            Some(first_rank) => {
                self.show_record(chapter, first_rank);
                self.sync_document(chapter);
                self.preload(chapter, Some(first_rank));
            }
        }
    }

    /// Record Display. Returns false when (chapter, rank) names no record.
    pub fn show_record(&mut self, chapter: ChapterKey, rank: i64) -> bool {
        if self.disabled {
            return false;
        }
        let Some(record) = self.catalog.record(chapter, rank).cloned() else {
            warn!("No record for chapter {chapter}, rank {rank}");
            return false;
        };

        self.highlight(chapter);
        self.selection = SelectionState {
            chapter: Some(chapter),
            rank: Some(rank),
            style: Style::Naturalistic,
        };
        self.view.title = format!("{chapter}-{rank}");
        self.view.description = present(&record.description)
            .unwrap_or(NO_DESCRIPTION)
            .to_string();
        self.view.significance = present(&record.significance)
            .unwrap_or(NO_SIGNIFICANCE)
            .to_string();
        self.view.significance_expanded = false;
        self.view.controls.style_toggle = record.has_both_styles();
        self.update_step_controls(chapter, rank);

        let resolved = match (
            present(&record.naturalistic_src),
            present(&record.abstract_src),
        ) {
            (Some(src), _) => Some((Style::Naturalistic, src.to_string())),
            (None, Some(src)) => {
                warn!(
                    "{}",
                    GalleryError::MissingSource {
                        chapter,
                        rank,
                        wanted: Style::Naturalistic,
                        fallback: Style::Abstract,
                    }
                );
                Some((Style::Abstract, src.to_string()))
            }
            (None, None) => None,
        };

        match resolved {
            Some((style, src)) => {
                self.selection.style = style;
                self.view.style = Some(style);
                self.begin_display(&record, style, src, LoadPurpose::Display);
            }
            None => {
                let err = GalleryError::NoUsableSource { chapter, rank };
                warn!("{err}");
                self.pending = None;
                self.view.style = None;
                self.view.artwork = Artwork::Message(err.to_string());
            }
        }
        true
    }

    fn begin_display(
        &mut self,
        record: &ImageRecord,
        style: Style,
        src: String,
        purpose: LoadPurpose,
    ) {
        let Some(chapter) = self.selection.chapter else {
            return;
        };
        let alt = alt_text(style, record);

        if purpose == LoadPurpose::Display && self.preload.is_warmed(chapter, &src) {
            debug!("Chapter {chapter} rank {}: {src} already warm", record.rank);
            self.pending = None;
            self.view.artwork = Artwork::Shown { src, alt };
            return;
        }

        let ticket = self.ticket(chapter, record.rank, style, &src, purpose);
        self.view.artwork = Artwork::Loading { src, alt };
        self.loader.request(&ticket);
        self.pending = Some(ticket);
    }

    fn ticket(
        &mut self,
        chapter: ChapterKey,
        rank: i64,
        style: Style,
        source: &str,
        purpose: LoadPurpose,
    ) -> LoadTicket {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        LoadTicket {
            id,
            chapter,
            rank,
            style,
            source: source.to_string(),
            purpose,
        }
    }

    fn update_step_controls(&mut self, chapter: ChapterKey, rank: i64) {
        let ranks = self.catalog.ranks(chapter);
        match ranks.iter().position(|&r| r == rank) {
            Some(pos) => {
                self.view.controls.previous = pos > 0;
                self.view.controls.next = pos + 1 < ranks.len();
            }
            None => {
                self.view.controls.previous = false;
                self.view.controls.next = false;
            }
        }
    }

    fn highlight(&mut self, chapter: ChapterKey) {
        for item in &mut self.view.nav {
            item.highlighted = item.chapter == chapter;
        }
    }

    fn sync_document(&mut self, chapter: ChapterKey) {
        // A missing page is already logged by the sync and leaves the viewer as is
        let _ = self
            .document_sync
            .sync(&mut self.viewer, &self.pages, chapter);
        self.view.document = self.viewer.current_target().to_string();
    }

    /// Warm every record of `chapter` except `exclude`.
    ///
    /// Returns false when the chapter already has a cache entry; nothing is
    /// scheduled twice.
    pub fn preload(&mut self, chapter: ChapterKey, exclude: Option<i64>) -> bool {
        if self.preload.begin(chapter).is_none() {
            return false;
        }

        let records = self.catalog.records(chapter).to_vec();
        let mut scheduled = 0;
        for record in records.iter().filter(|r| Some(r.rank) != exclude) {
            for (style, src) in [
                (Style::Naturalistic, &record.naturalistic_src),
                (Style::Abstract, &record.abstract_src),
            ] {
                let Some(src) = present(src) else {
                    continue;
                };
                let ticket = self.ticket(chapter, record.rank, style, src, LoadPurpose::Preload);
                self.preload
                    .register(chapter, AssetHandle::pending(ticket.id, src));
                self.loader.request(&ticket);
                scheduled += 1;
            }
        }
        debug!("Preloading {scheduled} image(s) for chapter {chapter}");
        true
    }

    pub fn previous(&mut self) {
        if let Some((chapter, rank)) = self.step_target(-1) {
            self.show_record(chapter, rank);
        }
    }

    pub fn next(&mut self) {
        if let Some((chapter, rank)) = self.step_target(1) {
            self.show_record(chapter, rank);
        }
    }

    fn step_target(&self, delta: isize) -> Option<(ChapterKey, i64)> {
        let (chapter, rank) = self.selection.position()?;
        let ranks = self.catalog.ranks(chapter);
        let pos = ranks.iter().position(|&r| r == rank)?;
        let target = pos.checked_add_signed(delta)?;
        ranks.get(target).map(|&r| (chapter, r))
    }

    pub fn toggle_style(&mut self) {
        let record = self
            .selection
            .position()
            .and_then(|(chapter, rank)| self.catalog.record(chapter, rank))
            .filter(|record| record.has_both_styles())
            .cloned();
        let Some(record) = record else {
            debug!("Style toggle unavailable for current selection");
            self.view.controls.style_toggle = false;
            return;
        };

        let style = self.selection.style.toggled();
        let src = match style {
            Style::Naturalistic => present(&record.naturalistic_src),
            Style::Abstract => present(&record.abstract_src),
        };
        let Some(src) = src.map(str::to_string) else {
            return;
        };
        self.selection.style = style;
        self.view.style = Some(style);
        self.begin_display(&record, style, src, LoadPurpose::Toggle);
    }

    pub fn toggle_significance(&mut self) {
        if self.selection.position().is_some() {
            self.view.significance_expanded = !self.view.significance_expanded;
        }
    }

    /// Show `theme` without persisting it
    pub fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.view.theme = theme;
        self.view.theme_icon = theme.icon();
    }

    pub fn toggle_theme(&mut self) {
        if self.disabled {
            return;
        }
        let theme = self.theme.toggled();
        self.apply_theme(theme);
        if let Err(e) = self.store.set(THEME_KEY, theme.as_str()) {
            error!("Failed to save theme preference: {e:#}");
        }
    }

    /// Feed back the outcome of a load started by this controller
    pub fn complete_load(&mut self, completion: LoadCompletion) {
        if completion.ticket.purpose == LoadPurpose::Preload {
            self.preload.mark(&completion);
            return;
        }

        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.id == completion.ticket.id);
        let still_selected = self.selection.position().is_some_and(|(chapter, rank)| {
            completion
                .ticket
                .targets(chapter, rank, self.selection.style)
        });
        if !is_current || !still_selected {
            debug!("Dropping stale completion {:?}", completion.ticket.id);
            return;
        }
        self.pending = None;

        let LoadCompletion { ticket, result } = completion;
        let alt = match std::mem::take(&mut self.view.artwork) {
            Artwork::Loading { alt, .. } => alt,
            _ => self
                .catalog
                .record(ticket.chapter, ticket.rank)
                .map(|record| alt_text(ticket.style, record))
                .unwrap_or_default(),
        };
        self.view.artwork = match result {
            Ok(info) => {
                debug!(
                    "Showing {} ({}x{})",
                    ticket.source, info.width, info.height
                );
                Artwork::Shown {
                    src: ticket.source,
                    alt,
                }
            }
            Err(fault) => {
                let err = GalleryError::AssetLoadFailure {
                    chapter: ticket.chapter,
                    rank: ticket.rank,
                    style: ticket.style,
                    path: ticket.source,
                    reason: fault.to_string(),
                };
                warn!("{err}");
                Artwork::Message(err.to_string())
            }
        };
    }

    /// Apply whatever the loader finished since the last call.
    /// Returns true if anything arrived.
    pub fn pump_loads(&mut self) -> bool {
        let completions = self.loader.poll_completions();
        let arrived = !completions.is_empty();
        for completion in completions {
            self.complete_load(completion);
        }
        arrived
    }

    pub fn present<P: Presenter + ?Sized>(&self, presenter: &mut P) {
        presenter.render(&self.view);
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn pending_load(&self) -> Option<&LoadTicket> {
        self.pending.as_ref()
    }

    pub fn preload_cache(&self) -> &PreloadCache {
        &self.preload
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }
}

fn alt_text(style: Style, record: &ImageRecord) -> String {
    match present(&record.description) {
        Some(description) => format!("{} interpretation of {description}", style.label()),
        None => format!("{} interpretation (rank {})", style.label(), record.rank),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::InlineViewer;
    use crate::preferences::MemoryPreferences;
    use crate::test_utils::test_helpers::RecordingLoader;

    type Controller = GalleryController<RecordingLoader, MemoryPreferences, InlineViewer>;

    fn key(n: u32) -> ChapterKey {
        ChapterKey::new(n).unwrap()
    }

    fn controller(catalog: Catalog) -> Controller {
        GalleryController::new(
            catalog,
            [(key(1), 5)].into_iter().collect(),
            RecordingLoader::new(),
            MemoryPreferences::new(),
            InlineViewer::new(),
            DocumentSync::new("book.pdf"),
        )
    }

    #[test]
    fn step_target_respects_boundaries() {
        let c = controller(Catalog::from_chapter_map([(
            key(1),
            vec![
                ImageRecord::new(2).with_naturalistic("a.png"),
                ImageRecord::new(9).with_naturalistic("b.png"),
            ],
        )]));
        assert_eq!(c.step_target(-1), None);
        assert_eq!(c.step_target(1), Some((key(1), 9)));
    }

    #[test]
    fn alt_text_names_style_and_description() {
        let record = ImageRecord::new(3).with_description("the great Peng");
        assert_eq!(
            alt_text(Style::Abstract, &record),
            "Abstract interpretation of the great Peng"
        );
        assert_eq!(
            alt_text(Style::Naturalistic, &ImageRecord::new(3)),
            "Naturalistic interpretation (rank 3)"
        );
    }

    #[test]
    fn record_without_sources_reports_no_usable_source() {
        let mut c = controller(Catalog::from_chapter_map([(
            key(1),
            vec![ImageRecord::new(1)],
        )]));
        assert_eq!(
            c.view().artwork.message(),
            Some("No image file available for chapter 1, rank 1.")
        );
        assert!(c.pending_load().is_none());
        assert!(!c.view().controls.style_toggle);
        assert_eq!(c.view().title, "1-1");

        c.toggle_style();
        assert!(!c.view().controls.style_toggle);
        assert_eq!(c.selection().style, Style::Naturalistic);
    }

    #[test]
    fn show_record_rejects_unknown_rank() {
        let mut c = controller(Catalog::from_chapter_map([(
            key(1),
            vec![ImageRecord::new(1).with_naturalistic("a.png")],
        )]));
        assert!(!c.show_record(key(1), 4));
        assert_eq!(c.selection().rank, Some(1));
    }
}
