//! Terminal front end: draws the view model and turns keys into actions

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use log::{debug, info, warn};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style as TextStyle},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::assets::AssetLoader;
use crate::catalog::ChapterKey;
use crate::controller::GalleryController;
use crate::document::{DocumentViewer, base_reference};
use crate::event_source::EventSource;
use crate::preferences::PreferenceStore;
use crate::theme::Base16Palette;
use crate::view::{Artwork, Presenter, UserAction, ViewModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

pub struct App<L, S, V> {
    pub controller: GalleryController<L, S, V>,
    nav_cursor: usize,
}

impl<L, S, V> App<L, S, V>
where
    L: AssetLoader,
    S: PreferenceStore,
    V: DocumentViewer,
{
    pub fn new(controller: GalleryController<L, S, V>) -> Self {
        let nav_cursor = controller
            .view()
            .nav
            .iter()
            .position(|item| item.highlighted)
            .unwrap_or(0);
        Self {
            controller,
            nav_cursor,
        }
    }

    pub fn nav_cursor(&self) -> usize {
        self.nav_cursor
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let action = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppAction::Quit),
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_cursor(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_cursor(-1);
                None
            }
            KeyCode::Enter => self
                .controller
                .view()
                .nav
                .get(self.nav_cursor)
                .map(|item| UserAction::SelectChapter(item.chapter)),
            KeyCode::Char(c) if c.is_ascii_digit() => match c.to_string().parse::<ChapterKey>() {
                Ok(chapter) => Some(UserAction::SelectChapter(chapter)),
                Err(e) => {
                    debug!("Ignoring key {c}: {e}");
                    None
                }
            },
            KeyCode::Char('h') | KeyCode::Left => Some(UserAction::Previous),
            KeyCode::Char('l') | KeyCode::Right => Some(UserAction::Next),
            KeyCode::Char('s') => Some(UserAction::ToggleStyle),
            KeyCode::Char('t') => Some(UserAction::ToggleTheme),
            KeyCode::Char('d') => Some(UserAction::ToggleSignificance),
            KeyCode::Char('o') => {
                self.open_document();
                None
            }
            _ => None,
        };

        if let Some(action) = action {
            self.controller.handle(action);
            if let UserAction::SelectChapter(chapter) = action {
                self.sync_cursor(chapter);
            }
        }
        None
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.controller.view().nav.len();
        if len == 0 {
            return;
        }
        self.nav_cursor = self
            .nav_cursor
            .saturating_add_signed(delta)
            .min(len - 1);
    }

    fn sync_cursor(&mut self, chapter: ChapterKey) {
        if let Some(pos) = self
            .controller
            .view()
            .nav
            .iter()
            .position(|item| item.chapter == chapter)
        {
            self.nav_cursor = pos;
        }
    }

    fn open_document(&self) {
        let target = base_reference(&self.controller.view().document).to_string();
        if target.is_empty() {
            warn!("No document to open");
            return;
        }
        info!("Opening {target} in external viewer");
        if let Err(e) = open::that_detached(&target) {
            warn!("Failed to open {target}: {e}");
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let mut presenter = FramePresenter {
            frame,
            nav_cursor: self.nav_cursor,
        };
        self.controller.present(&mut presenter);
    }
}

/// Presenter drawing into one ratatui frame
pub struct FramePresenter<'f, 'a> {
    frame: &'f mut Frame<'a>,
    nav_cursor: usize,
}

impl Presenter for FramePresenter<'_, '_> {
    fn render(&mut self, view: &ViewModel) {
        let palette = view.theme.palette();
        let area = self.frame.area();
        self.frame.render_widget(
            Block::default().style(TextStyle::default().bg(palette.base_00)),
            area,
        );

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(16),
                Constraint::Min(30),
                Constraint::Percentage(30),
            ])
            .split(area);

        render_nav(self.frame, columns[0], view, self.nav_cursor, palette);
        render_artwork(self.frame, columns[1], view, palette);
        render_document(self.frame, columns[2], view, palette);
    }
}

fn render_nav(frame: &mut Frame, area: Rect, view: &ViewModel, cursor: usize, palette: &Base16Palette) {
    let (text, border, bg) = palette.get_panel_colors(true);
    let items: Vec<ListItem> = view
        .nav
        .iter()
        .map(|item| {
            let mut style = TextStyle::default().fg(text);
            if item.highlighted {
                style = style.add_modifier(Modifier::BOLD).fg(palette.base_0d);
            }
            ListItem::new(Line::from(Span::styled(item.label.clone(), style)))
        })
        .collect();

    let (selection_bg, selection_fg) = palette.get_selection_colors(true);
    let list = List::new(items)
        .block(
            Block::default()
                .title(" Chapters ")
                .borders(Borders::ALL)
                .border_style(TextStyle::default().fg(border))
                .style(TextStyle::default().bg(bg)),
        )
        .highlight_style(TextStyle::default().bg(selection_bg).fg(selection_fg))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !view.nav.is_empty() {
        state.select(Some(cursor.min(view.nav.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn control_span(key: &str, label: &str, enabled: bool, palette: &Base16Palette) -> Span<'static> {
    let style = if enabled {
        TextStyle::default().fg(palette.base_06)
    } else {
        TextStyle::default()
            .fg(palette.base_03)
            .add_modifier(Modifier::DIM)
    };
    Span::styled(format!(" [{key}] {label} "), style)
}

fn render_artwork(frame: &mut Frame, area: Rect, view: &ViewModel, palette: &Base16Palette) {
    let (text, border, bg) = palette.get_panel_colors(true);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(area);

    let mut lines = Vec::new();
    if let Some(style) = view.style {
        lines.push(Line::from(Span::styled(
            style.label(),
            TextStyle::default().fg(palette.base_0e),
        )));
    }
    match &view.artwork {
        Artwork::Hidden => {}
        Artwork::Loading { src, .. } => {
            lines.push(Line::from(Span::styled(
                format!("Loading {src}..."),
                TextStyle::default().fg(palette.base_0a),
            )));
        }
        Artwork::Shown { src, alt } => {
            lines.push(Line::from(Span::styled(
                src.clone(),
                TextStyle::default().fg(palette.base_0b),
            )));
            lines.push(Line::from(Span::styled(
                alt.clone(),
                TextStyle::default().fg(text),
            )));
        }
        Artwork::Message(message) => {
            lines.push(Line::from(Span::styled(
                message.clone(),
                TextStyle::default().fg(palette.base_08),
            )));
        }
    }
    if !view.description.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            view.description.clone(),
            TextStyle::default().fg(text),
        )));
    }
    if !view.significance.is_empty() {
        lines.push(Line::default());
        if view.significance_expanded {
            lines.push(Line::from(Span::styled(
                "▾ Significance",
                TextStyle::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                view.significance.clone(),
                TextStyle::default().fg(palette.base_05),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "▸ Significance [d]",
                TextStyle::default().fg(palette.base_04),
            )));
        }
    }

    let title = if view.title.is_empty() {
        " Gallery ".to_string()
    } else {
        format!(" {} ", view.title)
    };
    let body = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(TextStyle::default().fg(border))
            .style(TextStyle::default().bg(bg)),
    );
    frame.render_widget(body, rows[0]);

    let controls = view.controls;
    let footer = Paragraph::new(Line::from(vec![
        control_span("h", "Prev", controls.previous, palette),
        control_span("l", "Next", controls.next, palette),
        control_span("s", "Style", controls.style_toggle, palette),
        control_span("t", view.theme_icon, controls.theme_toggle, palette),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(TextStyle::default().fg(border)));
    frame.render_widget(footer, rows[1]);
}

fn render_document(frame: &mut Frame, area: Rect, view: &ViewModel, palette: &Base16Palette) {
    let (_, border, bg) = palette.get_panel_colors(false);
    let target = if view.document.is_empty() {
        "(no document)".to_string()
    } else {
        view.document.clone()
    };
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(target, TextStyle::default().fg(palette.base_0c))),
        Line::default(),
        Line::from(Span::styled(
            "[o] open externally",
            TextStyle::default().fg(palette.base_03),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(" Document ")
            .borders(Borders::ALL)
            .border_style(TextStyle::default().fg(border))
            .style(TextStyle::default().bg(bg)),
    );
    frame.render_widget(paragraph, area);
}

/// Main loop: draw when something changed, route key events, pump loads
pub fn run_app_with_event_source<B, L, S, V>(
    terminal: &mut Terminal<B>,
    app: &mut App<L, S, V>,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B: ratatui::backend::Backend,
    B::Error: Send + Sync + 'static,
    L: AssetLoader,
    S: PreferenceStore,
    V: DocumentViewer,
{
    let tick_rate = Duration::from_millis(50);
    let mut needs_redraw = true;
    loop {
        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
            needs_redraw = false;
        }

        let started = Instant::now();
        let mut events_processed = 0;
        while event_source.poll(Duration::ZERO)? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;
            match event {
                Event::Key(key) => {
                    if app.handle_key_event(key) == Some(AppAction::Quit) {
                        terminal.draw(|f| app.draw(f))?;
                        return Ok(());
                    }
                }
                Event::Resize(_, _) => {}
                _ => continue,
            }
            needs_redraw = true;
        }

        if app.controller.pump_loads() {
            needs_redraw = true;
        }

        if !needs_redraw {
            let timeout = tick_rate.saturating_sub(started.elapsed());
            event_source.poll(timeout)?;
        }
    }
}
