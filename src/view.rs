//! View model handed to the presentation layer, and the actions it sends back

use crate::catalog::ChapterKey;
use crate::selection::Style;
use crate::theme::Theme;

pub const NO_DESCRIPTION: &str = "No description available.";
pub const NO_SIGNIFICANCE: &str = "No significance recorded.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub chapter: ChapterKey,
    pub label: String,
    /// Rendered bold while this chapter is the active selection
    pub highlighted: bool,
}

/// State of the artwork area
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Artwork {
    #[default]
    Hidden,
    Loading { src: String, alt: String },
    Shown { src: String, alt: String },
    /// Image cleared and replaced by a message
    Message(String),
}

impl Artwork {
    pub fn src(&self) -> Option<&str> {
        match self {
            Artwork::Loading { src, .. } | Artwork::Shown { src, .. } => Some(src),
            _ => None,
        }
    }

    pub fn alt(&self) -> Option<&str> {
        match self {
            Artwork::Loading { alt, .. } | Artwork::Shown { alt, .. } => Some(alt),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Artwork::Message(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Artwork::Loading { .. })
    }

    pub fn is_shown(&self) -> bool {
        matches!(self, Artwork::Shown { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub previous: bool,
    pub next: bool,
    pub style_toggle: bool,
    pub theme_toggle: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewModel {
    pub nav: Vec<NavItem>,
    pub title: String,
    pub description: String,
    pub significance: String,
    pub significance_expanded: bool,
    pub artwork: Artwork,
    pub style: Option<Style>,
    pub controls: Controls,
    pub theme: Theme,
    pub theme_icon: &'static str,
    /// Target reference of the document viewer
    pub document: String,
    /// Set once the gallery cannot work at all
    pub fatal: Option<String>,
}

impl ViewModel {
    pub fn highlighted_chapter(&self) -> Option<ChapterKey> {
        self.nav.iter().find(|item| item.highlighted).map(|item| item.chapter)
    }
}

/// Something the user did in the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    SelectChapter(ChapterKey),
    Previous,
    Next,
    ToggleStyle,
    ToggleTheme,
    ToggleSignificance,
}

/// Implemented by whatever draws the gallery
pub trait Presenter {
    fn render(&mut self, view: &ViewModel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artwork_accessors() {
        let shown = Artwork::Shown {
            src: "a.png".into(),
            alt: "Naturalistic interpretation of a".into(),
        };
        assert_eq!(shown.src(), Some("a.png"));
        assert!(shown.is_shown());
        assert_eq!(Artwork::Message("x".into()).src(), None);
        assert_eq!(Artwork::Message("x".into()).message(), Some("x"));
        assert_eq!(Artwork::Hidden.alt(), None);
    }
}
