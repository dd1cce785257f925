use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::ChapterKey;

/// Rendering style of an artwork
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    Naturalistic,
    Abstract,
}

impl Style {
    pub fn toggled(self) -> Self {
        match self {
            Style::Naturalistic => Style::Abstract,
            Style::Abstract => Style::Naturalistic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Style::Naturalistic => "naturalistic",
            Style::Abstract => "abstract",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Style::Naturalistic => "Naturalistic",
            Style::Abstract => "Abstract",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user is currently looking at.
///
/// `rank` is `None` while an empty chapter is selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub chapter: Option<ChapterKey>,
    pub rank: Option<i64>,
    pub style: Style,
}

impl SelectionState {
    pub fn position(&self) -> Option<(ChapterKey, i64)> {
        Some((self.chapter?, self.rank?))
    }
}
