//! Load request and completion types

use std::path::PathBuf;

use crate::catalog::ChapterKey;
use crate::selection::Style;

/// Unique identifier for load requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Why a load was issued
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadPurpose {
    /// Record Display of the active record
    Display,
    /// Style toggle on the active record
    Toggle,
    /// Warming a non-active record of the chapter
    Preload,
}

/// Tag attached to every load so completions can be matched to the
/// selection they were issued for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: RequestId,
    pub chapter: ChapterKey,
    pub rank: i64,
    pub style: Style,
    pub source: String,
    pub purpose: LoadPurpose,
}

impl LoadTicket {
    /// Whether this ticket targets the given displayed artwork
    pub fn targets(&self, chapter: ChapterKey, rank: i64, style: Style) -> bool {
        self.chapter == chapter && self.rank == rank && self.style == style
    }
}

/// A decoded artwork
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Errors from load workers
#[derive(Debug, thiserror::Error)]
pub enum LoadFault {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("decode: {0}")]
    Decode(#[from] image::ImageError),

    #[error("{detail}")]
    Generic { detail: String },
}

impl LoadFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from load workers
#[derive(Debug)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub result: Result<AssetInfo, LoadFault>,
}

impl LoadCompletion {
    pub fn loaded(ticket: LoadTicket, info: AssetInfo) -> Self {
        Self {
            ticket,
            result: Ok(info),
        }
    }

    pub fn failed(ticket: LoadTicket, fault: LoadFault) -> Self {
        Self {
            ticket,
            result: Err(fault),
        }
    }
}

/// Message sent to load workers
#[derive(Debug)]
pub(super) enum LoadRequest {
    Load(LoadTicket),
    Shutdown,
}
