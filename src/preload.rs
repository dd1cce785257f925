//! Per-chapter cache of warmed artwork
//!
//! An entry is created the first time a chapter is preloaded and lives as
//! long as the cache. Creation happens synchronously with the request, so
//! asking twice for the same chapter never schedules the loads twice.

use std::collections::HashMap;

use log::debug;

use crate::assets::{LoadCompletion, RequestId};
use crate::catalog::ChapterKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleState {
    Pending,
    Ready,
    Failed,
}

/// Opaque reference to an in-flight or finished preload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetHandle {
    pub request: RequestId,
    pub source: String,
    pub state: HandleState,
}

impl AssetHandle {
    pub fn pending(request: RequestId, source: impl Into<String>) -> Self {
        Self {
            request,
            source: source.into(),
            state: HandleState::Pending,
        }
    }

    /// Exact match, or the cached path ends with `source` on a path
    /// component boundary (the cache may hold resolved paths while records
    /// carry relative ones)
    pub fn matches(&self, source: &str) -> bool {
        if source.is_empty() {
            return false;
        }
        match self.source.strip_suffix(source) {
            Some("") => true,
            Some(prefix) => prefix.chars().next_back().is_some_and(std::path::is_separator),
            None => false,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct PreloadEntry {
    serial: u64,
    handles: Vec<AssetHandle>,
}

impl PreloadEntry {
    /// Creation order of this entry; stable for the lifetime of the cache
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn handles(&self) -> &[AssetHandle] {
        &self.handles
    }

    pub fn push(&mut self, handle: AssetHandle) {
        self.handles.push(handle);
    }
}

#[derive(Debug, Default)]
pub struct PreloadCache {
    entries: HashMap<ChapterKey, PreloadEntry>,
    next_serial: u64,
    by_request: HashMap<RequestId, ChapterKey>,
}

impl PreloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the entry for `chapter` unless it already exists.
    ///
    /// Returns the fresh entry for the caller to fill, or `None` when the
    /// chapter was preloaded before.
    pub fn begin(&mut self, chapter: ChapterKey) -> Option<&mut PreloadEntry> {
        if self.entries.contains_key(&chapter) {
            debug!("Chapter {chapter} already preloaded");
            return None;
        }
        self.next_serial += 1;
        let entry = self.entries.entry(chapter).or_insert(PreloadEntry {
            serial: self.next_serial,
            handles: Vec::new(),
        });
        Some(entry)
    }

    pub fn register(&mut self, chapter: ChapterKey, handle: AssetHandle) {
        if let Some(entry) = self.entries.get_mut(&chapter) {
            self.by_request.insert(handle.request, chapter);
            entry.push(handle);
        }
    }

    pub fn entry(&self, chapter: ChapterKey) -> Option<&PreloadEntry> {
        self.entries.get(&chapter)
    }

    pub fn contains(&self, chapter: ChapterKey) -> bool {
        self.entries.contains_key(&chapter)
    }

    /// Whether `source` finished loading as part of the chapter's preload
    pub fn is_warmed(&self, chapter: ChapterKey, source: &str) -> bool {
        self.entries.get(&chapter).is_some_and(|entry| {
            entry
                .handles
                .iter()
                .any(|h| h.state == HandleState::Ready && h.matches(source))
        })
    }

    /// Record the outcome of a preload. Returns false for unknown requests.
    pub fn mark(&mut self, completion: &LoadCompletion) -> bool {
        let id = completion.ticket.id;
        let Some(chapter) = self.by_request.remove(&id) else {
            return false;
        };
        let Some(handle) = self
            .entries
            .get_mut(&chapter)
            .and_then(|entry| entry.handles.iter_mut().find(|h| h.request == id))
        else {
            return false;
        };
        handle.state = if completion.result.is_ok() {
            HandleState::Ready
        } else {
            HandleState::Failed
        };
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
