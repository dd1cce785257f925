//! Keeps the companion document viewer on the selected chapter's page

use log::{debug, warn};

use crate::catalog::ChapterKey;
use crate::error::GalleryError;
use crate::pages::PageMap;

/// Fallback when neither the viewer nor the configuration names a document
pub const DEFAULT_DOCUMENT: &str = "Complete_Works_of_Zhuangzi.pdf";

/// The external document-rendering component
pub trait DocumentViewer {
    /// Current target reference, empty before first use
    fn current_target(&self) -> &str;
    fn set_target(&mut self, target: String);
}

/// Viewer that only remembers its target; the front end reads it back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineViewer {
    target: String,
    loads: usize,
}

impl InlineViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            loads: 0,
        }
    }

    /// Number of times the target was (re)loaded
    pub fn loads(&self) -> usize {
        self.loads
    }
}

impl DocumentViewer for InlineViewer {
    fn current_target(&self) -> &str {
        &self.target
    }

    fn set_target(&mut self, target: String) {
        self.target = target;
        self.loads += 1;
    }
}

/// Strip a `#page=...` style anchor from a reference
pub fn base_reference(reference: &str) -> &str {
    reference
        .split_once('#')
        .map_or(reference, |(base, _)| base)
}

pub fn page_reference(base: &str, page: u32) -> String {
    format!("{base}#page={page}")
}

#[derive(Debug, Clone)]
pub struct DocumentSync {
    default_base: String,
}

impl DocumentSync {
    pub fn new(default_base: impl Into<String>) -> Self {
        Self {
            default_base: default_base.into(),
        }
    }

    /// Point `viewer` at the start page of `chapter`.
    ///
    /// Returns `Ok(true)` when the target changed, `Ok(false)` when it was
    /// already there, and `DocumentSyncSkipped` when the chapter has no page.
    pub fn sync<V: DocumentViewer + ?Sized>(
        &self,
        viewer: &mut V,
        pages: &PageMap,
        chapter: ChapterKey,
    ) -> Result<bool, GalleryError> {
        let Some(page) = pages.start_page(chapter) else {
            let err = GalleryError::DocumentSyncSkipped(chapter);
            warn!("{err}");
            return Err(err);
        };

        let current = viewer.current_target();
        let base = match base_reference(current).trim() {
            "" => self.default_base.as_str(),
            base => base,
        };
        let target = page_reference(base, page);

        if target == current {
            debug!("Document already at {target}");
            return Ok(false);
        }
        debug!("Document viewer -> {target}");
        viewer.set_target(target);
        Ok(true)
    }
}

impl Default for DocumentSync {
    fn default() -> Self {
        Self::new(DEFAULT_DOCUMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u32) -> ChapterKey {
        ChapterKey::new(n).unwrap()
    }

    fn pages() -> PageMap {
        [(key(1), 5), (key(2), 9)].into_iter().collect()
    }

    #[test]
    fn empty_viewer_falls_back_to_default_base() {
        let sync = DocumentSync::new("book.pdf");
        let mut viewer = InlineViewer::new();
        assert_eq!(sync.sync(&mut viewer, &pages(), key(1)), Ok(true));
        assert_eq!(viewer.current_target(), "book.pdf#page=5");
    }

    #[test]
    fn keeps_existing_base_and_replaces_anchor() {
        let sync = DocumentSync::new("book.pdf");
        let mut viewer = InlineViewer::with_target("docs/other.pdf#page=1");
        sync.sync(&mut viewer, &pages(), key(2)).unwrap();
        assert_eq!(viewer.current_target(), "docs/other.pdf#page=9");
    }

    #[test]
    fn same_target_does_not_reload() {
        let sync = DocumentSync::new("book.pdf");
        let mut viewer = InlineViewer::new();
        sync.sync(&mut viewer, &pages(), key(1)).unwrap();
        assert_eq!(sync.sync(&mut viewer, &pages(), key(1)), Ok(false));
        assert_eq!(viewer.loads(), 1);
    }

    #[test]
    fn missing_page_leaves_viewer_untouched() {
        let sync = DocumentSync::new("book.pdf");
        let mut viewer = InlineViewer::with_target("book.pdf#page=5");
        assert_eq!(
            sync.sync(&mut viewer, &pages(), key(3)),
            Err(GalleryError::DocumentSyncSkipped(key(3)))
        );
        assert_eq!(viewer.current_target(), "book.pdf#page=5");
        assert_eq!(viewer.loads(), 0);
    }

    #[test]
    fn base_reference_strips_anchor() {
        assert_eq!(base_reference("a.pdf#page=3"), "a.pdf");
        assert_eq!(base_reference("a.pdf"), "a.pdf");
        assert_eq!(base_reference(""), "");
    }
}
