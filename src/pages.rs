//! Chapter -> start page of the companion document

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::ChapterKey;
use crate::error::CatalogError;

/// Pages of front matter before page 1 of the printed text
pub const FRONT_MATTER_PAGES: u32 = 37;

/// Printed start page of the seven inner chapters
const INNER_CHAPTER_PAGES: [(u32, u32); 7] = [
    (1, 1),  // Free and Easy Wandering
    (2, 7),  // Discussion on Making All Things Equal
    (3, 19), // The Secret of Caring for Life
    (4, 22), // In the World of Men
    (5, 34), // The Sign of Virtue Complete
    (6, 42), // The Great and Venerable Teacher
    (7, 55), // Fit for Emperors and Kings
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageMap {
    pages: BTreeMap<ChapterKey, u32>,
}

impl PageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start pages of the bundled companion PDF, in PDF page numbers
    pub fn companion_default() -> Self {
        INNER_CHAPTER_PAGES
            .iter()
            .filter_map(|&(chapter, page)| {
                ChapterKey::new(chapter)
                    .ok()
                    .map(|key| (key, page + FRONT_MATTER_PAGES))
            })
            .collect()
    }

    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') {
            Ok(serde_json::from_str(content)?)
        } else {
            Ok(serde_yaml::from_str(content)?)
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read page map {path:?}"))?;
        let map =
            Self::parse(&content).with_context(|| format!("Failed to parse page map {path:?}"))?;
        debug!("Loaded {} chapter start pages from {path:?}", map.len());
        Ok(map)
    }

    pub fn insert(&mut self, chapter: ChapterKey, page: u32) {
        self.pages.insert(chapter, page);
    }

    pub fn start_page(&self, chapter: ChapterKey) -> Option<u32> {
        self.pages.get(&chapter).copied()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromIterator<(ChapterKey, u32)> for PageMap {
    fn from_iter<T: IntoIterator<Item = (ChapterKey, u32)>>(iter: T) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u32) -> ChapterKey {
        ChapterKey::new(n).unwrap()
    }

    #[test]
    fn companion_default_applies_front_matter_offset() {
        let pages = PageMap::companion_default();
        assert_eq!(pages.len(), 7);
        assert_eq!(pages.start_page(key(1)), Some(38));
        assert_eq!(pages.start_page(key(7)), Some(92));
        assert_eq!(pages.start_page(key(8)), None);
    }

    #[test]
    fn parses_json_with_string_keys() {
        let pages = PageMap::parse(r#"{"1": 5, "3": 40}"#).unwrap();
        assert_eq!(pages.start_page(key(1)), Some(5));
        assert_eq!(pages.start_page(key(3)), Some(40));
    }

    #[test]
    fn parses_yaml_with_integer_keys() {
        let pages = PageMap::parse("1: 12\n2: 30\n").unwrap();
        assert_eq!(pages.start_page(key(2)), Some(30));
    }

    #[test]
    fn rejects_invalid_keys() {
        assert!(PageMap::parse(r#"{"zero": 5}"#).is_err());
    }
}
