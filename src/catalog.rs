//! Chapter index: chapter key -> image records ordered by rank

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CatalogError;

/// Canonical chapter identifier.
///
/// Data files may spell the same chapter as `"3"` or `3`; both are
/// normalized here so the rest of the crate compares plain integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ChapterKey(u32);

impl ChapterKey {
    pub fn new(value: u32) -> Result<Self, CatalogError> {
        if value == 0 {
            return Err(CatalogError::InvalidChapterKey(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChapterKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: u32 = trimmed
            .parse()
            .map_err(|_| CatalogError::InvalidChapterKey(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<i64> for ChapterKey {
    type Error = CatalogError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .map_err(|_| CatalogError::InvalidChapterKey(value.to_string()))
            .and_then(Self::new)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKey {
    Number(i64),
    Text(String),
}

impl RawKey {
    fn into_key(self) -> Result<ChapterKey, CatalogError> {
        match self {
            RawKey::Number(n) => ChapterKey::try_from(n),
            RawKey::Text(s) => s.parse(),
        }
    }
}

impl<'de> Deserialize<'de> for ChapterKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawKey::deserialize(deserializer)?
            .into_key()
            .map_err(serde::de::Error::custom)
    }
}

/// One ranked artwork entry of a chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub rank: i64,
    #[serde(default, alias = "naturalistic_path")]
    pub naturalistic_src: Option<String>,
    #[serde(default, alias = "abstract_path")]
    pub abstract_src: Option<String>,
    #[serde(default, alias = "image_description")]
    pub description: Option<String>,
    #[serde(default)]
    pub significance: Option<String>,
    /// Approximate position of the scene within the chapter text (0.0..1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<f32>,
}

impl ImageRecord {
    pub fn new(rank: i64) -> Self {
        Self {
            rank,
            naturalistic_src: None,
            abstract_src: None,
            description: None,
            significance: None,
            location: None,
        }
    }

    pub fn with_naturalistic(mut self, src: impl Into<String>) -> Self {
        self.naturalistic_src = Some(src.into());
        self
    }

    pub fn with_abstract(mut self, src: impl Into<String>) -> Self {
        self.abstract_src = Some(src.into());
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn with_significance(mut self, text: impl Into<String>) -> Self {
        self.significance = Some(text.into());
        self
    }

    pub fn has_both_styles(&self) -> bool {
        present(&self.naturalistic_src).is_some() && present(&self.abstract_src).is_some()
    }
}

/// Empty strings in the data files mean "no file", same as a missing field.
pub(crate) fn present(src: &Option<String>) -> Option<&str> {
    src.as_deref().filter(|s| !s.trim().is_empty())
}

/// Entry of the flat metadata list written by the artwork generator
#[derive(Deserialize)]
struct MetadataEntry {
    #[serde(default)]
    chapter: Option<RawKey>,
    #[serde(flatten)]
    record: ImageRecord,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Keyed(BTreeMap<String, Vec<ImageRecord>>),
    Flat(Vec<MetadataEntry>),
}

/// Read-only navigation index
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    chapters: BTreeMap<ChapterKey, Vec<ImageRecord>>,
}

impl Catalog {
    pub fn from_chapter_map<I>(chapters: I) -> Self
    where
        I: IntoIterator<Item = (ChapterKey, Vec<ImageRecord>)>,
    {
        let mut catalog = Self::default();
        for (key, records) in chapters {
            let list = catalog.chapters.entry(key).or_default();
            list.extend(records);
        }
        catalog.normalize();
        catalog
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)?;
        match file {
            CatalogFile::Keyed(map) => {
                let mut chapters = Vec::with_capacity(map.len());
                for (raw, records) in map {
                    chapters.push((raw.parse::<ChapterKey>()?, records));
                }
                Ok(Self::from_chapter_map(chapters))
            }
            CatalogFile::Flat(entries) => Ok(Self::from_metadata_entries(entries)),
        }
    }

    fn from_metadata_entries(entries: Vec<MetadataEntry>) -> Self {
        let mut chapters: BTreeMap<ChapterKey, Vec<ImageRecord>> = BTreeMap::new();
        for entry in entries {
            let key = match entry.chapter.map(RawKey::into_key) {
                Some(Ok(key)) => key,
                Some(Err(e)) => {
                    warn!("Skipping image rank {}: {e}", entry.record.rank);
                    continue;
                }
                None => {
                    warn!("Skipping image rank {} without a chapter", entry.record.rank);
                    continue;
                }
            };
            chapters.entry(key).or_default().push(entry.record);
        }
        Self::from_chapter_map(chapters)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read image index {path:?}"))?;
        let catalog = Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse image index {path:?}"))?;
        debug!(
            "Loaded {} chapters ({} navigable) from {path:?}",
            catalog.chapters.len(),
            catalog.navigable_chapters().len()
        );
        Ok(catalog)
    }

    fn normalize(&mut self) {
        for (key, records) in self.chapters.iter_mut() {
            records.sort_by_key(|r| r.rank);
            let before = records.len();
            records.dedup_by_key(|r| r.rank);
            if records.len() != before {
                warn!(
                    "Chapter {key}: dropped {} record(s) with duplicate rank",
                    before - records.len()
                );
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn contains(&self, chapter: ChapterKey) -> bool {
        self.chapters.contains_key(&chapter)
    }

    /// Records of a chapter in rank order; empty for unknown chapters
    pub fn records(&self, chapter: ChapterKey) -> &[ImageRecord] {
        self.chapters
            .get(&chapter)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn record(&self, chapter: ChapterKey, rank: i64) -> Option<&ImageRecord> {
        self.records(chapter).iter().find(|r| r.rank == rank)
    }

    pub fn ranks(&self, chapter: ChapterKey) -> Vec<i64> {
        self.records(chapter).iter().map(|r| r.rank).collect()
    }

    pub fn first_rank(&self, chapter: ChapterKey) -> Option<i64> {
        self.records(chapter).iter().map(|r| r.rank).min()
    }

    /// Chapters with at least one record, ascending
    pub fn navigable_chapters(&self) -> Vec<ChapterKey> {
        self.chapters
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn first_navigable(&self) -> Option<ChapterKey> {
        self.navigable_chapters().into_iter().next()
    }

    pub fn chapters(&self) -> impl Iterator<Item = (ChapterKey, &[ImageRecord])> {
        self.chapters.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u32) -> ChapterKey {
        ChapterKey::new(n).unwrap()
    }

    #[test]
    fn chapter_key_accepts_string_and_number_forms() {
        let from_str: ChapterKey = " 4 ".parse().unwrap();
        let from_json_number: ChapterKey = serde_json::from_str("4").unwrap();
        let from_json_string: ChapterKey = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(from_str, key(4));
        assert_eq!(from_json_number, key(4));
        assert_eq!(from_json_string, key(4));
    }

    #[test]
    fn chapter_key_rejects_zero_and_garbage() {
        assert!("0".parse::<ChapterKey>().is_err());
        assert!("-2".parse::<ChapterKey>().is_err());
        assert!("two".parse::<ChapterKey>().is_err());
        assert!(ChapterKey::try_from(-1i64).is_err());
    }

    #[test]
    fn keyed_index_is_sorted_by_rank() {
        let json = r#"{
            "2": [{"rank": 5, "naturalistic_src": "b.png"}, {"rank": 2, "abstract_src": "a.png"}],
            "10": []
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.ranks(key(2)), vec![2, 5]);
        assert_eq!(catalog.first_rank(key(2)), Some(2));
        assert!(catalog.contains(key(10)));
        assert_eq!(catalog.navigable_chapters(), vec![key(2)]);
    }

    #[test]
    fn flat_metadata_list_is_grouped_by_chapter() {
        let json = r#"[
            {"chapter": 1, "rank": 2, "image_description": "Peng bird",
             "significance": "Transformation", "location": 0.1,
             "naturalistic_path": "chapter_1_image_2_naturalistic.png",
             "abstract_path": null},
            {"chapter": 1, "rank": 1, "image_description": "Kun fish",
             "naturalistic_path": "chapter_1_image_1_naturalistic.png",
             "abstract_path": "chapter_1_image_1_abstract.png"},
            {"chapter": 3, "rank": 1, "naturalistic_path": "c.png"},
            {"rank": 9, "naturalistic_path": "orphan.png"}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.navigable_chapters(), vec![key(1), key(3)]);
        assert_eq!(catalog.ranks(key(1)), vec![1, 2]);

        let first = catalog.record(key(1), 1).unwrap();
        assert_eq!(first.description.as_deref(), Some("Kun fish"));
        assert!(first.has_both_styles());

        let second = catalog.record(key(1), 2).unwrap();
        assert_eq!(second.abstract_src, None);
        assert_eq!(second.location, Some(0.1));
    }

    #[test]
    fn duplicate_ranks_keep_first_record() {
        let catalog = Catalog::from_chapter_map([(
            key(1),
            vec![
                ImageRecord::new(1).with_naturalistic("first.png"),
                ImageRecord::new(1).with_naturalistic("second.png"),
            ],
        )]);
        assert_eq!(catalog.records(key(1)).len(), 1);
        assert_eq!(
            catalog.record(key(1), 1).unwrap().naturalistic_src.as_deref(),
            Some("first.png")
        );
    }

    #[test]
    fn empty_source_strings_are_not_usable() {
        let record = ImageRecord::new(1).with_naturalistic("  ");
        assert_eq!(present(&record.naturalistic_src), None);
        assert!(!record.has_both_styles());
    }

    #[test]
    fn unknown_chapter_has_no_records() {
        let catalog = Catalog::default();
        assert!(catalog.is_empty());
        assert!(catalog.records(key(3)).is_empty());
        assert_eq!(catalog.first_rank(key(3)), None);
        assert_eq!(catalog.first_navigable(), None);
    }
}
