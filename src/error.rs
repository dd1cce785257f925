use crate::catalog::ChapterKey;
use crate::selection::Style;

/// Failures while reading the chapter index or page map
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid chapter key {0:?}")]
    InvalidChapterKey(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Everything that can go wrong while driving the gallery.
///
/// Only `MissingData` is fatal. The rest are scoped to the current display
/// and go away once the user navigates elsewhere; their `Display` text is
/// what ends up in the artwork area.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GalleryError {
    #[error("Image data is missing or empty. The gallery cannot be shown.")]
    MissingData,

    #[error("No images for chapter {0}.")]
    EmptyChapter(ChapterKey),

    #[error("Chapter {chapter}, rank {rank}: no {wanted} image, showing {fallback} instead")]
    MissingSource {
        chapter: ChapterKey,
        rank: i64,
        wanted: Style,
        fallback: Style,
    },

    #[error("No image file available for chapter {chapter}, rank {rank}.")]
    NoUsableSource { chapter: ChapterKey, rank: i64 },

    #[error("Failed to load {style} image for chapter {chapter}, rank {rank} ({path}): {reason}")]
    AssetLoadFailure {
        chapter: ChapterKey,
        rank: i64,
        style: Style,
        path: String,
        reason: String,
    },

    #[error("No start page for chapter {0}; document viewer left unchanged")]
    DocumentSyncSkipped(ChapterKey),
}
