// Export modules for use in tests and the binary
pub mod app;
pub mod assets;
pub mod catalog;
pub mod controller;
pub mod document;
pub mod error;
pub mod event_source;
pub mod pages;
pub mod panic_handler;
pub mod preferences;
pub mod preload;
pub mod selection;
pub mod settings;
pub mod theme;
pub mod view;

pub mod test_utils;

pub use catalog::{Catalog, ChapterKey, ImageRecord};
pub use controller::GalleryController;
pub use error::{CatalogError, GalleryError};
pub use selection::{SelectionState, Style};
pub use theme::Theme;
pub use view::{Artwork, Controls, UserAction, ViewModel};
