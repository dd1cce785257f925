use std::fs;
use std::time::Duration;

use gallerysync::assets::ThreadedLoader;
use gallerysync::catalog::Catalog;
use gallerysync::controller::GalleryController;
use gallerysync::document::{DocumentSync, InlineViewer};
use gallerysync::pages::PageMap;
use gallerysync::preferences::MemoryPreferences;
use gallerysync::test_utils::test_helpers::key;

const METADATA: &str = r#"[
  {"chapter": "2", "rank": 5, "naturalistic_path": "c2/late.png", "image_description": "Cook Ding"},
  {"chapter": 2, "rank": 1, "naturalistic_path": "c2/early.png", "abstract_path": "c2/early_abstract.png"},
  {"chapter": "7", "rank": 3, "naturalistic_path": "c7/missing.png"},
  {"rank": 9, "naturalistic_path": "orphan.png"}
]"#;

const PAGES: &str = "2: 44\n7: 92\n";

fn write_artwork(root: &std::path::Path) {
    fs::create_dir_all(root.join("c2")).unwrap();
    for name in ["early.png", "early_abstract.png", "late.png"] {
        image::RgbImage::new(8, 6).save(root.join("c2").join(name)).unwrap();
    }
}

#[test]
fn generator_metadata_and_page_table_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let metadata = dir.path().join("chapter_images_metadata.json");
    let pages = dir.path().join("pages.yaml");
    fs::write(&metadata, METADATA).unwrap();
    fs::write(&pages, PAGES).unwrap();

    let catalog = Catalog::load(&metadata).unwrap();
    assert_eq!(catalog.navigable_chapters(), vec![key(2), key(7)]);
    assert_eq!(catalog.ranks(key(2)), vec![1, 5]);
    assert_eq!(
        catalog.record(key(2), 5).unwrap().description.as_deref(),
        Some("Cook Ding")
    );

    let pages = PageMap::load(&pages).unwrap();
    assert_eq!(pages.start_page(key(7)), Some(92));
    assert!(Catalog::load(&dir.path().join("absent.json")).is_err());
}

#[test]
fn threaded_loader_drives_controller_to_shown_artwork() {
    let dir = tempfile::tempdir().unwrap();
    write_artwork(dir.path());
    let catalog = Catalog::from_json_str(METADATA).unwrap();
    let pages = PageMap::parse(PAGES).unwrap();

    let mut c = GalleryController::new(
        catalog,
        pages,
        ThreadedLoader::new(dir.path().to_path_buf(), 2),
        MemoryPreferences::new(),
        InlineViewer::new(),
        DocumentSync::new("Complete_Works_of_Zhuangzi.pdf"),
    );
    assert_eq!(c.selection().position(), Some((key(2), 1)));
    assert_eq!(
        c.view().document,
        "Complete_Works_of_Zhuangzi.pdf#page=44"
    );

    // One display load plus the preload of rank 5
    for _ in 0..2 {
        let done = c
            .loader()
            .completions()
            .recv_timeout(Duration::from_secs(10))
            .unwrap();
        c.complete_load(done);
    }
    assert!(c.view().artwork.is_shown());
    assert_eq!(c.view().artwork.src(), Some("c2/early.png"));
    assert!(c.preload_cache().is_warmed(key(2), "c2/late.png"));

    c.next();
    assert!(c.view().artwork.is_shown());
    assert!(c.pending_load().is_none());

    c.select_chapter(key(7));
    let done = c
        .loader()
        .completions()
        .recv_timeout(Duration::from_secs(10))
        .unwrap();
    c.complete_load(done);
    let message = c.view().artwork.message().unwrap();
    assert!(message.contains("c7/missing.png"), "{message}");
    assert_eq!(c.view().document, "Complete_Works_of_Zhuangzi.pdf#page=92");
}
