//! Load worker - runs in separate thread(s)

use std::path::{Path, PathBuf};

use flume::{Receiver, Sender};
use image::ImageReader;
use log::{debug, warn};

use super::request::{AssetInfo, LoadCompletion, LoadFault, LoadRequest, LoadTicket};

pub(super) fn load_worker(
    artwork_root: &Path,
    requests: Receiver<LoadRequest>,
    completions: Sender<LoadCompletion>,
) {
    for request in requests {
        match request {
            LoadRequest::Load(ticket) => {
                let result = decode(artwork_root, &ticket);
                if let Err(e) = &result {
                    warn!(
                        "Load {:?} of chapter {} rank {} ({}) failed: {e}",
                        ticket.id, ticket.chapter, ticket.rank, ticket.source
                    );
                }
                if completions.send(LoadCompletion { ticket, result }).is_err() {
                    // Receiver gone, the loader was dropped
                    break;
                }
            }
            LoadRequest::Shutdown => break,
        }
    }
}

pub(super) fn resolve(artwork_root: &Path, source: &str) -> PathBuf {
    let candidate = Path::new(source);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        artwork_root.join(candidate)
    }
}

fn decode(artwork_root: &Path, ticket: &LoadTicket) -> Result<AssetInfo, LoadFault> {
    let path = resolve(artwork_root, &ticket.source);
    let image = ImageReader::open(&path)?.with_guessed_format()?.decode()?;
    debug!(
        "Decoded {:?} ({}x{}) for {:?}",
        path,
        image.width(),
        image.height(),
        ticket.id
    );
    Ok(AssetInfo {
        path,
        width: image.width(),
        height: image.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{LoadPurpose, RequestId};
    use crate::catalog::ChapterKey;
    use crate::selection::Style;

    fn ticket(source: &str) -> LoadTicket {
        LoadTicket {
            id: RequestId::new(1),
            chapter: ChapterKey::new(1).unwrap(),
            rank: 1,
            style: Style::Naturalistic,
            source: source.to_string(),
            purpose: LoadPurpose::Display,
        }
    }

    #[test]
    fn relative_sources_resolve_under_root() {
        let root = Path::new("/srv/art");
        assert_eq!(resolve(root, "a.png"), PathBuf::from("/srv/art/a.png"));
        assert_eq!(resolve(root, "/tmp/b.png"), PathBuf::from("/tmp/b.png"));
    }

    #[test]
    fn decode_reports_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbImage::new(4, 3)
            .save(dir.path().join("tiny.png"))
            .unwrap();

        let info = decode(dir.path(), &ticket("tiny.png")).unwrap();
        assert_eq!((info.width, info.height), (4, 3));
    }

    #[test]
    fn decode_missing_file_is_io_fault() {
        let dir = tempfile::tempdir().unwrap();
        let err = decode(dir.path(), &ticket("missing.png")).unwrap_err();
        assert!(matches!(err, LoadFault::Io(_)));
    }
}
