//! Load service - worker pool behind the `AssetLoader` seam

use std::path::PathBuf;

use flume::{Receiver, Sender};
use log::{debug, error};

use super::request::{LoadCompletion, LoadRequest, LoadTicket};
use super::worker::load_worker;

/// Starts asset loads on behalf of the controller.
///
/// Loads are fire-and-forget: the controller learns about the outcome when
/// the owner of the loader feeds a `LoadCompletion` back to it.
pub trait AssetLoader {
    fn request(&mut self, ticket: &LoadTicket);

    /// Completions ready to be handed back, for loaders that finish on
    /// their own
    fn poll_completions(&mut self) -> Vec<LoadCompletion> {
        Vec::new()
    }
}

/// Decodes artwork on background threads
pub struct ThreadedLoader {
    request_tx: Sender<LoadRequest>,
    request_rx: Receiver<LoadRequest>,
    completion_rx: Receiver<LoadCompletion>,
    num_workers: usize,
}

impl ThreadedLoader {
    #[must_use]
    pub fn new(artwork_root: PathBuf, num_workers: usize) -> Self {
        // Workers share one request queue (MPMC)
        let (request_tx, request_rx) = flume::unbounded();
        let (completion_tx, completion_rx) = flume::unbounded();

        let num_workers = num_workers.max(1);
        for _ in 0..num_workers {
            let root = artwork_root.clone();
            let rx = request_rx.clone();
            let tx = completion_tx.clone();
            std::thread::spawn(move || load_worker(&root, rx, tx));
        }

        debug!("Started {num_workers} artwork loader(s) rooted at {artwork_root:?}");

        Self {
            request_tx,
            request_rx,
            completion_rx,
            num_workers,
        }
    }

    /// Drop queued loads and stop all workers. Loads already being decoded
    /// finish in the background; their completions are discarded.
    pub fn shutdown(&self) {
        let discarded = self.request_rx.drain().count();
        if discarded > 0 {
            debug!("Discarded {discarded} queued artwork load(s)");
        }
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(LoadRequest::Shutdown);
        }
    }


    /// Completions that arrived since the last poll
    pub fn poll(&self) -> Vec<LoadCompletion> {
        self.completion_rx.try_iter().collect()
    }

    /// Receiver for callers that want to block or select on completions
    pub fn completions(&self) -> &Receiver<LoadCompletion> {
        &self.completion_rx
    }
}

impl AssetLoader for ThreadedLoader {
    fn request(&mut self, ticket: &LoadTicket) {
        if let Err(e) = self.request_tx.send(LoadRequest::Load(ticket.clone())) {
            error!("Artwork loader is gone, dropping {:?}: {e}", ticket.id);
        }
    }

    fn poll_completions(&mut self) -> Vec<LoadCompletion> {
        self.poll()
    }
}

impl Drop for ThreadedLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::assets::{LoadPurpose, RequestId};
    use crate::catalog::ChapterKey;
    use crate::selection::Style;

    fn ticket(id: u64, source: &str) -> LoadTicket {
        LoadTicket {
            id: RequestId::new(id),
            chapter: ChapterKey::new(2).unwrap(),
            rank: id as i64,
            style: Style::Abstract,
            source: source.to_string(),
            purpose: LoadPurpose::Preload,
        }
    }

    #[test]
    fn completions_carry_their_ticket() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbImage::new(2, 2)
            .save(dir.path().join("ok.png"))
            .unwrap();

        let mut loader = ThreadedLoader::new(dir.path().to_path_buf(), 2);
        loader.request(&ticket(1, "ok.png"));
        loader.request(&ticket(2, "missing.png"));

        let mut done: Vec<LoadCompletion> = (0..2)
            .map(|_| {
                loader
                    .completions()
                    .recv_timeout(Duration::from_secs(5))
                    .unwrap()
            })
            .collect();
        done.sort_by_key(|c| c.ticket.id);

        assert_eq!(done[0].ticket, ticket(1, "ok.png"));
        assert!(done[0].result.is_ok());
        assert_eq!(done[1].ticket.source, "missing.png");
        assert!(done[1].result.is_err());
        assert!(loader.poll().is_empty());
    }

    #[test]
    fn shutdown_discards_queued_loads() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbImage::new(512, 512)
            .save(dir.path().join("big.png"))
            .unwrap();

        let mut loader = ThreadedLoader::new(dir.path().to_path_buf(), 1);
        for id in 1..=200 {
            loader.request(&ticket(id, "big.png"));
        }
        loader.shutdown();

        // Only the shutdown message can still be waiting
        assert!(loader.request_tx.len() <= 1);
    }
}
