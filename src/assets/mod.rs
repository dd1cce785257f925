//! Asynchronous artwork loading

mod request;
mod service;
mod worker;

pub use request::{AssetInfo, LoadCompletion, LoadFault, LoadPurpose, LoadTicket, RequestId};
pub use service::{AssetLoader, ThreadedLoader};

/// Worker threads used when the configuration does not say otherwise
pub const DEFAULT_WORKERS: usize = 2;
