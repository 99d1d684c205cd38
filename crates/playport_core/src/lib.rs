pub use tokio;

pub mod asset;
pub mod cancel;

pub use asset::{AssetId, AssetKind, FolderId, RemoteAsset};
pub use cancel::CancelFlag;

/// Dedicated multi-threaded runtime for network I/O.
/// Graph traversal, classification and extraction stay on the calling thread;
/// only transfers are spawned here.
pub fn build_io_runtime(worker_threads: usize) -> std::io::Result<tokio::runtime::Runtime> {
    log::debug!("Starting I/O runtime with {} worker threads", worker_threads.max(1));

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads.max(1))
        .enable_all()
        .thread_name("playport-io")
        .build()
}
