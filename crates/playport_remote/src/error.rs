use std::path::PathBuf;

use playport_core::AssetId;
use thiserror::Error;

/// Raised before any request is issued.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No API token configured (set PLAYCANVAS_TOKEN or pass --token)")]
    MissingToken,
    #[error("No project ID configured")]
    MissingProjectId,
    #[error("No branch ID configured")]
    MissingBranchId,
    #[error("Invalid base URL '{0}'")]
    InvalidBaseUrl(String),
    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {code} from {url}")]
    Status { code: u16, url: String },
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Fetch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum ListingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Listing request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Malformed listing page: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Listing page has no 'result' array")]
    MissingResult,
}

/// Per-task failures. Logged and collected into the report, never fatal to the batch.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Asset {asset_id}: {source}")]
    Fetch {
        asset_id: AssetId,
        #[source]
        source: FetchError,
    },
    #[error("Asset {asset_id}: failed writing {path}: {source}")]
    Write {
        asset_id: AssetId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Asset {asset_id}: task failed: {source}")]
    Join {
        asset_id: AssetId,
        #[source]
        source: tokio::task::JoinError,
    },
}
