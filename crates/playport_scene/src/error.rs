use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to read scene document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Scene document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Scene document has no root entity")]
    MissingRoot,
}
