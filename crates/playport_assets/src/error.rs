use std::path::PathBuf;

use thiserror::Error;

/// Failures persisting one of the JSON stores (cache, id mapping, folder mapping).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error serializing store: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-asset extraction failures. The caller skips the asset and keeps going.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Container file not found: {0}")]
    MissingFile(PathBuf),
    #[error("Unsupported format '{format}' in {path}")]
    UnsupportedFormat { path: PathBuf, format: &'static str },
    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("No meshes found in {0}")]
    NoMeshes(PathBuf),
    #[error("Mesh index {index} out of range: {path} has {count} meshes")]
    OutOfRange {
        index: usize,
        count: usize,
        path: PathBuf,
    },
    #[error("Mesh at index {index} in {path} has no geometry")]
    EmptyMesh { index: usize, path: PathBuf },
}
