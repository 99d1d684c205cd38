//! Small helpers shared by the JSON-backed stores.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::error::StoreError;

/// Reads a JSON store. A missing or unreadable file yields `T::default()`.
pub fn load_json_or_default<T>(path: &Path, label: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No {} at {:?}, starting empty", label, path);
            return T::default();
        }
        Err(e) => {
            log::warn!("Could not read {} at {:?} ({}), starting empty", label, path, e);
            return T::default();
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("{} at {:?} is corrupt ({}), starting empty", label, path, e);
            T::default()
        }
    }
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes to a unique sibling file, then renames it over `path`,
/// so readers never observe a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp = part_path(path);
    fs::write(&temp, bytes)?;
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}.part", file_name, uuid::Uuid::new_v4().simple()))
}
