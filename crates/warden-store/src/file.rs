//! # Durable JSON Store
//!
//! One JSON document per collection. `load_or_default` never fails:
//! a missing file is an empty collection, and a corrupt file is treated
//! as no data (logged, not fatal). `save` writes to a uniquely-named
//! temp file in the same directory and renames it over the destination,
//! so readers never observe a partial write.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreError;

/// Load a collection from `path`, falling back to `T::default()` when the
/// file is missing, unreadable, or does not parse.
pub fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match std::fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return T::default();
        }
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to read store file; continuing with empty state",
            );
            return T::default();
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to parse store file; continuing with empty state",
            );
            T::default()
        }
    }
}

/// Persist a collection to `path` with temp-write-then-atomic-rename.
///
/// # Errors
///
/// Returns [`StoreError::Persist`] on any filesystem failure and
/// [`StoreError::Encode`] if the value does not serialize.
pub fn save<T>(path: &Path, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Persist {
            path: path.display().to_string(),
            source,
        })?;
    }

    let payload = serde_json::to_vec_pretty(value)?;

    // Unique temp name: a crashed writer's leftover never collides with a
    // later write.
    let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    std::fs::write(&temp_path, payload).map_err(|source| StoreError::Persist {
        path: temp_path.display().to_string(),
        source,
    })?;

    std::fs::rename(&temp_path, path).map_err(|source| StoreError::Persist {
        path: path.display().to_string(),
        source,
    })?;

    Ok(())
}
