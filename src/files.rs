//! Downloaded model artifacts on disk.
//!
//! Independent of the cache tiers: artifacts live as `<dir>/<id>.<ext>`.
//! [`describe`] is a plain filesystem stat that looks for `<id>.json` and
//! then `<id>.xml`; [`store`] writes a downloaded artifact atomically.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::types::{FileDescriptor, FileType};
use crate::{CacheError, Result};

const LOOKUP_ORDER: [FileType; 2] = [FileType::Json, FileType::Xml];

/// Describe the artifact file stored for `id` under `dir`.
///
/// Returns `NotFound` when neither candidate file exists.
pub async fn describe(dir: impl AsRef<Path>, id: &str) -> Result<FileDescriptor> {
    let dir = dir.as_ref();
    check_id(id)?;

    for file_type in LOOKUP_ORDER {
        let path = dir.join(format!("{id}.{}", file_type.extension()));
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };

        return descriptor(id, path, file_type, &metadata);
    }

    Err(CacheError::NotFound(format!("no artifact file for {id}")))
}

/// Write `bytes` as the `file_type` artifact of `id` under `dir`.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// reader never sees a partial artifact. Creates `dir` if needed.
pub async fn store(
    dir: impl AsRef<Path>,
    id: &str,
    file_type: FileType,
    bytes: &[u8],
) -> Result<FileDescriptor> {
    let dir = dir.as_ref();
    check_id(id)?;
    tokio::fs::create_dir_all(dir).await?;

    let path = dir.join(format!("{id}.{}", file_type.extension()));
    let tmp = dir.join(format!(".{id}.{}.tmp", file_type.extension()));
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, &path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    let metadata = tokio::fs::metadata(&path).await?;
    descriptor(id, path, file_type, &metadata)
}

fn check_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
        return Err(CacheError::InvalidQuery(format!(
            "'{id}' is not a valid model identifier"
        )));
    }
    Ok(())
}

fn descriptor(
    id: &str,
    path: PathBuf,
    file_type: FileType,
    metadata: &Metadata,
) -> Result<FileDescriptor> {
    Ok(FileDescriptor {
        model_id: id.to_string(),
        path,
        file_type,
        size: metadata.len(),
        modified: DateTime::<Utc>::from(metadata.modified()?),
    })
}
