//! Initial document population from a directory.
//!
//! Every regular file in the directory becomes one unlocked document: the
//! file name is the key, the file stem is the title, the UTF-8 text is the
//! contents. Subdirectories are skipped.

use std::{io, path::Path};

use penlock_core::{Environment, UnlockedDocument};

use crate::{error::ServerError, service::DocumentService};

/// Read seed documents from `dir`, sorted by key.
///
/// # Errors
///
/// Returns `ServerError::Seed` if the directory cannot be read, a file name
/// is not valid UTF-8, or a file is not valid UTF-8 text.
pub async fn load_seed_dir(dir: &Path) -> Result<Vec<UnlockedDocument>, ServerError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| seed_error("read", dir, &e))?;

    let mut docs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| seed_error("list", dir, &e))? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| seed_error("stat", &path, &e))?;
        if !file_type.is_file() {
            tracing::debug!("skipping non-file seed entry {}", path.display());
            continue;
        }

        let key = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ServerError::Seed(format!("non UTF-8 file name: {}", path.display())))?
            .to_string();
        let title = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or(&key).to_string();
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| seed_error("read", &path, &e))?;

        docs.push(UnlockedDocument { key, title, contents });
    }

    docs.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(docs)
}

fn seed_error(action: &str, path: &Path, err: &io::Error) -> ServerError {
    ServerError::Seed(format!("cannot {} {}: {}", action, path.display(), err))
}

/// Insert seed documents into the service.
///
/// # Errors
///
/// Returns `ServerError::Store` on a duplicate key.
pub async fn seed_service<E>(
    service: &DocumentService<E>,
    docs: Vec<UnlockedDocument>,
) -> Result<usize, ServerError>
where
    E: Environment,
{
    let count = docs.len();
    for doc in docs {
        tracing::debug!("seeding document {}", doc.key);
        service.insert_document(doc).await?;
    }
    Ok(count)
}
