//! Storage operations
//!
//! Handles the file operations of the API: list, download, upload, delete and mkdir.
//! Each one resolves its paths through the [`PathResolver`] first.

use log::{error, info};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::StorageError;
use crate::storage::identity::Identity;
use crate::storage::lister::DirectoryLister;
use crate::storage::resolver::{PathResolver, client_join};
use crate::storage::results::{ActionResult, ListResult};

static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

/// Lists the contents of a directory
pub fn list_directory(
    resolver: &PathResolver,
    identity: &Identity,
    relative: &str,
) -> Result<ListResult, StorageError> {
    let root = resolver.user_root(identity)?;
    let dir = resolver.resolve(identity, relative)?;
    let items = DirectoryLister::new(&root).list(&dir, relative)?;

    info!(
        "Listed {:?} for {} - {} entries",
        relative,
        identity,
        items.len()
    );

    Ok(ListResult {
        path: relative.to_string(),
        items,
        user: None,
    })
}

/// Prepares for file retrieval, returning the file location and its name
pub fn prepare_download(
    resolver: &PathResolver,
    identity: &Identity,
    relative: &str,
) -> Result<(PathBuf, String), StorageError> {
    let file_path = resolver.resolve(identity, relative)?;
    if !file_path.is_file() {
        return Err(StorageError::NotAFile(relative.to_string()));
    }

    let name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!("Prepared download of {:?} for {}", relative, identity);
    Ok((file_path, name))
}

/// Stores an uploaded file in `relative_dir`, replacing any file of the same name.
///
/// The content goes to a temporary sibling first and is renamed into place, so a
/// failed upload never leaves a truncated file behind.
pub fn store_file(
    resolver: &PathResolver,
    identity: &Identity,
    relative_dir: &str,
    filename: &str,
    content: &[u8],
) -> Result<ActionResult, StorageError> {
    let client_path = client_join(relative_dir, filename);
    let file_path = resolver.resolve_new(identity, relative_dir, filename, false)?;
    if file_path.is_dir() {
        return Err(StorageError::NotAFile(client_path));
    }

    let temp_path = temp_path_for(&file_path);
    if let Err(e) = write_file(&temp_path, content) {
        error!("Failed to write upload {:?} for {}: {}", client_path, identity, e);
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&temp_path, &file_path) {
        error!(
            "Failed to move upload into place {} -> {}: {}",
            temp_path.display(),
            file_path.display(),
            e
        );
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    info!(
        "Stored {:?} for {} ({} bytes)",
        client_path,
        identity,
        content.len()
    );

    Ok(ActionResult::new(format!("Uploaded {filename}")).with_size(content.len() as u64))
}

/// Deletes a file, or a directory with everything below it.
///
/// A symlink is removed itself; what it points to is left alone.
pub fn delete_path(
    resolver: &PathResolver,
    identity: &Identity,
    relative: &str,
) -> Result<ActionResult, StorageError> {
    let root = resolver.user_root(identity)?;
    let target = resolver.resolve_no_follow(identity, relative)?;
    if target == root {
        return Err(StorageError::RootNotRemovable);
    }

    let metadata =
        fs::symlink_metadata(&target).map_err(|e| StorageError::from_io(e, relative))?;
    let removed = if metadata.is_dir() {
        fs::remove_dir_all(&target)
    } else {
        fs::remove_file(&target)
    };
    removed.map_err(|e| {
        error!("Failed to delete {} for {}: {}", target.display(), identity, e);
        StorageError::from_io(e, relative)
    })?;

    info!("Deleted {:?} for {}", relative, identity);
    Ok(ActionResult::new(format!("Deleted {relative}")))
}

/// Creates a directory (and any missing parents) named `name` below `relative`
pub fn make_directory(
    resolver: &PathResolver,
    identity: &Identity,
    relative: &str,
    name: &str,
) -> Result<ActionResult, StorageError> {
    let client_path = client_join(relative, name);
    let dir_path = resolver.resolve_new(identity, relative, name, true)?;
    if dir_path.exists() && !dir_path.is_dir() {
        return Err(StorageError::NotADirectory(client_path));
    }

    fs::create_dir_all(&dir_path).map_err(|e| StorageError::from_io(e, &client_path))?;

    info!("Created folder {:?} for {}", client_path, identity);
    Ok(ActionResult::new(format!("Created folder {name}")))
}

fn write_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.flush()
}

/// Hidden sibling `.upload.<pid>-<seq>.part`, unique per upload in this process.
/// The name has a fixed shape so it stays short whatever the target's name length.
fn temp_path_for(file_path: &Path) -> PathBuf {
    let seq = UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed);
    file_path.with_file_name(format!(".upload.{}-{seq}.part", std::process::id()))
}
