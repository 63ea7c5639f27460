//! Directory listings
//!
//! Produces the [`Entry`] records for the immediate children of a directory that has
//! already been resolved. Metadata is read live from the filesystem on every call.

use chrono::{DateTime, Local};
use log::debug;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Component, Path};
use std::time::SystemTime;

use crate::error::StorageError;
use crate::storage::results::Entry;

const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Lists directories below a fixed listing root (the user's root).
///
/// Entry paths are expressed relative to that root, whichever directory below it
/// is being listed.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryLister<'a> {
    listing_root: &'a Path,
}

impl<'a> DirectoryLister<'a> {
    /// `listing_root` must be canonical, like every path the resolver returns.
    pub fn new(listing_root: &'a Path) -> Self {
        Self { listing_root }
    }

    /// Lists `dir`, directories first, then by case-insensitive name.
    ///
    /// `client_path` is only used to report errors.
    pub fn list(&self, dir: &Path, client_path: &str) -> Result<Vec<Entry>, StorageError> {
        let metadata = fs::metadata(dir).map_err(|e| StorageError::from_io(e, client_path))?;
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(client_path.to_string()));
        }

        let mut children = Vec::new();
        for child in fs::read_dir(dir).map_err(|e| StorageError::from_io(e, client_path))? {
            let child = child?;
            let path = child.path();
            match fs::metadata(&path) {
                Ok(metadata) => children.push((path, metadata)),
                // Removed since read_dir, or a dangling symlink
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Skipping vanished entry {}", path.display());
                }
                Err(e) => return Err(StorageError::Filesystem(e)),
            }
        }

        children.sort_by_cached_key(|(path, metadata)| {
            (metadata.is_file(), file_name(path).to_lowercase())
        });

        children
            .iter()
            .map(|(path, metadata)| self.entry(path, metadata))
            .collect()
    }

    fn entry(&self, path: &Path, metadata: &Metadata) -> Result<Entry, StorageError> {
        let name = file_name(path);
        let is_stl = is_stl_name(&name);
        Ok(Entry {
            path: relative_display(self.listing_root, path).unwrap_or_else(|| name.clone()),
            is_dir: metadata.is_dir(),
            size: if metadata.is_file() { metadata.len() } else { 0 },
            modified: format_modified(metadata.modified()?),
            is_stl,
            name,
        })
    }
}

/// Case-insensitive `.stl` extension check. A bare `.stl` dotfile has no extension.
pub fn is_stl_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"))
}

/// Formats a modification time as local `YYYY-MM-DD HH:MM`.
pub fn format_modified(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format(MODIFIED_FORMAT)
        .to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `path` relative to `root`, joined with `/` on every platform.
fn relative_display(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}
