//! Path resolution inside a user's root
//!
//! Every file operation goes through [`PathResolver`] before touching the filesystem.
//! A resolved path is always the user's root or a descendant of it once `.`, `..` and
//! symlinks are resolved; anything else is rejected with [`StorageError::Containment`].

use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf, is_separator};

use crate::error::StorageError;
use crate::storage::identity::Identity;

/// Maps identities and client paths onto locations under the storage root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    storage_root: PathBuf,
}

impl PathResolver {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Returns the canonical root directory of `identity`, creating it on first use.
    pub fn user_root(&self, identity: &Identity) -> Result<PathBuf, StorageError> {
        let root = self.storage_root.join(identity.root_dir());
        fs::create_dir_all(&root)?;
        Ok(root.canonicalize()?)
    }

    /// Resolves `relative` inside the root of `identity`.
    ///
    /// Empty input, `.` and `/` all denote the root itself. Leading separators never
    /// make the input absolute.
    pub fn resolve(&self, identity: &Identity, relative: &str) -> Result<PathBuf, StorageError> {
        let root = self.user_root(identity)?;
        resolve_within(&root, relative).inspect_err(|e| {
            if let StorageError::Containment(_) = e {
                warn!("Rejected path {:?} for {}", relative, identity);
            }
        })
    }

    /// Resolves a location that may not exist yet: `name` below the existing
    /// directory `relative_dir`.
    ///
    /// `name` must be made of plain segments; with `nested` false it must be exactly
    /// one. Any part of the result that already exists is checked for containment,
    /// so a symlink pointing outside the root cannot be written through.
    pub fn resolve_new(
        &self,
        identity: &Identity,
        relative_dir: &str,
        name: &str,
        nested: bool,
    ) -> Result<PathBuf, StorageError> {
        let root = self.user_root(identity)?;
        let client_path = client_join(relative_dir, name);

        let segments = name_segments(name, nested)?;
        let dir = resolve_within(&root, relative_dir)?;
        if !dir.is_dir() {
            return Err(StorageError::NotADirectory(relative_dir.to_string()));
        }

        let last = segments.len() - 1;
        let mut candidate = dir;
        let mut existing = true;
        for (index, segment) in segments.into_iter().enumerate() {
            candidate.push(segment);
            if !existing {
                continue;
            }
            match fs::symlink_metadata(&candidate) {
                Ok(_) => {
                    let canonical = candidate
                        .canonicalize()
                        .map_err(|e| StorageError::from_io(e, &client_path))?;
                    if !is_within(&root, &canonical) {
                        warn!("Rejected new path {:?} for {}", client_path, identity);
                        return Err(StorageError::Containment(client_path));
                    }
                    // Only the last segment may be something other than a directory
                    if index != last && !canonical.is_dir() {
                        return Err(StorageError::NotADirectory(client_path));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => existing = false,
                Err(e) if e.kind() == io::ErrorKind::NotADirectory => {
                    return Err(StorageError::NotADirectory(client_path));
                }
                Err(e) => return Err(StorageError::Filesystem(e)),
            }
        }

        debug!("Resolved new path {:?} for {}", client_path, identity);
        Ok(candidate)
    }

    /// Like [`resolve`](Self::resolve), but a symlink in the last position is not
    /// followed: its own location is returned, inside a contained parent directory.
    ///
    /// Used where the link itself is the target, such as deletion.
    pub fn resolve_no_follow(
        &self,
        identity: &Identity,
        relative: &str,
    ) -> Result<PathBuf, StorageError> {
        let trimmed = relative.trim_matches(is_separator);
        let mut components = Path::new(trimmed).components();
        if let Some(Component::Normal(name)) = components.next_back() {
            let parent = components.as_path().to_string_lossy().into_owned();
            if let Ok(dir) = self.resolve(identity, &parent) {
                let candidate = dir.join(name);
                let is_link = fs::symlink_metadata(&candidate)
                    .is_ok_and(|metadata| metadata.file_type().is_symlink());
                if is_link {
                    return Ok(candidate);
                }
            }
        }
        self.resolve(identity, relative)
    }
}

/// Resolves `relative` below the canonical directory `root`.
///
/// Used for user roots and for the static asset directory alike.
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf, StorageError> {
    let trimmed = relative.trim_matches(is_separator);
    if trimmed.is_empty() || trimmed == "." {
        return Ok(root.to_path_buf());
    }

    check_components(trimmed).map_err(|_| StorageError::Containment(relative.to_string()))?;

    let canonical = root
        .join(trimmed)
        .canonicalize()
        .map_err(|e| StorageError::from_io(e, relative))?;

    if !is_within(root, &canonical) {
        return Err(StorageError::Containment(relative.to_string()));
    }
    Ok(canonical)
}

/// Component-wise prefix test: `/users/bob` contains `/users/bob/x` and itself,
/// but not `/users/bob2`.
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

/// Lexical pre-check: no absolute components, no NUL, and no `..` climbing above
/// the starting directory.
fn check_components(relative: &str) -> Result<(), ()> {
    if relative.contains('\0') {
        return Err(());
    }

    let mut depth = 0usize;
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => depth = depth.checked_sub(1).ok_or(())?,
            Component::RootDir | Component::Prefix(_) => return Err(()),
        }
    }
    Ok(())
}

/// Splits a new file or folder name into plain segments.
fn name_segments(name: &str, nested: bool) -> Result<Vec<&str>, StorageError> {
    let invalid = || StorageError::InvalidName(name.to_string());

    if name.trim().is_empty() || name.contains('\0') {
        return Err(invalid());
    }
    if !nested && name.contains(is_separator) {
        return Err(invalid());
    }

    let segments: Vec<&str> = name.split(is_separator).filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(invalid());
    }
    for segment in &segments {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(invalid()),
        }
    }
    Ok(segments)
}

/// Client-facing form of `dir/name`, used in error messages.
pub(crate) fn client_join(relative_dir: &str, name: &str) -> String {
    let dir = relative_dir.trim_matches(is_separator);
    if dir.is_empty() || dir == "." {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
