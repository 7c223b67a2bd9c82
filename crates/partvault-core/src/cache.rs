//! Local object cache: the library directory tree and its marker files.
//!
//! Each directory under the library root represents one catalog entity and
//! holds exactly one marker file named after the entity kind (`component`
//! or `modification`). A marker is the pretty-printed JSON snapshot of the
//! last successfully fetched state of that entity; it serves both display
//! and as the proof that "this folder already has an identifier, fetch its
//! children". The cache never merges snapshots, it replaces them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::model::{Component, Modification};

/// Kind of entity a marker file describes.
///
/// The marker file inside an entity directory is named after the kind, so a
/// component folder contains a file literally called `component`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    /// Marker describing a catalog component.
    Component,
    /// Marker describing a component modification.
    Modification,
}

impl MarkerKind {
    /// File name the marker of this kind is stored under.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Modification => "modification",
        }
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Read and decode the marker of `kind` stored in `dir`.
///
/// # Errors
///
/// Returns [`Error::MarkerNotFound`] if no marker file of the given kind
/// exists at `dir`, and [`Error::CorruptMarker`] if the file exists but
/// cannot be parsed.
pub fn read_marker<T: DeserializeOwned>(dir: &Path, kind: MarkerKind) -> Result<T> {
    let marker_path = dir.join(kind.file_name());

    if !marker_path.is_file() {
        return Err(Error::MarkerNotFound {
            kind,
            path: dir.to_path_buf(),
        });
    }

    let content = fs::read_to_string(&marker_path)
        .map_err(|e| Error::file_system(&marker_path, format!("Failed to read marker: {e}")))?;

    let entity: T = serde_json::from_str(&content).map_err(|e| Error::CorruptMarker {
        kind,
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!("Selected {} marker from {}", kind, dir.display());
    Ok(entity)
}

/// Serialize `entity` as the marker of `kind` inside `dir`, creating the
/// directory if needed.
///
/// If a non-directory file occupies the directory path it is removed first:
/// the last fetch wins over stray files. The marker itself is written to a
/// temporary file in the same directory and renamed into place, so a crash
/// never leaves a partially written marker behind.
///
/// # Errors
///
/// Returns an error if the directory cannot be prepared or the marker
/// cannot be written.
pub fn write_marker<T: Serialize>(dir: &Path, entity: &T, kind: MarkerKind) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        warn!(
            "Replacing stray file at {} with an entity directory",
            dir.display()
        );
        fs::remove_file(dir)
            .map_err(|e| Error::file_system(dir, format!("Failed to remove stray file: {e}")))?;
    }

    fs::create_dir_all(dir)
        .map_err(|e| Error::file_system(dir, format!("Failed to create directory: {e}")))?;

    let content = serde_json::to_string_pretty(entity)?;
    let marker_path = dir.join(kind.file_name());
    let temp_path = dir.join(format!(".{}.tmp", kind.file_name()));

    fs::write(&temp_path, content)
        .map_err(|e| Error::file_system(&temp_path, format!("Failed to write marker: {e}")))?;
    fs::rename(&temp_path, &marker_path).map_err(|e| {
        Error::file_system(&marker_path, format!("Failed to move marker into place: {e}"))
    })?;

    debug!("Wrote {} marker to {}", kind, dir.display());
    Ok(())
}

/// Make a remote display name safe to use as a file or directory name.
///
/// Invalid characters are replaced with underscores, surrounding whitespace
/// and dots are trimmed, and the result is capped at 200 bytes to leave
/// room for extensions.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

    let sanitized: String = name
        .chars()
        .map(|c| if invalid_chars.contains(&c) { '_' } else { c })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');

    if trimmed.len() > 200 {
        trimmed.chars().take(200).collect()
    } else {
        trimmed.to_string()
    }
}

/// A cached entity directory together with its decoded marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry<T> {
    /// Directory representing the entity.
    pub directory: PathBuf,
    /// Decoded marker snapshot.
    pub entity: T,
}

/// Enumerate the component directories cached under the library root.
///
/// Directories without a readable `component` marker are skipped with a
/// warning; a corrupt marker in one folder must not hide the rest of the
/// library.
pub fn list_components(library_root: &Path) -> Vec<CachedEntry<Component>> {
    list_markers(library_root, MarkerKind::Component)
}

/// Enumerate the modification directories cached under a component folder.
pub fn list_modifications(component_dir: &Path) -> Vec<CachedEntry<Modification>> {
    list_markers(component_dir, MarkerKind::Modification)
}

fn list_markers<T: DeserializeOwned>(root: &Path, kind: MarkerKind) -> Vec<CachedEntry<T>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_dir())
    {
        match read_marker::<T>(entry.path(), kind) {
            Ok(entity) => entries.push(CachedEntry {
                directory: entry.path().to_path_buf(),
                entity,
            }),
            Err(Error::MarkerNotFound { .. }) => {}
            Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
        }
    }

    entries
}
