//! Host-application seam for opening downloaded part files.
//!
//! The core never imports geometry itself; the host CAD application
//! implements [`HostApplication`] and the core only decides which callback
//! a leaf file is dispatched to, based on its extension.

use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};

/// Callbacks the host CAD application provides.
pub trait HostApplication {
    /// Import a CAD interchange file (STEP, IGES, ...) into the active
    /// document.
    fn import_geometry(&self, path: &Path) -> Result<()>;

    /// Merge a native document file into the active document.
    fn merge_document(&self, path: &Path) -> Result<()>;
}

/// How a leaf file should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenDisposition {
    /// Dispatch through [`HostApplication::import_geometry`].
    Geometry,
    /// Dispatch through [`HostApplication::merge_document`].
    Native,
}

/// Extension sets driving the open dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProfile {
    /// Extensions opened as interchange geometry.
    pub geometry_extensions: Vec<String>,
    /// Extensions opened as native documents.
    pub native_extensions: Vec<String>,
}

impl Default for HostProfile {
    fn default() -> Self {
        Self {
            geometry_extensions: ["step", "stp", "iges", "igs", "brep", "stl"]
                .map(String::from)
                .to_vec(),
            native_extensions: vec!["fcstd".to_string()],
        }
    }
}

impl HostProfile {
    /// Classify a file by its extension.
    ///
    /// Returns `None` when the extension matches neither set.
    #[must_use]
    pub fn classify(&self, path: &Path) -> Option<OpenDisposition> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        if self.geometry_extensions.iter().any(|e| *e == extension) {
            Some(OpenDisposition::Geometry)
        } else if self.native_extensions.iter().any(|e| *e == extension) {
            Some(OpenDisposition::Native)
        } else {
            None
        }
    }
}

/// Open a downloaded part file through the host application.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFile`] when the extension matches neither
/// of the profile's sets, and propagates host callback failures.
pub fn open_part_file<H: HostApplication>(
    host: &H,
    profile: &HostProfile,
    path: &Path,
) -> Result<()> {
    match profile.classify(path) {
        Some(OpenDisposition::Geometry) => {
            info!("Importing geometry from {}", path.display());
            host.import_geometry(path)
        }
        Some(OpenDisposition::Native) => {
            info!("Merging document from {}", path.display());
            host.merge_document(path)
        }
        None => Err(Error::UnsupportedFile {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingHost {
        imported: RefCell<Vec<PathBuf>>,
        merged: RefCell<Vec<PathBuf>>,
    }

    impl HostApplication for RecordingHost {
        fn import_geometry(&self, path: &Path) -> Result<()> {
            self.imported.borrow_mut().push(path.to_path_buf());
            Ok(())
        }

        fn merge_document(&self, path: &Path) -> Result<()> {
            self.merged.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn test_classify_by_extension() {
        let profile = HostProfile::default();
        assert_eq!(
            profile.classify(Path::new("bracket.STEP")),
            Some(OpenDisposition::Geometry)
        );
        assert_eq!(
            profile.classify(Path::new("bracket.FCStd")),
            Some(OpenDisposition::Native)
        );
        assert_eq!(profile.classify(Path::new("readme.txt")), None);
        assert_eq!(profile.classify(Path::new("no-extension")), None);
    }

    #[test]
    fn test_open_dispatches_geometry() {
        let host = RecordingHost::default();
        open_part_file(&host, &HostProfile::default(), Path::new("bracket.step"))
            .expect("open geometry");
        assert_eq!(host.imported.borrow().len(), 1);
        assert!(host.merged.borrow().is_empty());
    }

    #[test]
    fn test_open_dispatches_native() {
        let host = RecordingHost::default();
        open_part_file(&host, &HostProfile::default(), Path::new("bracket.fcstd"))
            .expect("open native");
        assert!(host.imported.borrow().is_empty());
        assert_eq!(host.merged.borrow().len(), 1);
    }

    #[test]
    fn test_open_unknown_extension_is_rejected() {
        let host = RecordingHost::default();
        let result = open_part_file(&host, &HostProfile::default(), Path::new("notes.txt"));
        assert!(matches!(result, Err(Error::UnsupportedFile { .. })));
    }
}
