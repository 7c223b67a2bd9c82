//! Sync orchestrator: drives the four-level catalog traversal.
//!
//! Each user action maps to one strictly sequential fetch → parse →
//! reconcile step: "update library" pulls the favorites list, opening a
//! component folder pulls its modifications, and opening a modification
//! folder resolves the matching fileset and hands its files to the
//! downloader. Opening a folder always refetches — there is no dirty
//! check, so a double-click re-syncs rather than re-displaying cached
//! children.
//!
//! Errors abandon the current step; markers already written stay written.
//! Nothing is retried automatically.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{self, MarkerKind};
use crate::catalog::{CatalogClient, CatalogQuery, decode_list, parse_response};
use crate::download::{DownloadReport, DownloadRequest, Downloader, FileFetcher};
use crate::error::Result;
use crate::model::{Component, Fileset, FilesetFile, Modification};

/// Outcome of a favorites sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavoritesOutcome {
    /// Components were fetched and their folders reconciled.
    Updated(Vec<SyncedComponent>),
    /// The remote reported no favorited components.
    NoFavorites,
}

/// A component reconciled into the library tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedComponent {
    /// The fetched snapshot.
    pub component: Component,
    /// Directory the marker was written to.
    pub directory: PathBuf,
}

/// Outcome of expanding a component folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModificationsOutcome {
    /// Modifications were fetched and their folders reconciled.
    Updated(Vec<SyncedModification>),
    /// The component has no modifications.
    NoModifications,
}

/// A modification reconciled under its component folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedModification {
    /// The fetched snapshot, with the parent component filled in.
    pub modification: Modification,
    /// Directory the marker was written to.
    pub directory: PathBuf,
}

/// Outcome of expanding a modification folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilesOutcome {
    /// The matching fileset's files were handed to the downloader.
    Downloaded(DownloadReport),
    /// No fileset matches the configured target program. Terminal; there
    /// is no fallback format.
    FilesetNotFound,
    /// The matching fileset contains no files.
    EmptyFileset,
}

/// Drives sync steps against a catalog client and reconciles results into
/// the library tree.
pub struct SyncOrchestrator<C, F> {
    client: C,
    downloader: Downloader<F>,
    library_root: PathBuf,
    program_id: u32,
}

impl<C, F> SyncOrchestrator<C, F>
where
    C: CatalogClient,
    F: FileFetcher + Sync,
{
    /// Create an orchestrator rooted at `library_root`, filtering filesets
    /// for `program_id`.
    pub fn new(
        client: C,
        downloader: Downloader<F>,
        library_root: impl Into<PathBuf>,
        program_id: u32,
    ) -> Self {
        Self {
            client,
            downloader,
            library_root: library_root.into(),
            program_id,
        }
    }

    /// Library root this orchestrator reconciles into.
    #[must_use]
    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// Catalog client this orchestrator issues queries through.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Pull the favorites list and reconcile one folder per component.
    ///
    /// Folders are named `"{name} (from {owner})"`; each receives a
    /// `component` marker holding the fetched snapshot. Components that
    /// were unfavorited remotely keep their stale local folders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request, the response decode, or a marker
    /// write fails. Markers written before the failure stay written.
    pub fn update_components_list(&self) -> Result<FavoritesOutcome> {
        info!("Updating component library from favorites");

        let raw = self.client.execute(&CatalogQuery::FavoriteComponents)?;
        let data = parse_response(&raw)?;
        let components: Vec<Component> = decode_list(data, "favoriteComponents")?;

        if components.is_empty() {
            info!("No favorite components on the catalog");
            return Ok(FavoritesOutcome::NoFavorites);
        }

        let mut synced = Vec::with_capacity(components.len());
        for component in components {
            let folder = cache::sanitize_file_name(&component.folder_name());
            let directory = self.library_root.join(folder);
            cache::write_marker(&directory, &component, MarkerKind::Component)?;
            debug!("Reconciled component {} into {}", component.uuid, directory.display());
            synced.push(SyncedComponent {
                component,
                directory,
            });
        }

        info!("Updated {} favorite components", synced.len());
        Ok(FavoritesOutcome::Updated(synced))
    }

    /// Expand a component folder: fetch its modifications and reconcile
    /// one subfolder per modification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MarkerNotFound`](crate::Error::MarkerNotFound) or
    /// [`Error::CorruptMarker`](crate::Error::CorruptMarker) when the
    /// folder does not hold a readable component marker, and propagates
    /// request/decode/write failures.
    pub fn update_component(&self, component_dir: &Path) -> Result<ModificationsOutcome> {
        let component: Component = cache::read_marker(component_dir, MarkerKind::Component)?;
        info!("Updating modifications of component {}", component.uuid);

        let raw = self.client.execute(&CatalogQuery::ComponentModifications {
            component_uuid: component.uuid.clone(),
        })?;
        let data = parse_response(&raw)?;
        let modifications: Vec<Modification> = decode_list(data, "componentModifications")?;

        if modifications.is_empty() {
            info!("No modifications for the component");
            return Ok(ModificationsOutcome::NoModifications);
        }

        let mut synced = Vec::with_capacity(modifications.len());
        for mut modification in modifications {
            modification.component_uuid.clone_from(&component.uuid);
            let folder = cache::sanitize_file_name(&modification.modification_name);
            let directory = component_dir.join(folder);
            cache::write_marker(&directory, &modification, MarkerKind::Modification)?;
            synced.push(SyncedModification {
                modification,
                directory,
            });
        }

        info!(
            "Updated {} modifications of component {}",
            synced.len(),
            component.uuid
        );
        Ok(ModificationsOutcome::Updated(synced))
    }

    /// Expand a modification folder: resolve the fileset for the target
    /// program and download its files next to the marker.
    ///
    /// Only the first fileset in server order is used; additional matches
    /// are logged and ignored. Per-file download failures are recorded in
    /// the report and do not abort the batch.
    ///
    /// # Errors
    ///
    /// Returns marker errors when the folder does not hold a readable
    /// modification marker, and propagates request/decode failures.
    pub fn update_modification(&self, modification_dir: &Path) -> Result<FilesOutcome> {
        let modification: Modification =
            cache::read_marker(modification_dir, MarkerKind::Modification)?;
        info!("Updating files of modification {}", modification.uuid);

        let raw = self.client.execute(&CatalogQuery::Filesets {
            modification_uuid: modification.uuid.clone(),
            program_id: self.program_id,
        })?;
        let data = parse_response(&raw)?;
        let filesets: Vec<Fileset> = decode_list(data, "filesets")?;

        let Some(fileset) = filesets.first() else {
            warn!(
                "Fileset not found for the current application (program id {})",
                self.program_id
            );
            return Ok(FilesOutcome::FilesetNotFound);
        };
        if filesets.len() > 1 {
            debug!(
                "{} filesets match program id {}, using the first ({})",
                filesets.len(),
                self.program_id,
                fileset.uuid
            );
        }

        let raw = self.client.execute(&CatalogQuery::FilesetFiles {
            fileset_uuid: fileset.uuid.clone(),
        })?;
        let data = parse_response(&raw)?;
        let files: Vec<FilesetFile> = decode_list(data, "filesetFiles")?;

        if files.is_empty() {
            warn!("No files in fileset {}", fileset.uuid);
            return Ok(FilesOutcome::EmptyFileset);
        }

        let requests = files
            .into_iter()
            .map(|file| {
                DownloadRequest::new(
                    file.download_url,
                    modification_dir.join(cache::sanitize_file_name(&file.filename)),
                )
            })
            .collect();

        let report = self.downloader.fetch_all(requests);
        if !report.is_complete() {
            warn!(
                "{} of {} files failed to download for modification {}",
                report.failed.len(),
                report.requested(),
                modification.uuid
            );
        }

        Ok(FilesOutcome::Downloaded(report))
    }
}
