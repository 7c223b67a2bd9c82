//! `PartVault` Core Library
//!
//! This crate provides the core functionality for the `PartVault` library
//! browser:
//! - Remote catalog client for the parts-catalog query API
//! - Local object cache mapping catalog entities onto a directory tree
//! - Sync orchestration over the component → modification → fileset →
//!   file hierarchy
//! - Parallel downloading of fileset files with bounded concurrency
//! - Library configuration and catalog login
//!
//! The graphical shell and the host CAD application sit outside this
//! crate: the shell triggers sync steps and renders the resulting tree,
//! and the host implements the [`host::HostApplication`] callbacks used
//! to open downloaded part files.
//!
//! # Error Handling
//!
//! Failures are modeled as explicit result values so callers can branch
//! on kind. See the [`error`] module for the full list.
//!
//! ```rust,ignore
//! use partvault_core::{Error, Result};
//!
//! fn refresh(sync: &impl Refresh) -> Result<()> {
//!     // Your code here
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod download;
pub mod error;
pub mod host;
pub mod model;
pub mod sync;

pub use auth::{Credentials, DEFAULT_LOGIN_TIMEOUT_SECS, login};
pub use cache::{
    CachedEntry, MarkerKind, list_components, list_modifications, read_marker,
    sanitize_file_name, write_marker,
};
pub use catalog::{
    CatalogClient, CatalogQuery, DEFAULT_REQUEST_TIMEOUT_SECS, HttpCatalogClient, decode_list,
    parse_response,
};
pub use config::{
    DEFAULT_API_ENDPOINT, DEFAULT_LOGIN_ENDPOINT, DownloadSettings, LibraryConfig,
    default_library_root, validate_storage_directory,
};
pub use download::{
    DEFAULT_DOWNLOAD_TIMEOUT_SECS, DownloadOptions, DownloadReport, DownloadRequest,
    DownloadedFile, Downloader, FailedDownload, FileFetcher, HttpFetcher, default_worker_count,
};
pub use error::{Error, Result};
pub use host::{HostApplication, HostProfile, OpenDisposition, open_part_file};
pub use model::{Component, Fileset, FilesetFile, ImageFile, Modification, OwnerUser, Program};
pub use sync::{
    FavoritesOutcome, FilesOutcome, ModificationsOutcome, SyncOrchestrator, SyncedComponent,
    SyncedModification,
};
