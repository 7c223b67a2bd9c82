//! Library configuration management.
//!
//! Handles loading, saving, and validating the persisted settings the
//! core depends on: the local library root, the catalog endpoints, the
//! bearer token, the target program identifier, and download tuning.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::download::{DEFAULT_DOWNLOAD_TIMEOUT_SECS, DownloadOptions, default_worker_count};
use crate::error::{Error, Result};

/// Default catalog query endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.partvault.io/graphql";

/// Default login endpoint.
pub const DEFAULT_LOGIN_ENDPOINT: &str = "https://api.partvault.io/login";

/// Download tuning persisted alongside the rest of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSettings {
    /// Worker thread count; `None` derives it from the host CPU.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Per-download timeout in seconds.
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,
}

const fn default_download_timeout() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            workers: None,
            timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

impl DownloadSettings {
    /// Resolve these settings into downloader options.
    #[must_use]
    pub fn to_options(&self) -> DownloadOptions {
        DownloadOptions::default()
            .with_workers(self.workers.unwrap_or_else(default_worker_count))
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Persisted library configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root directory of the local library tree.
    pub library_root: PathBuf,
    /// Catalog query endpoint URL.
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Login endpoint URL.
    #[serde(default = "default_login_endpoint")]
    pub login_endpoint: String,
    /// Bearer token for catalog requests; empty until the user logs in.
    #[serde(default)]
    pub bearer_token: String,
    /// Catalog-side identifier of the host program, used to filter
    /// filesets.
    #[serde(default)]
    pub program_id: u32,
    /// Download tuning.
    #[serde(default)]
    pub downloads: DownloadSettings,
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_login_endpoint() -> String {
    DEFAULT_LOGIN_ENDPOINT.to_string()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            library_root: default_library_root(),
            api_endpoint: default_api_endpoint(),
            login_endpoint: default_login_endpoint(),
            bearer_token: String::new(),
            program_id: 0,
            downloads: DownloadSettings::default(),
        }
    }
}

impl LibraryConfig {
    /// Load configuration from disk, or create defaults if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            Error::file_system(config_path, format!("Failed to read config file: {e}"))
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;

        info!("Loaded config from {}", config_path.display());
        debug!("Library root: {}", config.library_root.display());
        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::file_system(parent, format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content).map_err(|e| {
            Error::file_system(config_path, format!("Failed to write config file: {e}"))
        })?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Update the library root after validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is invalid or not writable.
    pub fn set_library_root(&mut self, path: PathBuf) -> Result<()> {
        validate_storage_directory(&path)?;
        self.library_root = path;
        info!("Updated library root to: {}", self.library_root.display());
        Ok(())
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = token.into();
        self
    }

    /// Set the target program identifier.
    #[must_use]
    pub const fn with_program_id(mut self, program_id: u32) -> Self {
        self.program_id = program_id;
        self
    }

    /// Set the catalog endpoint.
    #[must_use]
    pub fn with_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }
}

/// Get the default library root directory.
#[must_use]
pub fn default_library_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("partvault")
        .join("library")
}

/// Get the path to the config file.
fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("partvault")
        .join("config.json")
}

/// Validate that a directory is suitable as the library root.
pub fn validate_storage_directory(path: &Path) -> Result<()> {
    if !path.is_absolute() {
        return Err(Error::Configuration(
            "Library root must be an absolute path".to_string(),
        ));
    }

    if path.exists() {
        if !path.is_dir() {
            return Err(Error::Configuration(format!(
                "Path exists but is not a directory: {}",
                path.display()
            )));
        }

        let test_file = path.join(".partvault_write_test");
        match fs::write(&test_file, "test") {
            Ok(()) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                return Err(Error::Configuration(format!(
                    "Directory is not writable: {} ({})",
                    path.display(),
                    e
                )));
            }
        }
    } else {
        fs::create_dir_all(path).map_err(|e| {
            Error::Configuration(format!("Cannot create directory {}: {}", path.display(), e))
        })?;
        warn!("Created library root at {}", path.display());
    }

    Ok(())
}
