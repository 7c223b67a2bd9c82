//! Parallel downloader for fileset files.
//!
//! Given a batch of `(url, destination)` pairs, a bounded pool of worker
//! threads performs one blocking HTTP GET per item, writes the body to the
//! destination path, and reports per-file wall-clock timing. A failed item
//! is logged and recorded, never aborting the batch: partial completion is
//! the designed failure mode. Results arrive in completion order, not
//! input order.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Default timeout for a single file download.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Worker count derived from the host CPU: available parallelism minus
/// one, and never less than one.
#[must_use]
pub fn default_worker_count() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get().saturating_sub(1).max(1))
}

/// Fetch seam used by the downloader.
///
/// The HTTP implementation is [`HttpFetcher`]; tests substitute scripted
/// fetchers to exercise the pool without a network.
#[cfg_attr(test, mockall::automock)]
pub trait FileFetcher {
    /// Fetch the full body behind `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestFailed`] on a non-success status or a
    /// transport failure.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP implementation of [`FileFetcher`].
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default download timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS))
    }

    /// Create a fetcher with an explicit per-download timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl FileFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().map_err(|e| Error::RequestFailed {
            status: None,
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RequestFailed {
                status: Some(status.as_u16()),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        let bytes = response.bytes().map_err(|e| Error::RequestFailed {
            status: None,
            reason: format!("Failed to read download body: {e}"),
        })?;
        Ok(bytes.to_vec())
    }
}

/// One item of a download batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// URL to fetch.
    pub url: String,
    /// Path the body is written to.
    pub destination: PathBuf,
}

impl DownloadRequest {
    /// Create a download request.
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
        }
    }
}

/// Options controlling a download batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Number of concurrent worker threads.
    pub workers: usize,
    /// Timeout applied to each individual download.
    pub timeout: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
            timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        }
    }
}

impl DownloadOptions {
    /// Set the worker count. Values below one are clamped to one.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 { 1 } else { workers };
        self
    }

    /// Set the per-download timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A successfully downloaded file with its elapsed wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadedFile {
    /// Path the file was written to.
    pub path: PathBuf,
    /// Wall-clock seconds spent fetching and writing this file.
    pub elapsed_secs: f64,
}

/// A download-batch item that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDownload {
    /// URL that failed.
    pub url: String,
    /// Destination the file would have been written to.
    pub destination: PathBuf,
    /// Error description.
    pub error: String,
}

/// Outcome of a download batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DownloadReport {
    /// Files that completed, in completion order.
    pub completed: Vec<DownloadedFile>,
    /// Items that failed and were skipped.
    pub failed: Vec<FailedDownload>,
    /// Wall-clock seconds for the whole batch.
    pub total_elapsed_secs: f64,
}

impl DownloadReport {
    /// Number of items the batch was asked to download.
    #[must_use]
    pub fn requested(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    /// Whether every item completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Convert a partial batch into a hard error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartialDownload`] if any item failed.
    pub fn ensure_complete(&self) -> Result<()> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(Error::PartialDownload {
                failed: self.failed.len(),
                total: self.requested(),
            })
        }
    }

    /// One-line summary for user-visible logs.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} of {} files downloaded in {:.2}s",
            self.completed.len(),
            self.requested(),
            self.total_elapsed_secs
        )
    }
}

/// Bounded-concurrency downloader over a [`FileFetcher`].
pub struct Downloader<F> {
    fetcher: F,
    options: DownloadOptions,
}

impl<F: FileFetcher + Sync> Downloader<F> {
    /// Create a downloader with default options.
    pub fn new(fetcher: F) -> Self {
        Self::with_options(fetcher, DownloadOptions::default())
    }

    /// Create a downloader with explicit options.
    pub const fn with_options(fetcher: F, options: DownloadOptions) -> Self {
        Self { fetcher, options }
    }

    /// Fetch every request in the batch with bounded worker concurrency.
    ///
    /// Workers share nothing but the work queue and the filesystem;
    /// destinations are unique by construction, so concurrent writes never
    /// target the same path. A failed item is logged and recorded in the
    /// report without aborting the rest of the batch.
    pub fn fetch_all(&self, requests: Vec<DownloadRequest>) -> DownloadReport {
        let started = Instant::now();
        let mut report = DownloadReport::default();

        if requests.is_empty() {
            return report;
        }

        let workers = self.options.workers.max(1).min(requests.len());
        info!(
            "Downloading {} files with {} workers",
            requests.len(),
            workers
        );

        let queue = Mutex::new(VecDeque::from(requests));
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            let queue = &queue;
            let fetcher = &self.fetcher;
            for _ in 0..workers {
                let tx = tx.clone();
                scope.spawn(move || {
                    loop {
                        let next = {
                            let Ok(mut pending) = queue.lock() else {
                                break;
                            };
                            pending.pop_front()
                        };
                        let Some(request) = next else {
                            break;
                        };

                        let outcome = fetch_one(fetcher, &request);
                        if let Err(failed) = &outcome {
                            warn!("Download failed for {}: {}", failed.url, failed.error);
                        }
                        if tx.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);
        });

        for outcome in rx {
            match outcome {
                Ok(file) => report.completed.push(file),
                Err(failed) => report.failed.push(failed),
            }
        }

        report.total_elapsed_secs = started.elapsed().as_secs_f64();
        info!("{}", report.summary());
        report
    }
}

/// Fetch one item and write it to its destination.
fn fetch_one<F: FileFetcher>(
    fetcher: &F,
    request: &DownloadRequest,
) -> std::result::Result<DownloadedFile, FailedDownload> {
    let file_started = Instant::now();

    let failed = |error: String| FailedDownload {
        url: request.url.clone(),
        destination: request.destination.clone(),
        error,
    };

    let bytes = fetcher.fetch(&request.url).map_err(|e| failed(e.to_string()))?;

    if let Some(parent) = request.destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| failed(format!("Failed to create parent directory: {e}")))?;
    }

    fs::write(&request.destination, &bytes)
        .map_err(|e| failed(format!("Failed to write file: {e}")))?;

    let elapsed_secs = file_started.elapsed().as_secs_f64();
    debug!(
        "Downloaded {} ({} bytes) in {:.2}s",
        request.destination.display(),
        bytes.len(),
        elapsed_secs
    );

    Ok(DownloadedFile {
        path: request.destination.clone(),
        elapsed_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Scripted fetcher mapping URLs to canned outcomes.
    struct ScriptedFetcher {
        bodies: HashMap<String, Vec<u8>>,
    }

    impl ScriptedFetcher {
        fn new() -> Self {
            Self {
                bodies: HashMap::new(),
            }
        }

        fn with_body(mut self, url: &str, body: &[u8]) -> Self {
            self.bodies.insert(url.to_string(), body.to_vec());
            self
        }
    }

    impl FileFetcher for ScriptedFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.bodies.get(url).cloned().ok_or(Error::RequestFailed {
                status: Some(404),
                reason: "Not Found".to_string(),
            })
        }
    }

    #[test]
    fn test_fetch_all_writes_every_file() {
        let dir = TempDir::new().expect("create temp dir");
        let fetcher = ScriptedFetcher::new()
            .with_body("https://files.test/1", b"one")
            .with_body("https://files.test/2", b"two");
        let downloader =
            Downloader::with_options(fetcher, DownloadOptions::default().with_workers(2));

        let report = downloader.fetch_all(vec![
            DownloadRequest::new("https://files.test/1", dir.path().join("one.step")),
            DownloadRequest::new("https://files.test/2", dir.path().join("two.step")),
        ]);

        assert!(report.is_complete());
        assert_eq!(report.completed.len(), 2);
        assert_eq!(
            fs::read(dir.path().join("one.step")).expect("read one"),
            b"one"
        );
        assert_eq!(
            fs::read(dir.path().join("two.step")).expect("read two"),
            b"two"
        );
    }

    #[test]
    fn test_fetch_all_failed_item_does_not_block_the_rest() {
        let dir = TempDir::new().expect("create temp dir");
        let fetcher = ScriptedFetcher::new()
            .with_body("https://files.test/1", b"one")
            .with_body("https://files.test/2", b"two")
            .with_body("https://files.test/3", b"three");
        let downloader =
            Downloader::with_options(fetcher, DownloadOptions::default().with_workers(2));

        let report = downloader.fetch_all(vec![
            DownloadRequest::new("https://files.test/1", dir.path().join("1")),
            DownloadRequest::new("https://files.test/missing", dir.path().join("missing")),
            DownloadRequest::new("https://files.test/2", dir.path().join("2")),
            DownloadRequest::new("https://files.test/3", dir.path().join("3")),
        ]);

        assert_eq!(report.completed.len(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, "https://files.test/missing");
        assert!(!dir.path().join("missing").exists());
        assert!(matches!(
            report.ensure_complete(),
            Err(Error::PartialDownload {
                failed: 1,
                total: 4
            })
        ));
    }

    #[test]
    fn test_fetch_all_empty_batch() {
        let downloader = Downloader::new(ScriptedFetcher::new());
        let report = downloader.fetch_all(Vec::new());
        assert!(report.is_complete());
        assert_eq!(report.requested(), 0);
    }

    #[test]
    fn test_fetch_all_records_per_file_timing() {
        let dir = TempDir::new().expect("create temp dir");
        let fetcher = ScriptedFetcher::new().with_body("https://files.test/1", b"one");
        let downloader = Downloader::new(fetcher);

        let report = downloader.fetch_all(vec![DownloadRequest::new(
            "https://files.test/1",
            dir.path().join("one.step"),
        )]);

        assert_eq!(report.completed.len(), 1);
        assert!(report.completed[0].elapsed_secs >= 0.0);
        assert!(report.total_elapsed_secs >= report.completed[0].elapsed_secs);
    }

    #[test]
    fn test_fetch_all_creates_parent_directories() {
        let dir = TempDir::new().expect("create temp dir");
        let fetcher = ScriptedFetcher::new().with_body("https://files.test/1", b"one");
        let downloader = Downloader::new(fetcher);

        let nested = dir.path().join("deep").join("er").join("one.step");
        let report =
            downloader.fetch_all(vec![DownloadRequest::new("https://files.test/1", &nested)]);

        assert!(report.is_complete());
        assert_eq!(fs::read(nested).expect("read nested"), b"one");
    }

    #[test]
    fn test_fetch_all_with_mock_fetcher() {
        let dir = TempDir::new().expect("create temp dir");
        let mut fetcher = MockFileFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(b"payload".to_vec()));
        let downloader = Downloader::new(fetcher);

        let report = downloader.fetch_all(vec![DownloadRequest::new(
            "https://files.test/any",
            dir.path().join("any"),
        )]);

        assert!(report.is_complete());
    }

    #[test]
    fn test_default_worker_count_is_at_least_one() {
        assert!(default_worker_count() >= 1);
    }

    #[test]
    fn test_options_clamp_zero_workers() {
        let options = DownloadOptions::default().with_workers(0);
        assert_eq!(options.workers, 1);
    }

    #[test]
    fn test_report_summary_format() {
        let report = DownloadReport {
            completed: vec![DownloadedFile {
                path: PathBuf::from("/lib/one.step"),
                elapsed_secs: 0.5,
            }],
            failed: vec![FailedDownload {
                url: "https://files.test/2".to_string(),
                destination: PathBuf::from("/lib/two.step"),
                error: "Not Found".to_string(),
            }],
            total_elapsed_secs: 1.25,
        };
        assert_eq!(report.summary(), "1 of 2 files downloaded in 1.25s");
    }
}
