use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::core::config::InstallerConfig;
use crate::core::error::{LauncherError, LauncherResult};

use super::retry::{RetryPolicy, Sleeper, TokioSleeper};
use super::task::FetchTask;
use super::transport::Transport;

/// How a task reached its successful terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded { bytes: u64 },
    /// The destination already held the declared content.
    Reused,
}

/// The unit of work the scheduler drives.
#[async_trait]
pub trait TaskFetcher: Send + Sync {
    /// Fetch one task to its destination, reporting the task-local fraction
    /// in `[0, 1]` after every chunk.
    async fn fetch(
        &self,
        task: &FetchTask,
        on_progress: &(dyn Fn(f64) + Send + Sync),
    ) -> LauncherResult<FetchOutcome>;
}

/// Streaming, retrying, optionally SHA-1 validated single-file fetcher.
pub struct ContentFetcher {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    verify_hashes: bool,
    reuse_existing: bool,
}

impl ContentFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            verify_hashes: true,
            reuse_existing: false,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &InstallerConfig) -> Self {
        Self::new(transport)
            .with_retry(config.retry)
            .verify_hashes(config.verify_hashes)
            .reuse_existing(config.reuse_existing)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn verify_hashes(mut self, verify: bool) -> Self {
        self.verify_hashes = verify;
        self
    }

    pub fn reuse_existing(mut self, reuse: bool) -> Self {
        self.reuse_existing = reuse;
        self
    }

    // ── Single attempt ──────────────────────────────────

    /// Stream one response body into `task.dest`. Returns the bytes written.
    async fn attempt(
        &self,
        task: &FetchTask,
        on_progress: &(dyn Fn(f64) + Send + Sync),
    ) -> LauncherResult<u64> {
        if let Some(parent) = task.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let mut response = self.transport.get(&task.url).await?;

        // Unknown or zero length falls back to the declared size, then to 1.
        let divisor = response
            .content_length
            .filter(|n| *n > 0)
            .or(task.size.filter(|n| *n > 0))
            .unwrap_or(1) as f64;

        let mut hasher = (self.verify_hashes && task.sha1.is_some()).then(Sha1::new);
        let mut written: u64 = 0;

        {
            let mut file = tokio::fs::File::create(&task.dest)
                .await
                .map_err(|e| LauncherError::io(&task.dest, e))?;

            while let Some(chunk) = response.body.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| LauncherError::io(&task.dest, e))?;
                if let Some(hasher) = hasher.as_mut() {
                    hasher.update(&chunk);
                }
                written += chunk.len() as u64;
                on_progress((written as f64 / divisor).min(1.0));
            }

            file.flush()
                .await
                .map_err(|e| LauncherError::io(&task.dest, e))?;
            // file is dropped here, before any verification failure triggers a rewrite
        }

        if let Some(expected) = task.size {
            if expected != written {
                return Err(LauncherError::SizeMismatch {
                    path: task.dest.clone(),
                    expected,
                    actual: written,
                });
            }
        }

        if let (Some(hasher), Some(expected)) = (hasher, task.sha1.as_deref()) {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LauncherError::Sha1Mismatch {
                    path: task.dest.clone(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        on_progress(1.0);
        Ok(written)
    }

    // ── Resume support ──────────────────────────────────

    /// Whether `task.dest` already holds the declared content.
    ///
    /// Needs at least one declared property to compare against; a file
    /// with neither size nor hash is always fetched again. Anything that
    /// cannot be inspected counts as not reusable, leaving the failure to
    /// the fetch attempts.
    pub async fn is_reusable(&self, task: &FetchTask) -> bool {
        if !self.reuse_existing {
            return false;
        }

        let metadata = match tokio::fs::metadata(&task.dest).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return false,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!("Cannot inspect {:?}: {}", task.dest, e);
                }
                return false;
            }
        };

        if let Some(size) = task.size {
            if metadata.len() != size {
                return false;
            }
        }

        match (self.verify_hashes, task.sha1.as_deref()) {
            (true, Some(expected)) => Self::validate_sha1(&task.dest, expected)
                .await
                .unwrap_or(false),
            _ => task.size.is_some(),
        }
    }

    /// Validate an existing file's SHA-1 without loading it whole.
    pub async fn validate_sha1(path: &Path, expected: &str) -> LauncherResult<bool> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| LauncherError::io(path, e))?;

        let mut hasher = Sha1::new();
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .map_err(|e| LauncherError::io(path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()).eq_ignore_ascii_case(expected))
    }
}

#[async_trait]
impl TaskFetcher for ContentFetcher {
    async fn fetch(
        &self,
        task: &FetchTask,
        on_progress: &(dyn Fn(f64) + Send + Sync),
    ) -> LauncherResult<FetchOutcome> {
        if self.is_reusable(task).await {
            debug!("Reusing {:?}", task.dest);
            on_progress(1.0);
            return Ok(FetchOutcome::Reused);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(task, on_progress).await {
                Ok(bytes) => {
                    debug!("Downloaded: {} -> {:?} ({} bytes)", task.url, task.dest, bytes);
                    return Ok(FetchOutcome::Downloaded { bytes });
                }
                Err(error) => match self.retry.next_delay(attempt) {
                    Some(delay) => {
                        warn!(
                            "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                            attempt, self.retry.max_attempts, task.url, error, delay
                        );
                        self.sleeper.sleep(delay).await;
                    }
                    None => {
                        warn!("Giving up on {} after {} attempt(s): {}", task.url, attempt, error);
                        return Err(LauncherError::DownloadFailed {
                            url: task.url.clone(),
                            attempts: attempt,
                            reason: error.to_string(),
                        });
                    }
                },
            }
        }
    }
}
