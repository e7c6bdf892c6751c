// ─── Download Scheduler ───
// Bounded-concurrency fan-out over fetch tasks: every task is spawned against
// a counting admission gate and the batch always waits for all of them.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::core::error::LauncherError;

use super::client::{FetchOutcome, TaskFetcher};
use super::progress::{Phase, ProgressHandle};
use super::task::FetchTask;

/// A task that reached its terminal state without success.
#[derive(Debug)]
pub struct TaskFailure {
    pub task: FetchTask,
    pub error: LauncherError,
}

/// Terminal states of one batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub downloaded: usize,
    pub reused: usize,
    pub bytes: u64,
    pub failures: Vec<TaskFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.downloaded + self.reused + self.failures.len()
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.downloaded += other.downloaded;
        self.reused += other.reused;
        self.bytes += other.bytes;
        self.failures.extend(other.failures);
    }

    pub fn failed_urls(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.task.url.as_str()).collect()
    }

    /// Collapse into the first failure, for callers that want `?`.
    pub fn into_result(mut self) -> Result<Self, LauncherError> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(self.failures.swap_remove(0).error)
        }
    }
}

/// Progress wiring for one batch.
#[derive(Clone)]
pub struct PhaseProgress {
    pub handle: ProgressHandle,
    pub phase: Phase,
}

pub struct DownloadScheduler {
    fetcher: Arc<dyn TaskFetcher>,
    /// Tasks not admitted within this window end as `NotAdmitted`.
    admission_timeout: Option<Duration>,
}

impl DownloadScheduler {
    pub fn new(fetcher: Arc<dyn TaskFetcher>) -> Self {
        Self {
            fetcher,
            admission_timeout: None,
        }
    }

    pub fn with_admission_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.admission_timeout = timeout;
        self
    }

    /// Run every task with at most `limit` in flight and wait for all of
    /// them to terminate. One task's failure never cancels its siblings.
    pub async fn run(
        &self,
        tasks: Vec<FetchTask>,
        limit: usize,
        progress: Option<PhaseProgress>,
    ) -> BatchReport {
        let limit = limit.max(1);
        let gate = Arc::new(Semaphore::new(limit));
        let deadline = self.admission_timeout.map(|t| Instant::now() + t);

        info!(
            "Starting batch download: {} files, concurrency={}",
            tasks.len(),
            limit
        );
        if let Some(p) = &progress {
            p.handle.begin_phase(p.phase, tasks.len());
        }

        let mut retained = Vec::with_capacity(tasks.len());
        let mut handles = Vec::with_capacity(tasks.len());

        for (index, task) in tasks.into_iter().enumerate() {
            retained.push(task.clone());
            let gate = Arc::clone(&gate);
            let fetcher = Arc::clone(&self.fetcher);
            let handle = progress.as_ref().map(|p| p.handle.clone());

            handles.push(tokio::spawn(async move {
                let admitted = match deadline {
                    Some(deadline) => {
                        match tokio::time::timeout_at(deadline, gate.acquire_owned()).await {
                            Ok(Ok(permit)) => Some(permit),
                            _ => None,
                        }
                    }
                    None => gate.acquire_owned().await.ok(),
                };

                let result = match admitted {
                    Some(_permit) => {
                        let report = |fraction: f64| {
                            if let Some(h) = &handle {
                                h.task_progress(index, fraction);
                            }
                        };
                        fetcher.fetch(&task, &report).await
                    }
                    None => Err(LauncherError::NotAdmitted {
                        url: task.url.clone(),
                    }),
                };

                if let Some(h) = &handle {
                    h.task_finished(index);
                }
                (task, result)
            }));
        }

        let mut report = BatchReport::default();
        for (joined, task) in join_all(handles).await.into_iter().zip(retained) {
            match joined {
                Ok((_, Ok(FetchOutcome::Downloaded { bytes }))) => {
                    report.downloaded += 1;
                    report.bytes += bytes;
                }
                Ok((_, Ok(FetchOutcome::Reused))) => report.reused += 1,
                Ok((task, Err(error))) => report.failures.push(TaskFailure { task, error }),
                Err(join_error) => report.failures.push(TaskFailure {
                    task,
                    error: LauncherError::Other(format!("download task aborted: {join_error}")),
                }),
            }
        }

        if let Some(p) = &progress {
            p.handle.end_phase(p.phase);
        }

        if report.is_success() {
            info!(
                "Batch finished: {} downloaded, {} reused",
                report.downloaded, report.reused
            );
        } else {
            warn!(
                "Batch finished with {} failure(s) out of {}",
                report.failures.len(),
                report.total()
            );
        }
        report
    }
}
