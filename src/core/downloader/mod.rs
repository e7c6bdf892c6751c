pub mod client;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod task;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ContentFetcher, FetchOutcome, TaskFetcher};
pub use progress::{InstallProgress, Phase, ProgressHandle, ProgressReporter};
pub use retry::{Backoff, RetryPolicy, Sleeper, TokioSleeper};
pub use scheduler::{BatchReport, DownloadScheduler, PhaseProgress, TaskFailure};
pub use task::FetchTask;
pub use transport::{read_to_string, HttpTransport, Transport, TransportResponse};
