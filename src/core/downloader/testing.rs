//! In-memory transport and sleeper shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};

use crate::core::error::{LauncherError, LauncherResult};

use super::retry::Sleeper;
use super::transport::{Transport, TransportResponse};

enum Route {
    Body { bytes: Vec<u8>, announce_length: bool },
    Status(u16),
    FailThenServe { failures_left: u32, bytes: Vec<u8> },
}

pub(crate) struct MemoryTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<HashMap<String, u32>>,
    chunk_size: usize,
}

impl MemoryTransport {
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            chunk_size: 4,
        }
    }

    pub(crate) fn with_body(self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.route(
            url,
            Route::Body {
                bytes: bytes.into(),
                announce_length: true,
            },
        )
    }

    pub(crate) fn without_length(self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.route(
            url,
            Route::Body {
                bytes: bytes.into(),
                announce_length: false,
            },
        )
    }

    pub(crate) fn with_status(self, url: &str, status: u16) -> Self {
        self.route(url, Route::Status(status))
    }

    pub(crate) fn fail_then_serve(self, url: &str, failures: u32, bytes: impl Into<Vec<u8>>) -> Self {
        self.route(
            url,
            Route::FailThenServe {
                failures_left: failures,
                bytes: bytes.into(),
            },
        )
    }

    fn route(self, url: &str, route: Route) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), route);
        self
    }

    pub(crate) fn calls(&self, url: &str) -> u32 {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    fn respond(&self, bytes: Vec<u8>, announce_length: bool) -> TransportResponse {
        let content_length = announce_length.then_some(bytes.len() as u64);
        let chunks: Vec<LauncherResult<Bytes>> = bytes
            .chunks(self.chunk_size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        TransportResponse {
            content_length,
            body: stream::iter(chunks).boxed(),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, url: &str) -> LauncherResult<TransportResponse> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        let mut routes = self.routes.lock().unwrap();
        let status_error = |status| LauncherError::HttpStatus {
            url: url.to_string(),
            status,
        };

        match routes.get_mut(url) {
            None => Err(status_error(404)),
            Some(Route::Status(status)) => Err(status_error(*status)),
            Some(Route::Body {
                bytes,
                announce_length,
            }) => Ok(self.respond(bytes.clone(), *announce_length)),
            Some(Route::FailThenServe {
                failures_left,
                bytes,
            }) => {
                if *failures_left > 0 {
                    *failures_left -= 1;
                    Err(status_error(503))
                } else {
                    Ok(self.respond(bytes.clone(), true))
                }
            }
        }
    }
}

/// Records requested delays instead of waiting.
#[derive(Default)]
pub(crate) struct RecordingSleeper {
    pub(crate) slept: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

pub(crate) fn sha1_hex(bytes: &[u8]) -> String {
    use sha1::{Digest, Sha1};
    hex::encode(Sha1::digest(bytes))
}
