use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("mcinstall/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client. `identity` encoding keeps `Content-Length` equal to
/// the number of bytes written to disk.
pub fn build_http_client(request_timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    let mut builder = Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers);

    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }

    builder.build()
}
