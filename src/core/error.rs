use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the installer backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Refusing path outside of install root: {0}")]
    UnsafePath(String),

    // ── Manifest ────────────────────────────────────────
    #[error("Manifest unavailable at {url}: {reason}")]
    ManifestUnavailable { url: String, reason: String },

    #[error("Version not found in manifest: {0}")]
    VersionNotFound(String),

    #[error("Malformed {what}: {reason}")]
    MalformedDocument { what: String, reason: String },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Download failed for {url} after {attempts} attempt(s): {reason}")]
    DownloadFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Download of {url} was never admitted before the deadline")]
    NotAdmitted { url: String },

    // ── Integrity ───────────────────────────────────────
    #[error("Size mismatch for {path:?}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Version {version} is not completely installed: {reason}")]
    IncompleteInstallation { version: String, reason: String },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to extract natives from {archive:?}: {reason}")]
    ExtractionFailed { archive: PathBuf, reason: String },

    // ── Java ────────────────────────────────────────────
    #[error(
        "No Java installation found{}",
        .0.map(|major| format!(" (needs Java {major}+)")).unwrap_or_default()
    )]
    JavaNotFound(Option<u32>),

    // ── Config ──────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(what: impl Into<String>, reason: impl ToString) -> Self {
        LauncherError::MalformedDocument {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_failure_names_the_url() {
        let err = LauncherError::DownloadFailed {
            url: "https://example.com/a.jar".into(),
            attempts: 5,
            reason: "HTTP 503".into(),
        };
        let text = err.to_string();
        assert!(text.contains("https://example.com/a.jar"));
        assert!(text.contains("5 attempt"));
    }

    #[test]
    fn extraction_failure_names_the_archive() {
        let err = LauncherError::ExtractionFailed {
            archive: PathBuf::from("libraries/lwjgl-natives.jar"),
            reason: "invalid Zip archive".into(),
        };
        assert!(err.to_string().contains("lwjgl-natives.jar"));
    }
}
