use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::downloader::RetryPolicy;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::Platform;
use crate::core::version::Mirror;

const APP_DIR_NAME: &str = "mcinstall";

pub const DEFAULT_LIBRARY_CONCURRENCY: usize = 5;
pub const DEFAULT_ASSET_CONCURRENCY: usize = 32;

/// Everything an install run needs, passed explicitly to each component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub game_dir: PathBuf,
    pub mirror: Mirror,
    pub platform: Platform,
    /// Gate size for the client jar, libraries and native archives.
    pub library_concurrency: usize,
    /// Gate size for asset objects.
    pub asset_concurrency: usize,
    pub retry: RetryPolicy,
    pub verify_hashes: bool,
    pub reuse_existing: bool,
    /// Stop admitting new downloads after this many seconds.
    pub admission_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            game_dir: default_game_dir(),
            mirror: Mirror::default(),
            platform: Platform::current(),
            library_concurrency: DEFAULT_LIBRARY_CONCURRENCY,
            asset_concurrency: DEFAULT_ASSET_CONCURRENCY,
            retry: RetryPolicy::default(),
            verify_hashes: true,
            reuse_existing: true,
            admission_timeout_secs: None,
            request_timeout_secs: None,
        }
    }
}

impl InstallerConfig {
    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(LauncherError::io(path, e)),
        };

        let config: InstallerConfig = serde_json::from_str(&raw)
            .map_err(|e| LauncherError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> LauncherResult<()> {
        if self.library_concurrency == 0 || self.asset_concurrency == 0 {
            return Err(LauncherError::Config(
                "concurrency limits must be at least 1".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(LauncherError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn admission_timeout(&self) -> Option<Duration> {
        self.admission_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

pub fn default_config_path() -> PathBuf {
    default_base_dir().join(APP_DIR_NAME).join("config.json")
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_game_dir() -> PathBuf {
    default_base_dir().join(APP_DIR_NAME).join(".minecraft")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::Backoff;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = InstallerConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.library_concurrency, 5);
        assert_eq!(config.asset_concurrency, 32);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.verify_hashes);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "game_dir": "/games/mc",
                "mirror": "bmclapi",
                "asset_concurrency": 8,
                "retry": {"max_attempts": 2, "backoff": {"kind": "fixed", "delay_ms": 0}}
            }"#,
        )
        .unwrap();

        let config = InstallerConfig::load(&path).unwrap();
        assert_eq!(config.game_dir, PathBuf::from("/games/mc"));
        assert_eq!(config.mirror, Mirror::Bmclapi);
        assert_eq!(config.asset_concurrency, 8);
        assert_eq!(config.library_concurrency, 5);
        assert_eq!(
            config.retry,
            RetryPolicy::new(2, Backoff::Fixed { delay_ms: 0 })
        );
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"library_concurrency": 0}"#).unwrap();

        let err = InstallerConfig::load(&path).unwrap_err();
        assert!(matches!(err, LauncherError::Config(_)));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            InstallerConfig::load(&path),
            Err(LauncherError::Config(_))
        ));
    }
}
