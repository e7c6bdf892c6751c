// ─── Version Manifest ───
// The global listing of known versions, fetched from the configured mirror.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::error::{LauncherError, LauncherResult};

/// Release channel of a version, as named by the manifest `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionKind {
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
    #[serde(other)]
    Other,
}

impl VersionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionKind::Release => "release",
            VersionKind::Snapshot => "snapshot",
            VersionKind::OldBeta => "old_beta",
            VersionKind::OldAlpha => "old_alpha",
            VersionKind::Other => "other",
        }
    }
}

impl std::fmt::Display for VersionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VersionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "release" => Ok(VersionKind::Release),
            "snapshot" => Ok(VersionKind::Snapshot),
            "old_beta" => Ok(VersionKind::OldBeta),
            "old_alpha" => Ok(VersionKind::OldAlpha),
            other => Err(format!("unknown version type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// Top-level version manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub latest: Option<LatestVersions>,
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: VersionKind,
    /// Descriptor location on the upstream host; re-rooted before use.
    pub url: String,
    #[serde(rename = "releaseTime", default)]
    pub release_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        serde_json::from_str(raw).map_err(|e| LauncherError::malformed("version manifest", e))
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Ids of every version of the given kind, in manifest order.
    pub fn ids_of_kind(&self, kind: VersionKind) -> Vec<String> {
        self.versions
            .iter()
            .filter(|v| v.kind == kind)
            .map(|v| v.id.clone())
            .collect()
    }
}
