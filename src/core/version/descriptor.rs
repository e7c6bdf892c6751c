// ─── Version Descriptor ───
// Typed per-version document: client download, asset index reference and
// the library list with its OS rules and native classifiers.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::Platform;

use super::manifest::VersionKind;

/// A fully parsed version descriptor. Required fields are enforced at
/// parse time so later stages never probe for missing keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    pub id: String,
    pub main_class: String,
    pub asset_index: AssetIndexRef,
    pub downloads: VersionDownloads,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(rename = "type")]
    pub kind: VersionKind,
    #[serde(default)]
    pub assets: Option<String>,
    #[serde(default)]
    pub java_version: Option<JavaVersionInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    pub major_version: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionDownloads {
    pub client: DownloadArtifact,
    #[serde(default)]
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
    /// Legacy OS → classifier template map, e.g. `{"windows": "natives-windows-${arch}"}`.
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
    #[serde(default)]
    pub extract: Option<ExtractRules>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: Option<BTreeMap<String, LibraryArtifact>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryArtifact {
    /// Path relative to the libraries root.
    pub path: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

impl LibraryEntry {
    /// Evaluate the entry's OS rules for `platform`.
    ///
    /// No rules means allowed. Otherwise start disallowed and let every
    /// rule whose OS constraint matches overwrite the verdict, top to bottom.
    pub fn is_allowed_for(&self, platform: Platform) -> bool {
        let Some(rules) = &self.rules else {
            return true;
        };

        let mut allowed = false;
        for rule in rules {
            let os_matches = match rule.os.as_ref().and_then(|os| os.name.as_deref()) {
                None => true,
                Some(name) => name == platform.os_name(),
            };
            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }
        allowed
    }

    /// The bare (platform-independent) artifact, if any.
    pub fn artifact(&self) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// Classifier key naming this entry's native archive on `platform`.
    pub fn native_classifier_for(&self, platform: Platform) -> String {
        match self
            .natives
            .as_ref()
            .and_then(|natives| natives.get(platform.os_name()))
        {
            Some(template) => template.replace("${arch}", Platform::arch_bits()),
            None => platform.native_classifier(),
        }
    }

    /// The native archive download matching `platform`, if the entry has one.
    pub fn native_for(&self, platform: Platform) -> Option<&LibraryArtifact> {
        let classifiers = self.downloads.as_ref()?.classifiers.as_ref()?;
        classifiers.get(&self.native_classifier_for(platform))
    }

    pub fn extract_excludes(&self) -> &[String] {
        self.extract
            .as_ref()
            .map(|e| e.exclude.as_slice())
            .unwrap_or(&[])
    }
}

impl VersionDescriptor {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        serde_json::from_str(raw).map_err(|e| LauncherError::malformed("version descriptor", e))
    }

    /// Libraries whose OS rules allow them on `platform`.
    pub fn libraries_for(&self, platform: Platform) -> impl Iterator<Item = &LibraryEntry> {
        self.libraries
            .iter()
            .filter(move |lib| lib.is_allowed_for(platform))
    }

    pub fn client(&self) -> &DownloadArtifact {
        &self.downloads.client
    }
}
