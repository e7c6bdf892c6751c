// ─── Manifest Resolver ───
// Lists versions and resolves one version's descriptor from the configured
// mirror. No retries here: a failed manifest read aborts the install.

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::downloader::{read_to_string, Transport};
use crate::core::error::{LauncherError, LauncherResult};

use super::descriptor::VersionDescriptor;
use super::manifest::{VersionKind, VersionManifest};
use super::mirror::Mirror;

/// A descriptor together with the exact bytes it was parsed from, which are
/// persisted verbatim to the install tree.
#[derive(Debug, Clone)]
pub struct ResolvedVersion {
    pub descriptor: VersionDescriptor,
    pub raw: String,
}

pub struct ManifestResolver {
    transport: Arc<dyn Transport>,
    mirror: Mirror,
}

impl ManifestResolver {
    pub fn new(transport: Arc<dyn Transport>, mirror: Mirror) -> Self {
        Self { transport, mirror }
    }

    pub fn mirror(&self) -> Mirror {
        self.mirror
    }

    async fn read(&self, url: &str) -> LauncherResult<String> {
        read_to_string(self.transport.as_ref(), url)
            .await
            .map_err(|e| LauncherError::ManifestUnavailable {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Fetch and parse the global version manifest.
    pub async fn fetch_manifest(&self) -> LauncherResult<VersionManifest> {
        let url = self.mirror.manifest_url();
        info!("Fetching version manifest from {}", url);

        let manifest = VersionManifest::parse(&self.read(&url).await?)?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    pub async fn list_versions(&self, kind: VersionKind) -> LauncherResult<Vec<String>> {
        Ok(self.fetch_manifest().await?.ids_of_kind(kind))
    }

    pub async fn resolve_version(&self, id: &str) -> LauncherResult<ResolvedVersion> {
        let manifest = self.fetch_manifest().await?;
        let entry = manifest
            .find_version(id)
            .ok_or_else(|| LauncherError::VersionNotFound(id.to_string()))?;

        let url = self.mirror.rebase(&entry.url);
        debug!("Resolving {} from {}", id, url);

        let raw = self.read(&url).await?;
        let descriptor = VersionDescriptor::parse(&raw)?;
        if descriptor.id != id {
            return Err(LauncherError::malformed(
                "version descriptor",
                format!("requested {} but document declares {}", id, descriptor.id),
            ));
        }

        info!(
            "Resolved {} ({}, {} libraries)",
            descriptor.id,
            descriptor.kind,
            descriptor.libraries.len()
        );
        Ok(ResolvedVersion { descriptor, raw })
    }
}
