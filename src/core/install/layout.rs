// ─── Install Tree ───
// On-disk layout consumed verbatim at launch time:
//
//   versions/<id>/<id>.json
//   versions/<id>/<id>.jar
//   versions/<id>/<id>-natives/
//   versions/<id>/assets/indexes/<index-id>.json
//   versions/<id>/assets/objects/<hh>/<hash>
//   libraries/<relative path from descriptor>

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{hash_shard, VersionDescriptor};

#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.versions_dir().join(id)
    }

    pub fn descriptor_path(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{id}.json"))
    }

    pub fn client_jar_path(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{id}.jar"))
    }

    pub fn natives_dir(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{id}-natives"))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// Library path from a descriptor-supplied relative path.
    pub fn library_path(&self, relative: &str) -> LauncherResult<PathBuf> {
        Ok(self.libraries_dir().join(checked_relative(relative)?))
    }

    pub fn assets_dir(&self, id: &str) -> PathBuf {
        self.version_dir(id).join("assets")
    }

    pub fn asset_index_path(&self, id: &str, index_id: &str) -> LauncherResult<PathBuf> {
        let file = checked_relative(&format!("{index_id}.json"))?;
        Ok(self.assets_dir(id).join("indexes").join(file))
    }

    pub fn objects_dir(&self, id: &str) -> PathBuf {
        self.assets_dir(id).join("objects")
    }

    /// Content-addressed object path: the hash alone decides the location.
    pub fn object_path(&self, id: &str, hash: &str) -> LauncherResult<PathBuf> {
        let shard = hash_shard(hash).ok_or_else(|| LauncherError::UnsafePath(hash.to_string()))?;
        Ok(self.objects_dir(id).join(shard).join(hash))
    }

    // ── Completeness ────────────────────────────────────

    /// Re-derive whether `id` is installed: descriptor and client jar exist
    /// and the jar's size equals the descriptor's recorded client size.
    pub fn verify_installation(&self, id: &str) -> LauncherResult<VersionDescriptor> {
        let incomplete = |reason: String| LauncherError::IncompleteInstallation {
            version: id.to_string(),
            reason,
        };

        let descriptor_path = self.descriptor_path(id);
        let raw = match std::fs::read_to_string(&descriptor_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(incomplete(format!("missing {}", descriptor_path.display())));
            }
            Err(e) => return Err(LauncherError::io(descriptor_path, e)),
        };
        let descriptor = VersionDescriptor::parse(&raw)
            .map_err(|e| incomplete(format!("unreadable descriptor: {e}")))?;

        let jar_path = self.client_jar_path(id);
        let actual = match std::fs::metadata(&jar_path) {
            Ok(m) => m.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(incomplete(format!("missing {}", jar_path.display())));
            }
            Err(e) => return Err(LauncherError::io(jar_path, e)),
        };

        let expected = descriptor.client().size;
        if actual != expected {
            return Err(incomplete(format!(
                "client jar is {actual} bytes, descriptor records {expected}"
            )));
        }

        debug!("{} is completely installed", id);
        Ok(descriptor)
    }

    pub fn is_installed(&self, id: &str) -> bool {
        self.verify_installation(id).is_ok()
    }

    /// Version directories present on disk, installed or not, sorted.
    pub fn local_versions(&self) -> LauncherResult<Vec<String>> {
        let dir = self.versions_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LauncherError::io(dir, e)),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LauncherError::io(&dir, e))?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                versions.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        versions.sort();
        Ok(versions)
    }
}

/// Reject absolute paths and `..` so descriptor data cannot escape its root.
fn checked_relative(relative: &str) -> LauncherResult<PathBuf> {
    let path = Path::new(relative);
    let safe = !relative.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(path.to_path_buf())
    } else {
        Err(LauncherError::UnsafePath(relative.to_string()))
    }
}
