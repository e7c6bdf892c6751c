use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::downloader::FetchTask;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::Platform;
use crate::core::version::{LibraryArtifact, Mirror, ResolvedVersion, VersionDescriptor};

use super::layout::InstallLayout;

/// A downloaded native archive and the entry prefixes to leave out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeArchive {
    pub path: PathBuf,
    pub exclude: Vec<String>,
}

/// Everything one version needs fetched, split by task class.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub version_id: String,
    pub client: FetchTask,
    pub libraries: Vec<FetchTask>,
    pub natives: Vec<FetchTask>,
    pub native_archives: Vec<NativeArchive>,
}

impl InstallPlan {
    pub fn task_count(&self) -> usize {
        1 + self.libraries.len() + self.natives.len()
    }
}

/// Walks a descriptor's library list and turns it into fetch tasks for
/// one platform.
pub struct InstallationPlanner {
    layout: InstallLayout,
    mirror: Mirror,
    platform: Platform,
}

impl InstallationPlanner {
    pub fn new(layout: InstallLayout, mirror: Mirror, platform: Platform) -> Self {
        Self {
            layout,
            mirror,
            platform,
        }
    }

    /// Persist the descriptor, then plan. The descriptor is written whether
    /// or not any later download succeeds.
    pub async fn plan(&self, resolved: &ResolvedVersion) -> LauncherResult<InstallPlan> {
        self.persist_descriptor(resolved).await?;
        self.plan_tasks(&resolved.descriptor)
    }

    /// Write the descriptor bytes verbatim to `versions/<id>/<id>.json`.
    pub async fn persist_descriptor(&self, resolved: &ResolvedVersion) -> LauncherResult<PathBuf> {
        let id = &resolved.descriptor.id;
        let dir = self.layout.version_dir(id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LauncherError::io(&dir, e))?;

        let path = self.layout.descriptor_path(id);
        tokio::fs::write(&path, &resolved.raw)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;

        debug!("Saved descriptor to {:?}", path);
        Ok(path)
    }

    pub fn plan_tasks(&self, descriptor: &VersionDescriptor) -> LauncherResult<InstallPlan> {
        let id = &descriptor.id;
        let client = descriptor.client();
        let client_task = FetchTask::new(
            self.mirror.rebase(&client.url),
            self.layout.client_jar_path(id),
        )
        .with_size(client.size)
        .with_sha1(client.sha1.clone());

        let mut planned = HashSet::new();
        let mut libraries = Vec::new();
        let mut natives = Vec::new();
        let mut native_archives = Vec::new();

        for lib in &descriptor.libraries {
            // ── Evaluate OS rules ──
            if !lib.is_allowed_for(self.platform) {
                debug!("Skipping library (OS rule): {}", lib.name);
                continue;
            }

            let artifact = lib.artifact();
            let native = lib.native_for(self.platform);
            if artifact.is_none() && native.is_none() {
                debug!("Skipping library (nothing for {}): {}", self.platform, lib.name);
                continue;
            }

            if let Some(artifact) = artifact {
                if let Some(task) = self.library_task(artifact, &mut planned)? {
                    libraries.push(task);
                }
            }

            // ── Native classifier ──
            if let Some(native) = native {
                if let Some(task) = self.library_task(native, &mut planned)? {
                    native_archives.push(NativeArchive {
                        path: task.dest.clone(),
                        exclude: lib.extract_excludes().to_vec(),
                    });
                    natives.push(task);
                }
            }
        }

        info!(
            "Planned {}: client + {} libraries + {} native archives",
            id,
            libraries.len(),
            natives.len()
        );

        Ok(InstallPlan {
            version_id: id.clone(),
            client: client_task,
            libraries,
            natives,
            native_archives,
        })
    }

    /// One task per destination; artifacts without a URL are local-only.
    fn library_task(
        &self,
        artifact: &LibraryArtifact,
        planned: &mut HashSet<PathBuf>,
    ) -> LauncherResult<Option<FetchTask>> {
        if artifact.url.is_empty() {
            debug!("Skipping artifact without URL: {}", artifact.path);
            return Ok(None);
        }

        let dest = self.layout.library_path(&artifact.path)?;
        if !planned.insert(dest.clone()) {
            return Ok(None);
        }

        let mut task = FetchTask::new(self.mirror.rebase(&artifact.url), dest);
        task.size = artifact.size;
        task.sha1 = artifact.sha1.clone();
        Ok(Some(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_descriptor() -> serde_json::Value {
        serde_json::json!({
            "id": "1.20.4",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "assetIndex": {"id": "12", "url": "https://piston-meta.mojang.com/v1/packages/i/12.json"},
            "downloads": {"client": {
                "url": "https://piston-data.mojang.com/v1/objects/c/client.jar",
                "sha1": "cc", "size": 10 * 1024 * 1024
            }},
            "libraries": [
                {
                    "name": "com.mojang:brigadier:1.2.9",
                    "downloads": {"artifact": {
                        "path": "com/mojang/brigadier/1.2.9/brigadier-1.2.9.jar",
                        "url": "https://libraries.minecraft.net/com/mojang/brigadier/1.2.9/brigadier-1.2.9.jar",
                        "sha1": "aa", "size": 3
                    }}
                },
                {
                    "name": "ca.weblite:java-objc-bridge:1.1",
                    "downloads": {"classifiers": {"natives-osx": {
                        "path": "ca/weblite/java-objc-bridge/1.1/java-objc-bridge-1.1-natives-osx.jar",
                        "url": "https://libraries.minecraft.net/ca/weblite/java-objc-bridge-1.1-natives-osx.jar"
                    }}}
                },
                {
                    "name": "org.lwjgl:lwjgl:3.3.3",
                    "downloads": {
                        "artifact": {
                            "path": "org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3.jar",
                            "url": "https://libraries.minecraft.net/org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3.jar"
                        },
                        "classifiers": {"natives-windows": {
                            "path": "org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-windows.jar",
                            "url": "https://libraries.minecraft.net/org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-windows.jar"
                        }}
                    },
                    "extract": {"exclude": ["META-INF/"]}
                }
            ]
        })
    }

    fn resolved(value: serde_json::Value) -> ResolvedVersion {
        let raw = serde_json::to_string_pretty(&value).unwrap();
        ResolvedVersion {
            descriptor: VersionDescriptor::parse(&raw).unwrap(),
            raw,
        }
    }

    #[tokio::test]
    async fn plans_client_artifacts_and_matching_natives() {
        let dir = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());
        let planner = InstallationPlanner::new(layout.clone(), Mirror::Official, Platform::Windows);

        let plan = planner.plan(&resolved(scenario_descriptor())).await.unwrap();

        assert_eq!(plan.client.dest, layout.client_jar_path("1.20.4"));
        assert_eq!(plan.client.size, Some(10 * 1024 * 1024));
        assert_eq!(plan.libraries.len(), 2);
        assert_eq!(plan.natives.len(), 1);
        assert_eq!(plan.task_count(), 4);
        assert_eq!(
            plan.native_archives,
            vec![NativeArchive {
                path: layout
                    .library_path("org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-windows.jar")
                    .unwrap(),
                exclude: vec!["META-INF/".to_string()],
            }]
        );
        assert!(plan
            .libraries
            .iter()
            .all(|t| !t.url.contains("objc-bridge")));
    }

    #[tokio::test]
    async fn descriptor_is_persisted_verbatim_before_any_download() {
        let dir = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());
        let planner = InstallationPlanner::new(layout.clone(), Mirror::Official, Platform::Linux);
        let resolved = resolved(scenario_descriptor());

        planner.plan(&resolved).await.unwrap();

        let saved = std::fs::read_to_string(layout.descriptor_path("1.20.4")).unwrap();
        assert_eq!(saved, resolved.raw);
        assert!(!layout.client_jar_path("1.20.4").exists());
    }

    #[test]
    fn other_platform_picks_its_own_native() {
        let layout = InstallLayout::new("/mc");
        let planner = InstallationPlanner::new(layout, Mirror::Official, Platform::Osx);

        let plan = planner
            .plan_tasks(&resolved(scenario_descriptor()).descriptor)
            .unwrap();

        assert_eq!(plan.libraries.len(), 2);
        assert_eq!(plan.natives.len(), 1);
        assert!(plan.natives[0].url.contains("natives-osx"));
    }

    #[test]
    fn rebases_urls_and_dedupes_destinations() {
        let mut value = scenario_descriptor();
        let duplicate = value["libraries"][0].clone();
        value["libraries"].as_array_mut().unwrap().push(duplicate);

        let planner = InstallationPlanner::new(InstallLayout::new("/mc"), Mirror::Bmclapi, Platform::Linux);
        let plan = planner.plan_tasks(&resolved(value).descriptor).unwrap();

        assert_eq!(plan.libraries.len(), 2);
        assert!(plan.natives.is_empty());
        assert!(plan.client.url.starts_with("https://bmclapi2.bangbang93.com/v1/objects/"));
        assert!(plan
            .libraries
            .iter()
            .all(|t| t.url.starts_with("https://bmclapi2.bangbang93.com/maven/")));
    }

    #[test]
    fn escaping_artifact_path_fails_planning() {
        let mut value = scenario_descriptor();
        value["libraries"][0]["downloads"]["artifact"]["path"] = "../../outside.jar".into();

        let planner = InstallationPlanner::new(InstallLayout::new("/mc"), Mirror::Official, Platform::Linux);
        assert!(matches!(
            planner.plan_tasks(&resolved(value).descriptor),
            Err(LauncherError::UnsafePath(_))
        ));
    }
}
