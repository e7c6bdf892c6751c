use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::core::downloader::FetchTask;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::InstallLayout;
use crate::core::version::{hash_shard, Mirror};

/// Top-level asset index JSON structure.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndex {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetIndex {
    /// Parse and reject objects whose hash cannot name a shard directory.
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        let index: AssetIndex = serde_json::from_str(raw)
            .map_err(|e| LauncherError::malformed("asset index", e))?;

        for (name, object) in &index.objects {
            if hash_shard(&object.hash).is_none() {
                return Err(LauncherError::malformed(
                    "asset index",
                    format!("object {name:?} has invalid hash {:?}", object.hash),
                ));
            }
        }
        Ok(index)
    }

    pub fn unique_hashes(&self) -> usize {
        self.objects
            .values()
            .map(|o| o.hash.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// One fetch task per distinct hash. Names never decide identity, so
/// every name sharing a hash resolves to the same stored object.
pub fn plan_objects(
    index: &AssetIndex,
    mirror: Mirror,
    layout: &InstallLayout,
    version_id: &str,
) -> LauncherResult<Vec<FetchTask>> {
    let mut seen = HashSet::new();
    index
        .objects
        .values()
        .filter(|object| seen.insert(object.hash.as_str()))
        .map(|object| {
            Ok(FetchTask::new(
                mirror.object_url(&object.hash)?,
                layout.object_path(version_id, &object.hash)?,
            )
            .with_size(object.size)
            .with_sha1(object.hash.clone()))
        })
        .collect()
}
