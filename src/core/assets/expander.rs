// ─── Asset Index Expander ───
// Fetches one asset index into the install tree and expands it into
// content-addressed object tasks.

use std::sync::Arc;

use tracing::info;

use crate::core::downloader::{FetchTask, TaskFetcher};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::InstallLayout;
use crate::core::version::{Mirror, VersionDescriptor};

use super::asset_index::{plan_objects, AssetIndex};

pub struct AssetIndexExpander {
    fetcher: Arc<dyn TaskFetcher>,
    layout: InstallLayout,
    mirror: Mirror,
}

impl AssetIndexExpander {
    pub fn new(fetcher: Arc<dyn TaskFetcher>, layout: InstallLayout, mirror: Mirror) -> Self {
        Self {
            fetcher,
            layout,
            mirror,
        }
    }

    /// Download the index to `versions/<id>/assets/indexes/<index>.json`
    /// and parse it.
    pub async fn fetch_index(&self, descriptor: &VersionDescriptor) -> LauncherResult<AssetIndex> {
        let index_ref = &descriptor.asset_index;
        let path = self.layout.asset_index_path(&descriptor.id, &index_ref.id)?;

        let mut task = FetchTask::new(self.mirror.rebase(&index_ref.url), &path);
        task.size = index_ref.size;
        task.sha1 = index_ref.sha1.clone();

        self.fetcher.fetch(&task, &|_: f64| {}).await?;

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        AssetIndex::parse(&raw)
    }

    pub async fn expand(&self, descriptor: &VersionDescriptor) -> LauncherResult<Vec<FetchTask>> {
        let index = self.fetch_index(descriptor).await?;
        let tasks = plan_objects(&index, self.mirror, &self.layout, &descriptor.id)?;

        info!(
            "Asset index {}: {} names, {} unique objects",
            descriptor.asset_index.id,
            index.objects.len(),
            tasks.len()
        );
        Ok(tasks)
    }
}
