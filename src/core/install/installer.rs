// ─── Installer ───
// Drives one install run end to end:
//   resolve → plan (descriptor persisted) → client → libraries + natives
//   → native extraction → asset index + objects → completeness check.
// Download failures never abort the run; they are collected in the report
// so a re-run resumes from the files already written.

use std::sync::Arc;

use tracing::{info, warn};

use crate::core::assets::AssetIndexExpander;
use crate::core::config::InstallerConfig;
use crate::core::downloader::{
    BatchReport, ContentFetcher, DownloadScheduler, HttpTransport, InstallProgress, Phase,
    PhaseProgress, ProgressReporter, Sleeper, TaskFetcher, TokioSleeper, Transport,
};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::natives::{ExtractionReport, NativeExtractor};
use crate::core::version::{ManifestResolver, VersionDescriptor};

use super::layout::InstallLayout;
use super::planner::InstallationPlanner;

/// Outcome of one install run.
#[derive(Debug)]
pub struct InstallReport {
    pub version_id: String,
    pub downloads: BatchReport,
    pub natives: ExtractionReport,
    /// The asset index itself could not be fetched or parsed.
    pub asset_index_error: Option<LauncherError>,
    /// Result of the completeness check, `None` when installed.
    pub incomplete: Option<LauncherError>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_none()
    }

    /// Complete and nothing failed along the way.
    pub fn is_clean(&self) -> bool {
        self.is_complete()
            && self.downloads.is_success()
            && self.natives.is_success()
            && self.asset_index_error.is_none()
    }

    /// Every failure, each naming the URL or archive involved.
    pub fn problems(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .downloads
            .failures
            .iter()
            .map(|f| f.error.to_string())
            .collect();
        problems.extend(self.natives.failures.iter().map(|e| e.to_string()));
        problems.extend(self.asset_index_error.iter().map(|e| e.to_string()));
        problems.extend(self.incomplete.iter().map(|e| e.to_string()));
        problems
    }
}

/// A version directory found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVersion {
    pub id: String,
    pub complete: bool,
}

pub struct Installer {
    config: InstallerConfig,
    layout: InstallLayout,
    resolver: ManifestResolver,
    fetcher: Arc<dyn TaskFetcher>,
    scheduler: DownloadScheduler,
}

impl Installer {
    pub fn new(config: InstallerConfig) -> LauncherResult<Self> {
        config.validate()?;
        let client = build_http_client(config.request_timeout())?;
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(client));
        Ok(Self::with_transport(config, transport, Arc::new(TokioSleeper)))
    }

    pub fn with_transport(
        config: InstallerConfig,
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let fetcher: Arc<dyn TaskFetcher> = Arc::new(
            ContentFetcher::from_config(Arc::clone(&transport), &config).with_sleeper(sleeper),
        );
        let scheduler = DownloadScheduler::new(Arc::clone(&fetcher))
            .with_admission_timeout(config.admission_timeout());

        Self {
            layout: InstallLayout::new(&config.game_dir),
            resolver: ManifestResolver::new(transport, config.mirror),
            fetcher,
            scheduler,
            config,
        }
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn resolver(&self) -> &ManifestResolver {
        &self.resolver
    }

    pub async fn install<F>(&self, id: &str, on_progress: F) -> LauncherResult<InstallReport>
    where
        F: FnMut(InstallProgress) + Send + 'static,
    {
        info!("Installing {} into {:?}", id, self.layout.root());

        // 1. Resolve + plan. Failures here abort the run.
        let resolved = self.resolver.resolve_version(id).await?;
        let planner =
            InstallationPlanner::new(self.layout.clone(), self.config.mirror, self.config.platform);
        let plan = planner.plan(&resolved).await?;
        let descriptor = &resolved.descriptor;

        let reporter = ProgressReporter::spawn(on_progress);
        let phase = |phase| {
            Some(PhaseProgress {
                handle: reporter.handle(),
                phase,
            })
        };

        // 2. Client jar
        let mut downloads = self
            .scheduler
            .run(vec![plan.client], self.config.library_concurrency, phase(Phase::Client))
            .await;

        // 3. Libraries and native archives share the large-artifact gate
        let mut library_tasks = plan.libraries;
        library_tasks.extend(plan.natives);
        downloads.merge(
            self.scheduler
                .run(library_tasks, self.config.library_concurrency, phase(Phase::Libraries))
                .await,
        );

        // 4. Natives, once every archive fetch has terminated
        let natives = NativeExtractor::extract(plan.native_archives, self.layout.natives_dir(id))
            .await
            .unwrap_or_else(|e| ExtractionReport {
                failures: vec![e],
                ..ExtractionReport::default()
            });

        // 5. Assets
        let expander =
            AssetIndexExpander::new(Arc::clone(&self.fetcher), self.layout.clone(), self.config.mirror);
        let (object_tasks, asset_index_error) = match expander.expand(descriptor).await {
            Ok(tasks) => (tasks, None),
            Err(e) => {
                warn!("Asset index unavailable for {}: {}", id, e);
                (Vec::new(), Some(e))
            }
        };
        downloads.merge(
            self.scheduler
                .run(object_tasks, self.config.asset_concurrency, phase(Phase::Assets))
                .await,
        );

        reporter.finish().await;

        // 6. Completeness is always re-derived from disk
        let incomplete = self.layout.verify_installation(id).err();

        let report = InstallReport {
            version_id: id.to_string(),
            downloads,
            natives,
            asset_index_error,
            incomplete,
        };

        if report.is_clean() {
            info!(
                "Installed {}: {} downloaded, {} reused, {} native file(s)",
                id, report.downloads.downloaded, report.downloads.reused, report.natives.files_written
            );
        } else {
            warn!("Install of {} finished with {} problem(s)", id, report.problems().len());
        }
        Ok(report)
    }

    /// Completeness check for an already-installed version.
    pub fn verify(&self, id: &str) -> LauncherResult<VersionDescriptor> {
        self.layout.verify_installation(id)
    }

    pub fn installed_versions(&self) -> LauncherResult<Vec<LocalVersion>> {
        Ok(self
            .layout
            .local_versions()?
            .into_iter()
            .map(|id| LocalVersion {
                complete: self.layout.is_installed(&id),
                id,
            })
            .collect())
    }
}
