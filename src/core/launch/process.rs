// ─── Launch Hand-off ───
// The completeness check always runs before anything is spawned; nothing
// about a previous install run is trusted.

use std::process::Stdio;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::auth::CredentialProvider;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::InstallLayout;
use crate::core::java;
use crate::core::platform::Platform;

use super::command::{LaunchCommand, LaunchOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchedProcess {
    pub pid: Option<u32>,
}

#[async_trait]
pub trait LaunchExecutor: Send + Sync {
    async fn execute(&self, command: &LaunchCommand) -> LauncherResult<LaunchedProcess>;
}

/// Spawns the game as a detached child inheriting stdio.
pub struct ProcessExecutor;

#[async_trait]
impl LaunchExecutor for ProcessExecutor {
    async fn execute(&self, command: &LaunchCommand) -> LauncherResult<LaunchedProcess> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd
            .spawn()
            .map_err(|e| LauncherError::io(&command.program, e))?;
        Ok(LaunchedProcess { pid: child.id() })
    }
}

/// Verify `id`, fetch credentials and hand the command to `executor`.
/// Without an explicit Java path, an installed runtime is detected that
/// meets the version's `javaVersion`.
pub async fn launch(
    layout: &InstallLayout,
    id: &str,
    platform: Platform,
    credentials: &dyn CredentialProvider,
    options: &LaunchOptions,
    executor: &dyn LaunchExecutor,
) -> LauncherResult<LaunchedProcess> {
    let descriptor = layout.verify_installation(id)?;
    let credentials = credentials.credentials().await?;

    let options = match &options.java {
        Some(_) => options.clone(),
        None => {
            let required = descriptor.java_version.as_ref().map(|j| j.major_version);
            let java = java::resolve_java(required).await?;
            info!("Using detected Java at {:?}", java);
            options.clone().with_java(java)
        }
    };
    let command = LaunchCommand::build(layout, &descriptor, platform, &credentials, &options)?;

    info!("Launching {} as {}", id, credentials.username);
    debug!("Command: {}", command.redacted());

    let process = executor.execute(&command).await?;
    info!("Game process started (pid {:?})", process.pid);
    Ok(process)
}
