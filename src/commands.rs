use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::core::auth::{CredentialProvider, OfflineCredentials, StaticCredentials};
use crate::core::config::{default_config_path, InstallerConfig};
use crate::core::error::LauncherResult;
use crate::core::install::Installer;
use crate::core::java;
use crate::core::launch::{self, LaunchOptions, ProcessExecutor};
use crate::core::platform::Platform;
use crate::core::version::{Mirror, VersionKind};

/// Resolution of the progress bar; the overall fraction is scaled to this.
const BAR_LENGTH: u64 = 1000;

#[derive(Parser)]
#[command(name = "mcinstall")]
#[command(about = "Install and launch Minecraft client versions", long_about = None)]
pub struct Cli {
    /// Config file (JSON). Defaults to the per-user data directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the game directory from the config
    #[arg(long, global = true)]
    game_dir: Option<PathBuf>,

    /// Download mirror: official or bmclapi
    #[arg(long, global = true)]
    mirror: Option<Mirror>,

    /// Install natives for another OS: windows, linux or osx
    #[arg(long, global = true)]
    platform: Option<Platform>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List versions published in the manifest
    Versions {
        /// release, snapshot, old_beta or old_alpha
        #[arg(long, default_value = "release")]
        kind: VersionKind,
    },
    /// Download a version into the game directory
    Install { id: String },
    /// Check whether a version is completely installed
    Verify { id: String },
    /// List version directories in the game directory
    Installed,
    /// List Java installations found on this machine
    Java,
    /// Launch an installed version
    Launch {
        id: String,
        /// Path to the java executable; detected when omitted
        #[arg(long)]
        java: Option<PathBuf>,
        /// Extra JVM flag, repeatable
        #[arg(long = "jvm-arg", allow_hyphen_values = true)]
        jvm_args: Vec<String>,
        #[arg(long, default_value = "Player")]
        username: String,
        #[arg(long, default_value_t = 1024)]
        memory_mb: u32,
        /// Access token from an online sign-in; offline when omitted
        #[arg(long, requires = "uuid")]
        access_token: Option<String>,
        #[arg(long)]
        uuid: Option<String>,
    },
}

impl Cli {
    fn load_config(&self) -> LauncherResult<InstallerConfig> {
        let path = self.config.clone().unwrap_or_else(default_config_path);
        let mut config = InstallerConfig::load(&path)?;

        if let Some(game_dir) = &self.game_dir {
            config.game_dir = game_dir.clone();
        }
        if let Some(mirror) = self.mirror {
            config.mirror = mirror;
        }
        if let Some(platform) = self.platform {
            config.platform = platform;
        }
        Ok(config)
    }
}

pub async fn dispatch(cli: Cli) -> LauncherResult<ExitCode> {
    let config = cli.load_config()?;
    let installer = Installer::new(config)?;

    match cli.command {
        Command::Versions { kind } => list_versions(&installer, kind).await,
        Command::Install { id } => install_version(&installer, &id).await,
        Command::Verify { id } => verify_version(&installer, &id),
        Command::Installed => list_installed(&installer),
        Command::Java => list_java().await,
        Command::Launch {
            id,
            java,
            jvm_args,
            username,
            memory_mb,
            access_token,
            uuid,
        } => {
            let credentials: Box<dyn CredentialProvider> = match (access_token, uuid) {
                (Some(token), Some(uuid)) => {
                    Box::new(StaticCredentials::new(&username, &uuid, &token)?)
                }
                _ => Box::new(OfflineCredentials::new(&username)),
            };
            let mut options = LaunchOptions::default()
                .with_max_memory_mb(memory_mb)
                .with_jvm_args(jvm_args);
            if let Some(java) = java {
                options = options.with_java(java);
            }
            launch_version(&installer, &id, credentials.as_ref(), &options).await
        }
    }
}

async fn list_versions(installer: &Installer, kind: VersionKind) -> LauncherResult<ExitCode> {
    for id in installer.resolver().list_versions(kind).await? {
        println!("{id}");
    }
    Ok(ExitCode::SUCCESS)
}

async fn install_version(installer: &Installer, id: &str) -> LauncherResult<ExitCode> {
    let bar = ProgressBar::new(BAR_LENGTH);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {percent}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let sink = bar.clone();
    let report = installer
        .install(id, move |p| {
            sink.set_position((p.overall * BAR_LENGTH as f64).round() as u64);
            sink.set_message(format!("{} {}/{}", p.phase.label(), p.completed, p.total));
        })
        .await;
    bar.finish_and_clear();
    let report = report?;

    println!(
        "{}: {} downloaded, {} reused, {} native file(s)",
        report.version_id,
        report.downloads.downloaded,
        report.downloads.reused,
        report.natives.files_written
    );

    if report.is_clean() {
        println!("{} is installed", report.version_id);
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!("Installation of {} is incomplete:", report.version_id);
    for problem in report.problems() {
        eprintln!("  - {problem}");
    }
    eprintln!("Run the install again to resume.");
    Ok(ExitCode::FAILURE)
}

fn verify_version(installer: &Installer, id: &str) -> LauncherResult<ExitCode> {
    match installer.verify(id) {
        Ok(descriptor) => {
            println!("{} ({}) is completely installed", descriptor.id, descriptor.kind);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn list_installed(installer: &Installer) -> LauncherResult<ExitCode> {
    for version in installer.installed_versions()? {
        let status = if version.complete { "complete" } else { "incomplete" };
        println!("{}\t{}", version.id, status);
    }
    Ok(ExitCode::SUCCESS)
}

async fn list_java() -> LauncherResult<ExitCode> {
    let installations = java::detect_java_installations().await;
    if installations.is_empty() {
        eprintln!("No Java installation found. Set JAVA_HOME or pass --java to launch.");
        return Ok(ExitCode::FAILURE);
    }
    for java in installations {
        println!("{}\t{}\t{}", java.major, java.version, java.path.display());
    }
    Ok(ExitCode::SUCCESS)
}

async fn launch_version(
    installer: &Installer,
    id: &str,
    credentials: &dyn CredentialProvider,
    options: &LaunchOptions,
) -> LauncherResult<ExitCode> {
    let process = launch::launch(
        installer.layout(),
        id,
        installer.config().platform,
        credentials,
        options,
        &ProcessExecutor,
    )
    .await?;

    info!("Started {} (pid {:?})", id, process.pid);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"mirror": "official", "asset_concurrency": 8}"#).unwrap();

        let cli = Cli::parse_from([
            "mcinstall",
            "--config",
            config_path.to_str().unwrap(),
            "--mirror",
            "bmclapi",
            "--game-dir",
            "/games/mc",
            "installed",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.mirror, Mirror::Bmclapi);
        assert_eq!(config.game_dir, PathBuf::from("/games/mc"));
        assert_eq!(config.asset_concurrency, 8);
    }

    #[test]
    fn launch_token_requires_a_uuid() {
        let parsed = Cli::try_parse_from([
            "mcinstall",
            "launch",
            "1.20.4",
            "--java",
            "java",
            "--access-token",
            "t",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn launch_detects_java_when_none_is_given() {
        let cli = Cli::parse_from([
            "mcinstall",
            "launch",
            "1.20.4",
            "--jvm-arg",
            "-XX:+UseZGC",
            "--jvm-arg=-Dlog4j2.formatMsgNoLookups=true",
        ]);
        match cli.command {
            Command::Launch { java, jvm_args, .. } => {
                assert_eq!(java, None);
                assert_eq!(jvm_args, vec!["-XX:+UseZGC", "-Dlog4j2.formatMsgNoLookups=true"]);
            }
            _ => panic!("expected the launch subcommand"),
        }
    }
}
