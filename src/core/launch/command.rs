use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;

use crate::core::auth::AccessCredentials;
use crate::core::error::LauncherResult;
use crate::core::install::InstallLayout;
use crate::core::java::java_exe;
use crate::core::platform::Platform;
use crate::core::version::VersionDescriptor;

const DEFAULT_MAX_MEMORY_MB: u32 = 1024;

/// G1 tuning applied to every launch.
const GC_ARGS: &[&str] = &[
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:+UseG1GC",
    "-XX:G1NewSizePercent=20",
    "-XX:G1ReservePercent=20",
    "-XX:MaxGCPauseMillis=50",
    "-XX:G1HeapRegionSize=32M",
];

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Java executable; detected at launch time when unset.
    pub java: Option<PathBuf>,
    pub max_memory_mb: u32,
    pub extra_jvm_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            java: None,
            max_memory_mb: DEFAULT_MAX_MEMORY_MB,
            extra_jvm_args: Vec::new(),
        }
    }
}

impl LaunchOptions {
    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = Some(java.into());
        self
    }

    pub fn with_max_memory_mb(mut self, mb: u32) -> Self {
        self.max_memory_mb = mb;
        self
    }

    /// Extra JVM flags, placed after the built-in ones and before `-cp`.
    pub fn with_jvm_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_jvm_args.extend(args);
        self
    }
}

/// A fully resolved command line for one installed version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl LaunchCommand {
    pub fn build(
        layout: &InstallLayout,
        descriptor: &VersionDescriptor,
        platform: Platform,
        credentials: &AccessCredentials,
        options: &LaunchOptions,
    ) -> LauncherResult<Self> {
        let id = &descriptor.id;
        let mut args = Vec::new();

        // ── JVM Arguments ──
        args.push(format!("-Xmx{}M", options.max_memory_mb));
        args.extend(GC_ARGS.iter().map(|a| a.to_string()));
        args.push(format!(
            "-Djava.library.path={}",
            layout.natives_dir(id).display()
        ));
        args.extend(options.extra_jvm_args.iter().cloned());

        args.push("-cp".into());
        args.push(classpath(layout, descriptor, platform)?);
        args.push(descriptor.main_class.clone());

        // ── Game Arguments ──
        let game_args = [
            ("--username", credentials.username.clone()),
            ("--version", id.clone()),
            ("--gameDir", layout.root().display().to_string()),
            ("--assetsDir", layout.assets_dir(id).display().to_string()),
            ("--assetIndex", descriptor.asset_index.id.clone()),
            ("--uuid", credentials.uuid.clone()),
            ("--accessToken", credentials.access_token.clone()),
            ("--userType", credentials.user_type.clone()),
            ("--versionType", descriptor.kind.to_string()),
        ];
        for (flag, value) in game_args {
            args.push(flag.to_string());
            args.push(value);
        }

        Ok(Self {
            program: options
                .java
                .clone()
                .unwrap_or_else(|| PathBuf::from(java_exe())),
            args,
            working_dir: layout.root().to_path_buf(),
        })
    }

    /// Command line for logs, with the access token masked.
    pub fn redacted(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                parts.push("********".into());
            } else {
                parts.push(arg.clone());
            }
            mask_next = arg == "--accessToken";
        }
        parts.join(" ")
    }
}

/// Rule-allowed library artifacts in descriptor order, then the client jar.
fn classpath(
    layout: &InstallLayout,
    descriptor: &VersionDescriptor,
    platform: Platform,
) -> LauncherResult<String> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for lib in descriptor.libraries_for(platform) {
        if let Some(artifact) = lib.artifact() {
            let path = layout.library_path(&artifact.path)?;
            if seen.insert(path.clone()) {
                entries.push(path.display().to_string());
            }
        }
    }
    entries.push(layout.client_jar_path(&descriptor.id).display().to_string());

    debug!("Classpath has {} entries", entries.len());
    Ok(entries.join(platform.classpath_separator()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> VersionDescriptor {
        VersionDescriptor::parse(
            &serde_json::json!({
                "id": "1.20.4",
                "type": "release",
                "mainClass": "net.minecraft.client.main.Main",
                "assetIndex": {"id": "12", "url": "https://x/12.json"},
                "downloads": {"client": {"url": "https://x/client.jar", "sha1": "cc", "size": 1}},
                "libraries": [
                    {"name": "a:a:1", "downloads": {"artifact": {"path": "a/a-1.jar", "url": "https://x/a"}}},
                    {"name": "b:b:1", "downloads": {"artifact": {"path": "b/b-1.jar", "url": "https://x/b"}},
                     "rules": [{"action": "allow", "os": {"name": "osx"}}]},
                    {"name": "a:a:1", "downloads": {"artifact": {"path": "a/a-1.jar", "url": "https://x/a"}}},
                    {"name": "n:n:1", "downloads": {"classifiers": {"natives-linux": {"path": "n/n.jar", "url": "https://x/n"}}}}
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    fn credentials() -> AccessCredentials {
        AccessCredentials {
            username: "Steve".into(),
            uuid: "0123".into(),
            access_token: "secret".into(),
            user_type: "legacy".into(),
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let at = args.iter().position(|a| a == flag).unwrap();
        &args[at + 1]
    }

    #[test]
    fn builds_jvm_classpath_and_game_arguments() {
        let layout = InstallLayout::new("/mc");
        let options = LaunchOptions::default()
            .with_java("/usr/bin/java")
            .with_max_memory_mb(2048)
            .with_jvm_args(["-Dfml.ignoreInvalidMinecraftCertificates=true".to_string()]);

        let cmd =
            LaunchCommand::build(&layout, &descriptor(), Platform::Linux, &credentials(), &options)
                .unwrap();

        assert_eq!(cmd.program, PathBuf::from("/usr/bin/java"));
        assert_eq!(cmd.args[0], "-Xmx2048M");
        assert!(cmd
            .args
            .contains(&"-Djava.library.path=/mc/versions/1.20.4/1.20.4-natives".to_string()));
        let extra = cmd
            .args
            .iter()
            .position(|a| a == "-Dfml.ignoreInvalidMinecraftCertificates=true")
            .unwrap();
        assert!(extra < cmd.args.iter().position(|a| a == "-cp").unwrap());
        assert_eq!(
            value_after(&cmd.args, "-cp"),
            "/mc/libraries/a/a-1.jar:/mc/versions/1.20.4/1.20.4.jar"
        );

        let main = cmd.args.iter().position(|a| a == "net.minecraft.client.main.Main").unwrap();
        assert_eq!(cmd.args[main + 1], "--username");
        assert_eq!(value_after(&cmd.args, "--assetsDir"), "/mc/versions/1.20.4/assets");
        assert_eq!(value_after(&cmd.args, "--assetIndex"), "12");
        assert_eq!(value_after(&cmd.args, "--versionType"), "release");
        assert_eq!(value_after(&cmd.args, "--accessToken"), "secret");
    }

    #[test]
    fn redacted_form_hides_the_token() {
        let cmd = LaunchCommand::build(
            &InstallLayout::new("/mc"),
            &descriptor(),
            Platform::Osx,
            &credentials(),
            &LaunchOptions::default(),
        )
        .unwrap();

        assert_eq!(cmd.program, PathBuf::from(java_exe()));
        let shown = cmd.redacted();
        assert!(!shown.contains("secret"));
        assert!(shown.contains("--accessToken ********"));
        assert!(shown.contains("/mc/libraries/b/b-1.jar"));
    }
}
