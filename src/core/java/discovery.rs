// ─── Java Discovery ───
// Finds java executables in the usual install locations and under
// JAVA_HOME, then asks each one for its version with `-version`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Directory levels searched below each root.
const MAX_SEARCH_DEPTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaInstallation {
    pub path: PathBuf,
    pub version: String,
    pub major: u32,
}

pub fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Common install locations for the current OS.
pub fn default_search_roots() -> Vec<PathBuf> {
    let roots: &[&str] = if cfg!(windows) {
        &[
            r"C:\Program Files\Java",
            r"C:\Program Files (x86)\Java",
            r"C:\Program Files\Eclipse Adoptium",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Library/Java/JavaVirtualMachines",
            "/usr/bin",
            "/usr/local/bin",
        ]
    } else {
        &["/usr/bin", "/usr/local/bin", "/usr/lib/jvm"]
    };
    roots.iter().map(PathBuf::from).collect()
}

pub fn java_home() -> Option<PathBuf> {
    std::env::var_os("JAVA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Java executables below `roots`, then `<java_home>/bin/java`.
///
/// Results keep discovery order. A file reached through two paths (a
/// `/usr/bin/java` symlink and its JDK target, say) is listed once.
pub fn find_java_binaries(roots: &[PathBuf], java_home: Option<&Path>) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for root in roots {
        collect_binaries(root, MAX_SEARCH_DEPTH, &mut found);
    }
    if let Some(home) = java_home {
        let candidate = home.join("bin").join(java_exe());
        if candidate.is_file() {
            found.push(candidate);
        }
    }

    let mut seen = HashSet::new();
    found.retain(|path| seen.insert(std::fs::canonicalize(path).unwrap_or_else(|_| path.clone())));
    found
}

fn collect_binaries(dir: &Path, depth: usize, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();

        // Symlinked directories are not followed.
        if file_type.is_dir() {
            if depth > 0 {
                collect_binaries(&path, depth - 1, found);
            }
        } else if entry.file_name().to_str() == Some(java_exe()) && path.is_file() {
            found.push(path);
        }
    }
}

/// Run `<path> -version`. `None` when it cannot run, exits non-zero or
/// prints no quoted version.
pub async fn probe_java(path: &Path) -> Option<JavaInstallation> {
    let output = match tokio::process::Command::new(path)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            debug!("Cannot run {:?}: {}", path, e);
            return None;
        }
    };

    if !output.status.success() {
        debug!("{:?} -version exited with {}", path, output.status);
        return None;
    }

    // Version banners go to stderr.
    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    let version = parse_version_string(&text)?;

    Some(JavaInstallation {
        path: path.to_path_buf(),
        major: parse_major_version(&version),
        version,
    })
}

/// Probe every candidate found below `roots` and `java_home`.
pub async fn detect_in(roots: &[PathBuf], java_home: Option<&Path>) -> Vec<JavaInstallation> {
    let mut installations = Vec::new();
    for path in find_java_binaries(roots, java_home) {
        match probe_java(&path).await {
            Some(java) => {
                debug!("Java {} at {:?}", java.version, java.path);
                installations.push(java);
            }
            None => warn!("Ignoring {:?}: no usable -version output", path),
        }
    }
    installations
}

pub async fn detect_java_installations() -> Vec<JavaInstallation> {
    let home = java_home();
    let installations = detect_in(&default_search_roots(), home.as_deref()).await;
    info!("Found {} Java installation(s)", installations.len());
    installations
}

/// First installation at or above `required_major`, else the first found.
pub fn select_java(
    installations: &[JavaInstallation],
    required_major: Option<u32>,
) -> Option<&JavaInstallation> {
    let compatible = installations
        .iter()
        .find(|java| required_major.map_or(true, |required| java.major >= required));

    compatible.or_else(|| {
        let first = installations.first()?;
        warn!(
            "No Java {}+ found, falling back to Java {} at {:?}",
            required_major.unwrap_or_default(),
            first.major,
            first.path
        );
        Some(first)
    })
}

/// Detect installed runtimes and pick one for a version needing
/// `required_major`.
pub async fn resolve_java(required_major: Option<u32>) -> LauncherResult<PathBuf> {
    let installations = detect_java_installations().await;
    select_java(&installations, required_major)
        .map(|java| java.path.clone())
        .ok_or(LauncherError::JavaNotFound(required_major))
}

fn parse_version_string(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let start = line.find('"')?;
        let end = line[start + 1..].find('"')?;
        Some(line[start + 1..start + 1 + end].to_string())
    })
}

/// `17.0.8` is 17, legacy `1.8.0_392` is 8.
fn parse_major_version(version: &str) -> u32 {
    let mut parts = version.split(|c: char| c == '.' || c == '_' || c == '-' || c == '+');
    let first: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);

    if first == 1 {
        parts.next().and_then(|p| p.parse().ok()).unwrap_or(first)
    } else {
        first
    }
}
