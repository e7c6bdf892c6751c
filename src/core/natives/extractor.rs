// ─── Native Extraction ───
// Unpacks native archives into versions/<id>/<id>-natives once every native
// fetch has reached a terminal state. Archive-internal paths are preserved.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::NativeArchive;

/// Signing and manifest data never belongs in the natives directory.
const METADATA_DIR: &str = "META-INF/";

#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub files_written: usize,
    /// Archives that were not on disk. Not an error.
    pub missing: Vec<PathBuf>,
    pub failures: Vec<LauncherError>,
}

impl ExtractionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct NativeExtractor;

impl NativeExtractor {
    /// Extract every archive into `dest`. A failed archive is recorded and
    /// the remaining archives are still processed.
    pub async fn extract(archives: Vec<NativeArchive>, dest: PathBuf) -> LauncherResult<ExtractionReport> {
        tokio::task::spawn_blocking(move || Self::extract_blocking(&archives, &dest))
            .await
            .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?
    }

    pub fn extract_blocking(archives: &[NativeArchive], dest: &Path) -> LauncherResult<ExtractionReport> {
        std::fs::create_dir_all(dest).map_err(|e| LauncherError::io(dest, e))?;

        let mut report = ExtractionReport::default();
        for archive in archives {
            if !archive.path.exists() {
                warn!("Native archive not found, skipping: {:?}", archive.path);
                report.missing.push(archive.path.clone());
                continue;
            }

            match extract_archive(archive, dest) {
                Ok(written) => {
                    debug!("Extracted {} file(s) from {:?}", written, archive.path);
                    report.files_written += written;
                }
                Err(e) => {
                    warn!("Cannot extract native archive {:?}: {}", archive.path, e);
                    report.failures.push(LauncherError::ExtractionFailed {
                        archive: archive.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Natives: {} file(s) written to {:?}, {} failed archive(s)",
            report.files_written,
            dest,
            report.failures.len()
        );
        Ok(report)
    }
}

fn is_excluded(name: &str, excludes: &[String]) -> bool {
    name.starts_with(METADATA_DIR) || excludes.iter().any(|prefix| name.starts_with(prefix.as_str()))
}

fn extract_archive(archive: &NativeArchive, dest: &Path) -> LauncherResult<usize> {
    let file = File::open(&archive.path).map_err(|e| LauncherError::io(&archive.path, e))?;
    let mut zip = zip::ZipArchive::new(file)?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        if entry.is_dir() || is_excluded(entry.name(), &archive.exclude) {
            continue;
        }

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe entry {:?} in {:?}", entry.name(), archive.path);
            continue;
        };

        let out_path = dest.join(relative);
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let mut out = File::create(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&out_path, e))?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            match body {
                Some(body) => {
                    zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                    zip.write_all(body).unwrap();
                }
                None => zip.add_directory(*name, SimpleFileOptions::default()).unwrap(),
            }
        }
        zip.finish().unwrap();
    }

    fn archive(path: PathBuf) -> NativeArchive {
        NativeArchive {
            path,
            exclude: Vec::new(),
        }
    }

    #[test]
    fn writes_only_plain_file_entries() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("natives.jar");
        write_zip(
            &jar,
            &[
                ("lib.dll", Some(b"dll")),
                ("META-INF/MANIFEST.MF", Some(b"Manifest-Version: 1.0")),
                ("sub/", None),
            ],
        );
        let dest = dir.path().join("out");

        let report = NativeExtractor::extract_blocking(&[archive(jar)], &dest).unwrap();

        assert_eq!(report.files_written, 1);
        let names: Vec<_> = std::fs::read_dir(&dest)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["lib.dll"]);
        assert_eq!(std::fs::read(dest.join("lib.dll")).unwrap(), b"dll");
    }

    #[test]
    fn library_excludes_and_nested_paths() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("natives.jar");
        write_zip(
            &jar,
            &[
                ("linux/x64/liblwjgl.so", Some(b"so")),
                ("docs/readme.txt", Some(b"txt")),
            ],
        );
        let dest = dir.path().join("out");
        let natives = NativeArchive {
            path: jar,
            exclude: vec!["docs/".to_string()],
        };

        let report = NativeExtractor::extract_blocking(&[natives], &dest).unwrap();

        assert_eq!(report.files_written, 1);
        assert!(dest.join("linux/x64/liblwjgl.so").exists());
        assert!(!dest.join("docs").exists());
    }

    #[tokio::test]
    async fn missing_and_corrupt_archives_do_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let corrupt = dir.path().join("corrupt.jar");
        std::fs::write(&corrupt, b"not a zip").unwrap();
        let good = dir.path().join("good.jar");
        write_zip(&good, &[("libglfw.dylib", Some(b"dylib"))]);
        let missing = dir.path().join("missing.jar");
        let dest = dir.path().join("out");

        let report = NativeExtractor::extract(
            vec![archive(missing.clone()), archive(corrupt.clone()), archive(good)],
            dest.clone(),
        )
        .await
        .unwrap();

        assert_eq!(report.files_written, 1);
        assert_eq!(report.missing, vec![missing]);
        assert!(matches!(
            &report.failures[..],
            [LauncherError::ExtractionFailed { archive, .. }] if *archive == corrupt
        ));
        assert!(dest.join("libglfw.dylib").exists());
    }

    #[test]
    fn corrupt_archive_reason_is_the_zip_error() {
        let dir = tempfile::tempdir().unwrap();
        let corrupt = dir.path().join("corrupt.jar");
        std::fs::write(&corrupt, b"PK but not really").unwrap();

        let err = extract_archive(&archive(corrupt), &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, LauncherError::Zip(_)));
    }
}
