use std::path::PathBuf;

/// A single file to download. Each task owns exactly one destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub url: String,
    pub dest: PathBuf,
    /// Declared byte size, checked after the body is written.
    pub size: Option<u64>,
    /// Declared SHA-1, checked while streaming when verification is on.
    pub sha1: Option<String>,
}

impl FetchTask {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            size: None,
            sha1: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }
}
