// ─── Mirrors ───
// Download sources and re-rooting of upstream URLs onto the chosen mirror.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

const MANIFEST_PATH: &str = "/mc/game/version_manifest.json";

/// Hosts serving version metadata and client jars upstream.
const META_HOSTS: &[&str] = &[
    "launchermeta.mojang.com",
    "launcher.mojang.com",
    "piston-meta.mojang.com",
    "piston-data.mojang.com",
];
const LIBRARIES_HOST: &str = "libraries.minecraft.net";
const RESOURCES_HOST: &str = "resources.download.minecraft.net";

/// Two-character shard directory of a content hash, `None` unless the
/// hash is hex and long enough to have one.
pub fn hash_shard(hash: &str) -> Option<&str> {
    if hash.len() < 2 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    hash.get(..2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mirror {
    #[default]
    Official,
    Bmclapi,
}

impl Mirror {
    pub fn meta_root(self) -> &'static str {
        match self {
            Mirror::Official => "https://launchermeta.mojang.com",
            Mirror::Bmclapi => "https://bmclapi2.bangbang93.com",
        }
    }

    pub fn libraries_root(self) -> &'static str {
        match self {
            Mirror::Official => "https://libraries.minecraft.net",
            Mirror::Bmclapi => "https://bmclapi2.bangbang93.com/maven",
        }
    }

    /// Root under which asset objects live as `<root>/<hh>/<hash>`.
    pub fn resource_root(self) -> &'static str {
        match self {
            Mirror::Official => "https://resources.download.minecraft.net",
            Mirror::Bmclapi => "https://bmclapi2.bangbang93.com/assets",
        }
    }

    pub fn manifest_url(self) -> String {
        format!("{}{}", self.meta_root(), MANIFEST_PATH)
    }

    pub fn object_url(self, hash: &str) -> LauncherResult<String> {
        let shard = hash_shard(hash)
            .ok_or_else(|| LauncherError::malformed("asset object hash", format!("{hash:?}")))?;
        Ok(format!("{}/{}/{}", self.resource_root(), shard, hash))
    }

    /// Re-root an upstream URL onto this mirror, keeping path and query.
    ///
    /// URLs on hosts the mirror does not proxy are returned unchanged, and
    /// the official mirror is the identity.
    pub fn rebase(self, url: &str) -> String {
        if self == Mirror::Official {
            return url.to_string();
        }

        let Ok(parsed) = Url::parse(url) else {
            return url.to_string();
        };
        let Some(host) = parsed.host_str() else {
            return url.to_string();
        };

        let root = if META_HOSTS.contains(&host) {
            self.meta_root()
        } else if host == LIBRARIES_HOST {
            self.libraries_root()
        } else if host == RESOURCES_HOST {
            self.resource_root()
        } else {
            return url.to_string();
        };

        match parsed.query() {
            Some(query) => format!("{}{}?{}", root, parsed.path(), query),
            None => format!("{}{}", root, parsed.path()),
        }
    }
}

impl std::str::FromStr for Mirror {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "official" => Ok(Mirror::Official),
            "bmclapi" => Ok(Mirror::Bmclapi),
            other => Err(format!("unknown mirror '{other}'")),
        }
    }
}
