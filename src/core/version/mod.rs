pub mod descriptor;
pub mod manifest;
pub mod mirror;
pub mod resolver;

pub use descriptor::{
    AssetIndexRef, DownloadArtifact, LibraryArtifact, LibraryDownloads, LibraryEntry,
    LibraryRule, OsRule, RuleAction, VersionDescriptor, VersionDownloads,
};
pub use manifest::{VersionEntry, VersionKind, VersionManifest};
pub use mirror::{hash_shard, Mirror};
pub use resolver::{ManifestResolver, ResolvedVersion};
