// ─── mcinstall Core ───
// Concurrent installer for versioned Minecraft client distributions.
//
// Architecture:
//   core/
//     version/      Mirrors, version manifest, typed descriptors, resolver
//     downloader/   Transport, retrying fetcher, bounded scheduler, progress
//     install/      Install tree layout, planner, install orchestration
//     assets/       Asset index + content-addressed object tasks
//     natives/      Native archive extraction
//     auth/         Credential providers
//     java/         Java runtime discovery
//     launch/       Command builder + process hand-off

pub mod assets;
pub mod auth;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod java;
pub mod launch;
pub mod natives;
pub mod platform;
pub mod version;
