pub mod discovery;

pub use discovery::{
    detect_java_installations, find_java_binaries, java_exe, probe_java, resolve_java,
    select_java, JavaInstallation,
};
