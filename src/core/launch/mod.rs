pub mod command;
pub mod process;

pub use command::{LaunchCommand, LaunchOptions};
pub use process::{launch, LaunchExecutor, LaunchedProcess, ProcessExecutor};
