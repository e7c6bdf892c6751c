pub mod installer;
pub mod layout;
pub mod planner;

pub use installer::{InstallReport, Installer, LocalVersion};
pub use layout::InstallLayout;
pub use planner::{InstallPlan, InstallationPlanner, NativeArchive};
