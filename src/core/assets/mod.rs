pub mod asset_index;
pub mod expander;

pub use asset_index::{plan_objects, AssetIndex, AssetObject};
pub use expander::AssetIndexExpander;
