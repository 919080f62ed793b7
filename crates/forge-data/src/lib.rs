pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, load_policy, load_policy_from_dir};
