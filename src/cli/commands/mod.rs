//! CLI command implementations

pub mod completions;
pub mod config;
pub mod delete;
pub mod get;
pub mod list;
pub mod login;
pub mod set;
pub mod status;
pub mod versions;

pub use completions::execute as completions;
pub use config::execute as config;
pub use delete::{delete, destroy, undelete};
pub use get::execute as get;
pub use list::{execute as list, mount_version};
pub use login::execute as login;
pub use set::execute as set;
pub use status::execute as status;
pub use versions::execute as versions;
