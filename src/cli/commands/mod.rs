//! CLI command implementations

pub mod cache;
pub mod config;
pub mod key;

pub use cache::execute as cache;
pub use config::execute as config;
pub use key::execute as key;
