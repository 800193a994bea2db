//! Trellis - cacheable widgets and delegating form builders
//!
//! Widgets declare which inputs identify their rendered output and render
//! through a pluggable fragment cache. Form helpers funnel through a proxy
//! that wraps any form-builder implementation and writes its markup straight
//! into the output buffer.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod value;
pub mod widget;

pub use error::{TrellisError, TrellisResult};
pub use value::Value;
