//! Output formatters for run results.
//!
//! The default text report lives in [`crate::report`]; this module holds
//! the machine-readable JSON document.

pub mod json;

pub use json::{JsonOutput, JsonReport};
