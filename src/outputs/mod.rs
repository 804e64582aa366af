//! Result output.
//!
//! - [`console`]: the human-readable per-article `Score / Topic` listing
//! - [`json`]: the whole run as a [`RunReport`](crate::models::RunReport) file

pub mod console;
pub mod json;
