//! ClearCut Core - Foundation types for accessible video editing
//!
//! This crate provides the types shared by every ClearCut crate:
//! - Time helpers (tolerance-aware comparison, TimeRange, timestamps)
//! - The workspace-wide error type

pub mod error;
pub mod time;

pub use error::{ClearCutError, Result};
pub use time::{approx_eq, format_timestamp, TimeRange, TIME_EPSILON};
