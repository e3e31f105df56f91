//! Subtitle style table.
//!
//! The table is built once per process and shared read-only across jobs.

/// Named and hex colors.
pub mod color;
/// Style specs and the style table.
pub mod table;
