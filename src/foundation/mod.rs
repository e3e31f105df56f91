//! Error taxonomy and time/canvas primitives.

/// Frame rate, canvas and time-span primitives.
pub mod core;
/// Error taxonomy.
pub mod error;
