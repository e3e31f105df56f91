//! Narration track assembly.

pub mod narration;
