//! Timeline synthesis: measured durations in, validated render plans out.

pub mod chunk;
pub mod dialogue;
pub mod narration;
pub mod plan;
