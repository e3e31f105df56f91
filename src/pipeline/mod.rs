//! Job orchestration: resolve assets, build the timeline, render, publish.

/// `Pipeline::execute` and its builder.
pub mod executor;

pub use executor::{Pipeline, PipelineBuilder};
