//! reelsmith turns scripted dialogue and narrated social posts into short vertical videos.
//!
//! A job flows through fixed stages, each behind its own module:
//!
//! - [`assets`] resolves inputs (speech, background, character art, post card) into a
//!   per-job [`workspace::Workspace`]
//! - [`timeline`] turns measured durations into a validated [`timeline::plan::RenderPlan`]
//! - [`render`] encodes the plan to MP4 with ffmpeg
//! - the finished video is published through a [`capability::ObjectStore`]
//!
//! [`pipeline::Pipeline`] runs one job end to end; [`job::queue::WorkerPool`] runs many.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod assets;
pub mod audio;
pub mod capability;
pub mod config;
pub mod foundation;
pub mod job;
pub mod pipeline;
pub mod render;
pub mod style;
pub mod timeline;
pub mod workspace;

pub use crate::config::{JobOptions, OutlineMode, PipelineConfig};
pub use crate::foundation::core::{Canvas, Fps, TimeSpan};
pub use crate::foundation::error::{ErrorClass, ReelError, ReelResult};
pub use crate::job::model::{
    DialogueLine, JobContent, JobId, JobKind, JobOutput, JobRecord, JobStatus, NarratedPost,
};
pub use crate::job::progress::{ProgressReporter, ProgressSink};
pub use crate::job::queue::{JobRunner, WorkerPool};
pub use crate::job::store::JobStore;
pub use crate::pipeline::{Pipeline, PipelineBuilder};
pub use crate::render::{FfmpegRenderer, Renderer};
pub use crate::style::table::{StyleSpec, StyleTable};
pub use crate::timeline::plan::RenderPlan;
pub use crate::workspace::{Workspace, WorkspaceManager};
