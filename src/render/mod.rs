//! Rendering: a validated [`RenderPlan`] in, an encoded MP4 inside the job workspace out.

pub mod compose;
pub mod ffmpeg;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::assets::media::is_ffmpeg_on_path;
use crate::assets::text_raster::TextRasterizer;
use crate::config::OutlineMode;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::plan::{AssetRef, Placement, RenderPlan, SegmentKind};
use crate::workspace::Workspace;

/// Turns a plan into a video file inside the workspace.
pub trait Renderer: Send + Sync {
    /// Render `plan`. Failures are [`ReelError::Render`]; partial outputs stay in the workspace.
    fn render(&self, plan: &RenderPlan, ws: &mut Workspace) -> ReelResult<PathBuf>;
}

/// Renderer backed by the system `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct FfmpegRenderer {
    text: Arc<TextRasterizer>,
    outline: OutlineMode,
    char_width_factor: f32,
}

impl FfmpegRenderer {
    /// Renderer drawing captions with `text`.
    pub fn new(text: Arc<TextRasterizer>, outline: OutlineMode, char_width_factor: f32) -> Self {
        Self {
            text,
            outline,
            char_width_factor,
        }
    }

    fn rasterize_text(
        &self,
        plan: &RenderPlan,
        ws: &mut Workspace,
    ) -> ReelResult<BTreeMap<usize, PathBuf>> {
        let mut out = BTreeMap::new();
        for (i, seg) in plan.segments.iter().enumerate() {
            if seg.kind != SegmentKind::TextOverlay {
                continue;
            }
            let (AssetRef::Text(text), Some(style)) = (&seg.asset, &seg.style) else {
                return Err(ReelError::render(format!(
                    "text segment {i} needs text content and a style"
                )));
            };
            let width_fraction = match seg.placement {
                Placement::CaptionBox { width_fraction, .. } => width_fraction,
                _ => 1.0,
            };
            let box_width = ((f64::from(plan.canvas.width) * width_fraction).round() as u32).max(1);
            let dest = ws.alloc(&format!("caption_{i}.png"))?;
            self.text.render_caption(
                text,
                style,
                box_width,
                self.char_width_factor,
                self.outline,
                &dest,
            )?;
            out.insert(i, dest);
        }
        Ok(out)
    }
}

impl Renderer for FfmpegRenderer {
    #[tracing::instrument(skip_all, fields(job = %ws.job(), total = plan.total_duration))]
    fn render(&self, plan: &RenderPlan, ws: &mut Workspace) -> ReelResult<PathBuf> {
        plan.validate()
            .map_err(|e| ReelError::render(format!("refusing to render invalid plan: {e}")))?;
        if !is_ffmpeg_on_path() {
            return Err(ReelError::render(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let text_images = self.rasterize_text(plan, ws)?;
        let graph = compose::compile_graph(plan, &text_images)?;
        let out = ws.alloc("output.mp4")?;
        tracing::debug!(inputs = graph.inputs.len(), "running ffmpeg");
        ffmpeg::run_ffmpeg(&graph.to_args(&out))?;
        tracing::info!(out = %out.display(), "rendered");
        Ok(out)
    }
}
