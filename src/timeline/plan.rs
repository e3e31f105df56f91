//! Render plan: the layered, time-bounded description of one output video.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::foundation::core::{Canvas, Fps, TIME_EPSILON, TimeSpan};
use crate::foundation::error::{ReelError, ReelResult};
use crate::style::table::StyleSpec;

/// What a segment draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Full-frame background video.
    Background,
    /// Still image (character art or post card).
    ImageOverlay,
    /// Burned-in text.
    TextOverlay,
}

/// Layer a segment occupies. Segments sharing a slot never overlap in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlaySlot {
    /// Background video layer.
    Background,
    /// Speaker art.
    Art,
    /// Post card.
    Card,
    /// Captions and subtitles.
    Caption,
}

/// Source of a segment's pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetRef {
    /// Local file inside the job workspace.
    File(PathBuf),
    /// Text rasterized by the renderer.
    Text(String),
}

/// Horizontal anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    /// Left edge.
    Left,
    /// Centered.
    Center,
    /// Right edge.
    Right,
}

/// Vertical anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VAlign {
    /// Top edge.
    Top,
    /// Centered.
    Center,
    /// Bottom edge.
    Bottom,
}

/// Where and how large a segment is drawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Placement {
    /// Cover the whole frame (scaled and cropped).
    Fill,
    /// Anchored to a frame edge or center, optionally scaled to a width or height.
    Anchored {
        /// Horizontal anchor.
        h: HAlign,
        /// Vertical anchor.
        v: VAlign,
        /// Target width in pixels, aspect preserved.
        width: Option<u32>,
        /// Target height in pixels, aspect preserved.
        height: Option<u32>,
        /// Distance from the anchored edge(s).
        margin: u32,
    },
    /// Text box horizontally centered, `width_fraction` of the frame wide.
    CaptionBox {
        /// Box width as a fraction of the frame width.
        width_fraction: f64,
        /// Vertical center as a fraction of the frame height.
        center_y_fraction: f64,
    },
}

/// Parse a placement hint such as `center`, `left`, `top-right` or `bottom_left`.
///
/// Returns `None` for hints with unknown words or conflicting anchors.
pub fn parse_anchor(hint: &str) -> Option<(HAlign, VAlign)> {
    let mut h = None;
    let mut v = None;
    let mut centers = 0;
    for token in hint
        .split(['-', '_', ' '])
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        match token.to_ascii_lowercase().as_str() {
            "left" if h.is_none() => h = Some(HAlign::Left),
            "right" if h.is_none() => h = Some(HAlign::Right),
            "top" if v.is_none() => v = Some(VAlign::Top),
            "bottom" if v.is_none() => v = Some(VAlign::Bottom),
            "center" | "centre" | "middle" => centers += 1,
            _ => return None,
        }
    }
    let given = usize::from(h.is_some()) + usize::from(v.is_some()) + centers;
    if given == 0 || given > 2 {
        return None;
    }
    Some((h.unwrap_or(HAlign::Center), v.unwrap_or(VAlign::Center)))
}

/// One time-bounded layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderSegment {
    /// What is drawn.
    pub kind: SegmentKind,
    /// Layer slot.
    pub slot: OverlaySlot,
    /// Pixel source.
    pub asset: AssetRef,
    /// When it is visible.
    pub span: TimeSpan,
    /// Where it is drawn.
    pub placement: Placement,
    /// Text style; set for text overlays only.
    pub style: Option<StyleSpec>,
}

/// Complete description of one output video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderPlan {
    /// Output frame size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Video length in seconds.
    pub total_duration: f64,
    /// Layers, background first, then in input order.
    pub segments: Vec<RenderSegment>,
    /// Narration track muxed into the output.
    pub audio: Option<PathBuf>,
}

impl RenderPlan {
    /// The background segment, if any.
    pub fn background(&self) -> Option<&RenderSegment> {
        self.segments
            .iter()
            .find(|s| s.kind == SegmentKind::Background)
    }

    /// Segments occupying `slot`, in plan order.
    pub fn in_slot(&self, slot: OverlaySlot) -> impl Iterator<Item = &RenderSegment> {
        self.segments.iter().filter(move |s| s.slot == slot)
    }

    /// Check the structural invariants of a plan.
    pub fn validate(&self) -> ReelResult<()> {
        let total = self.total_duration;
        if !total.is_finite() || total <= TIME_EPSILON {
            return Err(ReelError::validation(format!(
                "total duration must be finite and > 0 (got {total})"
            )));
        }
        self.canvas.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;

        let backgrounds: Vec<_> = self
            .segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Background)
            .collect();
        let [bg] = backgrounds.as_slice() else {
            return Err(ReelError::validation(format!(
                "plan must have exactly one background segment (found {})",
                backgrounds.len()
            )));
        };
        if bg.span.start.abs() > TIME_EPSILON || (bg.span.end() - total).abs() > TIME_EPSILON {
            return Err(ReelError::validation(format!(
                "background spans [{}, {}) but the video lasts {total}s",
                bg.span.start,
                bg.span.end()
            )));
        }

        for (i, seg) in self.segments.iter().enumerate() {
            if !seg.span.within(total) {
                return Err(ReelError::validation(format!(
                    "segment {i} [{}, {}) lies outside [0, {total}]",
                    seg.span.start,
                    seg.span.end()
                )));
            }
            if seg.kind == SegmentKind::TextOverlay && seg.style.is_none() {
                return Err(ReelError::validation(format!("text segment {i} has no style")));
            }
        }

        for slot in [OverlaySlot::Art, OverlaySlot::Card, OverlaySlot::Caption] {
            let spans: Vec<TimeSpan> = self.in_slot(slot).map(|s| s.span).collect();
            for (i, a) in spans.iter().enumerate() {
                if let Some(b) = spans[i + 1..].iter().find(|b| a.overlaps(**b)) {
                    return Err(ReelError::validation(format!(
                        "{slot:?} segments overlap: [{}, {}) and [{}, {})",
                        a.start,
                        a.end(),
                        b.start,
                        b.end()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Per-job layout inputs shared by both plan builders.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanSettings {
    /// Output frame size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Text style after per-job scaling.
    pub style: StyleSpec,
    /// Dialogue caption width fraction.
    pub dialogue_caption_width: f64,
    /// Dialogue caption vertical center.
    pub dialogue_caption_center_y: f64,
    /// Narration subtitle width fraction.
    pub narration_caption_width: f64,
    /// Narration subtitle vertical center.
    pub narration_caption_center_y: f64,
    /// Character art height.
    pub art_height: u32,
    /// Post card display width.
    pub card_width: u32,
    /// Gap above the post card.
    pub card_top_margin: u32,
}

impl PlanSettings {
    /// Settings from the pipeline configuration and the job's derived style.
    pub fn from_config(cfg: &PipelineConfig, style: StyleSpec) -> Self {
        Self {
            canvas: cfg.canvas,
            fps: cfg.fps,
            style,
            dialogue_caption_width: cfg.caption.dialogue_width,
            dialogue_caption_center_y: cfg.caption.dialogue_center_y,
            narration_caption_width: cfg.caption.narration_width,
            narration_caption_center_y: cfg.caption.narration_center_y,
            art_height: cfg.caption.art_height,
            card_width: cfg.post_card.display_width,
            card_top_margin: cfg.post_card.top_margin,
        }
    }

    pub(crate) fn background_segment(&self, video: PathBuf, total: f64) -> ReelResult<RenderSegment> {
        Ok(RenderSegment {
            kind: SegmentKind::Background,
            slot: OverlaySlot::Background,
            asset: AssetRef::File(video),
            span: TimeSpan::new(0.0, total)?,
            placement: Placement::Fill,
            style: None,
        })
    }

    pub(crate) fn caption_segment(
        &self,
        text: String,
        span: TimeSpan,
        width_fraction: f64,
        center_y_fraction: f64,
    ) -> RenderSegment {
        RenderSegment {
            kind: SegmentKind::TextOverlay,
            slot: OverlaySlot::Caption,
            asset: AssetRef::Text(text),
            span,
            placement: Placement::CaptionBox {
                width_fraction,
                center_y_fraction,
            },
            style: Some(self.style.clone()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/plan.rs"]
mod tests;
