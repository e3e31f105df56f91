//! Dialogue timeline: each line is visible for exactly the length of its speech.

use std::path::PathBuf;

use crate::foundation::core::TimeSpan;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::plan::{
    AssetRef, HAlign, OverlaySlot, Placement, PlanSettings, RenderPlan, RenderSegment,
    SegmentKind, VAlign, parse_anchor,
};

/// One resolved dialogue line.
#[derive(Clone, Debug, PartialEq)]
pub struct DialogueClip {
    /// Caption text.
    pub text: String,
    /// Speaker art inside the workspace.
    pub art: PathBuf,
    /// Raw placement hint from the job.
    pub placement: Option<String>,
    /// Measured speech duration in seconds.
    pub duration: f64,
}

/// Lay out `clips` back to back over a full-length background.
///
/// Line `i` starts at the sum of durations `0..i` and contributes an art overlay and a caption
/// sharing that interval. The background lasts the sum of all durations.
#[tracing::instrument(skip_all, fields(lines = clips.len()))]
pub fn build_dialogue_plan(
    clips: &[DialogueClip],
    background: PathBuf,
    audio: Option<PathBuf>,
    settings: &PlanSettings,
) -> ReelResult<RenderPlan> {
    if clips.is_empty() {
        return Err(ReelError::validation("dialogue has no lines"));
    }

    let mut overlays = Vec::with_capacity(clips.len() * 2);
    let mut current_time = 0.0f64;
    for (i, clip) in clips.iter().enumerate() {
        if !clip.duration.is_finite() || clip.duration < 0.0 {
            return Err(ReelError::validation(format!(
                "line {i} has invalid speech duration {}",
                clip.duration
            )));
        }
        let span = TimeSpan::new(current_time, clip.duration)?;
        let (h, v) = anchor_for(i, clip.placement.as_deref());

        overlays.push(RenderSegment {
            kind: SegmentKind::ImageOverlay,
            slot: OverlaySlot::Art,
            asset: AssetRef::File(clip.art.clone()),
            span,
            placement: Placement::Anchored {
                h,
                v,
                width: None,
                height: Some(settings.art_height),
                margin: 0,
            },
            style: None,
        });
        overlays.push(settings.caption_segment(
            clip.text.clone(),
            span,
            settings.dialogue_caption_width,
            settings.dialogue_caption_center_y,
        ));
        current_time += clip.duration;
    }

    let mut segments = Vec::with_capacity(overlays.len() + 1);
    segments.push(settings.background_segment(background, current_time)?);
    segments.extend(overlays);

    let plan = RenderPlan {
        canvas: settings.canvas,
        fps: settings.fps,
        total_duration: current_time,
        segments,
        audio,
    };
    plan.validate()?;
    tracing::debug!(total = plan.total_duration, "dialogue plan built");
    Ok(plan)
}

fn anchor_for(line: usize, hint: Option<&str>) -> (HAlign, VAlign) {
    let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) else {
        return (HAlign::Center, VAlign::Center);
    };
    parse_anchor(hint).unwrap_or_else(|| {
        tracing::warn!(line, hint, "unknown placement hint, centering");
        (HAlign::Center, VAlign::Center)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/dialogue.rs"]
mod tests;
