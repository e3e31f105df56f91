//! Narrated-post timeline and subtitle timing.
//!
//! Two timing policies exist. Word alignment is preferred: subtitle cues come from recognizer
//! timestamps. Proportional split is the fallback when no aligner is available: each chunk gets a
//! share of the body audio proportional to its character count.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::capability::WordTiming;
use crate::foundation::core::TimeSpan;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::chunk::{spoken_words, word_count};
use crate::timeline::plan::{
    AssetRef, HAlign, OverlaySlot, Placement, PlanSettings, RenderPlan, RenderSegment,
    SegmentKind, VAlign,
};

/// Subtitle timing policy for a narrated post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationSync {
    /// Character-count proportional split of the body audio.
    Proportional,
    /// Word-level timestamps from a speech aligner.
    WordAligned,
}

impl NarrationSync {
    /// `WordAligned` when an aligner is available and there is body text to subtitle.
    pub fn select(aligner_available: bool, body: Option<&str>) -> Self {
        let has_body = body.is_some_and(|b| !b.trim().is_empty());
        if aligner_available && has_body {
            Self::WordAligned
        } else {
            Self::Proportional
        }
    }
}

/// One subtitle, timed relative to the start of the body narration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Displayed text.
    pub text: String,
    /// Relative span.
    pub span: TimeSpan,
}

/// Lay `chunks` end to end over `body_duration` seconds, weighted by character count.
///
/// The final cue ends exactly at `body_duration`, absorbing any rounding remainder.
pub fn proportional_cues(chunks: &[String], body_duration: f64) -> ReelResult<Vec<Cue>> {
    if !body_duration.is_finite() || body_duration < 0.0 {
        return Err(ReelError::validation(format!(
            "body duration must be finite and >= 0 (got {body_duration})"
        )));
    }
    let fallback = [" ".to_owned()];
    let chunks = if chunks.is_empty() { &fallback[..] } else { chunks };
    let lens: Vec<usize> = chunks.iter().map(|c| c.chars().count().max(1)).collect();
    let total_chars: usize = lens.iter().sum();

    let mut cues = Vec::with_capacity(chunks.len());
    let mut start = 0.0f64;
    let mut cum = 0usize;
    for (i, (chunk, len)) in chunks.iter().zip(&lens).enumerate() {
        cum += len;
        let end = if i + 1 == chunks.len() {
            body_duration
        } else {
            body_duration * (cum as f64 / total_chars as f64)
        };
        cues.push(Cue {
            text: chunk.clone(),
            span: TimeSpan::new(start, (end - start).max(0.0))?,
        });
        start = end;
    }
    Ok(cues)
}

/// Result of word-timestamp alignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignedNarration {
    /// End of the last title word; the body starts here.
    pub title_duration: f64,
    /// Body subtitles, relative to the body start.
    pub cues: Vec<Cue>,
}

/// Split aligned words into title and body, then group body words into cues of `group_size`.
///
/// The recognizer must return exactly one timing per spoken word of `title` and `body`;
/// punctuation-only tokens such as `-` are not timed and ride along with a neighbouring word.
/// Any other count fails with [`ReelError::Alignment`] rather than guessing. Cue text uses
/// the source words. Cue offsets never precede zero and never decrease.
pub fn aligned_cues(
    title: &str,
    body: &str,
    words: &[WordTiming],
    group_size: usize,
) -> ReelResult<AlignedNarration> {
    if group_size == 0 {
        return Err(ReelError::validation("word group size must be >= 1"));
    }
    let title_words = word_count(title);
    let body_words = spoken_words(body);
    let expected = title_words + body_words.len();
    if words.len() != expected {
        return Err(ReelError::alignment(format!(
            "aligner returned {} words but the narration has {expected} ({title_words} title + {} body)",
            words.len(),
            body_words.len()
        )));
    }
    if let Some(w) = words
        .iter()
        .find(|w| !w.start.is_finite() || !w.end.is_finite())
    {
        return Err(ReelError::alignment(format!(
            "non-finite timestamp for word '{}'",
            w.word
        )));
    }

    let title_duration = title_words
        .checked_sub(1)
        .map(|last| words[last].end.max(0.0))
        .unwrap_or(0.0);

    let body_timings = &words[title_words..];
    let mut cues = Vec::with_capacity(body_words.len().div_ceil(group_size));
    let mut prev_end = 0.0f64;
    for (timings, text) in body_timings
        .chunks(group_size)
        .zip(body_words.chunks(group_size))
    {
        let (Some(first), Some(last)) = (timings.first(), timings.last()) else {
            continue;
        };
        let start = (first.start - title_duration).max(0.0).max(prev_end);
        let end = (last.end - title_duration).max(start);
        cues.push(Cue {
            text: text.join(" "),
            span: TimeSpan::from_bounds(start, end)?,
        });
        prev_end = end;
    }
    Ok(AlignedNarration {
        title_duration,
        cues,
    })
}

/// Resolved inputs of a narrated-post plan.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationLayout {
    /// Post card image.
    pub card: PathBuf,
    /// Background video.
    pub background: PathBuf,
    /// Narration track.
    pub audio: Option<PathBuf>,
    /// Full narration length.
    pub total_duration: f64,
    /// Title portion length (card visibility).
    pub title_duration: f64,
    /// Body subtitles relative to the body start.
    pub cues: Vec<Cue>,
}

/// Build the plan: card over the title portion, subtitles over the body, background throughout.
#[tracing::instrument(skip_all, fields(cues = layout.cues.len()))]
pub fn build_narration_plan(layout: NarrationLayout, settings: &PlanSettings) -> ReelResult<RenderPlan> {
    let total = layout.total_duration;
    if !total.is_finite() || total <= 0.0 {
        return Err(ReelError::validation(format!(
            "narration duration must be finite and > 0 (got {total})"
        )));
    }
    let title_end = layout.title_duration.clamp(0.0, total);

    let mut segments = vec![settings.background_segment(layout.background, total)?];
    segments.push(RenderSegment {
        kind: SegmentKind::ImageOverlay,
        slot: OverlaySlot::Card,
        asset: AssetRef::File(layout.card),
        span: TimeSpan::new(0.0, title_end)?,
        placement: Placement::Anchored {
            h: HAlign::Center,
            v: VAlign::Top,
            width: Some(settings.card_width),
            height: None,
            margin: settings.card_top_margin,
        },
        style: None,
    });

    for cue in layout.cues {
        let start = (title_end + cue.span.start).min(total);
        let end = (title_end + cue.span.end()).clamp(start, total);
        segments.push(settings.caption_segment(
            cue.text,
            TimeSpan::from_bounds(start, end)?,
            settings.narration_caption_width,
            settings.narration_caption_center_y,
        ));
    }

    let plan = RenderPlan {
        canvas: settings.canvas,
        fps: settings.fps,
        total_duration: total,
        segments,
        audio: layout.audio,
    };
    plan.validate()?;
    tracing::debug!(total, title_end, "narration plan built");
    Ok(plan)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/narration.rs"]
mod tests;
