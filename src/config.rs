//! Pipeline configuration and per-job options.
//!
//! `PipelineConfig` is loaded once (JSON, every field optional) and injected into the pipeline as
//! an immutable value. `JobOptions` arrives with each job.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};

/// How outlined text is drawn by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlineMode {
    /// Stroke glyphs directly (SVG `stroke`, painted under the fill).
    #[default]
    Native,
    /// Draw a duplicate text layer offset by a few pixels beneath the main layer.
    Shadow,
}

/// Post card drawing settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostCardConfig {
    /// Optional template image the card is drawn onto.
    pub template: Option<PathBuf>,
    /// Avatar used when a post has no avatar URL or it cannot be fetched.
    pub default_avatar: Option<PathBuf>,
    /// Width of the card as composited onto the video.
    pub display_width: u32,
    /// Gap between the top of the frame and the card.
    pub top_margin: u32,
    /// Native card width in pixels when no template is configured.
    pub width: u32,
    /// Approximate glyph width as a fraction of the font size, for wrapping.
    pub char_width_factor: f32,
}

impl Default for PostCardConfig {
    fn default() -> Self {
        Self {
            template: None,
            default_avatar: None,
            display_width: 1000,
            top_margin: 50,
            width: 1000,
            char_width_factor: 0.55,
        }
    }
}

/// Caption geometry, as fractions of the frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Caption box width for dialogue lines.
    pub dialogue_width: f64,
    /// Vertical center of dialogue captions.
    pub dialogue_center_y: f64,
    /// Caption box width for narrated-post subtitles.
    pub narration_width: f64,
    /// Vertical center of narrated-post subtitles.
    pub narration_center_y: f64,
    /// Height character art is scaled to, in pixels.
    pub art_height: u32,
    /// Approximate glyph width as a fraction of the font size, for wrapping.
    pub char_width_factor: f32,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            dialogue_width: 0.8,
            dialogue_center_y: 0.8,
            narration_width: 0.9,
            narration_center_y: 0.5,
            art_height: 300,
            char_width_factor: 0.55,
        }
    }
}

/// Process-wide pipeline configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Output frame size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Voice name to provider voice id.
    pub voices: BTreeMap<String, String>,
    /// Voice used for narrated posts when the job does not choose one.
    pub default_voice: String,
    /// Background name to remote URL.
    pub backgrounds: BTreeMap<String, String>,
    /// Background used when the job names none, or an unknown one.
    pub default_background: String,
    /// Speaker name to local character art.
    pub characters: BTreeMap<String, PathBuf>,
    /// Post card settings.
    pub post_card: PostCardConfig,
    /// Caption geometry.
    pub caption: CaptionConfig,
    /// Maximum characters per chunk for proportional subtitle timing.
    pub chunk_max_chars: usize,
    /// Words per subtitle when word timestamps are available.
    pub default_word_group_size: usize,
    /// Directory job workspaces are created in. `None` uses the OS temp dir.
    pub workspace_root: Option<PathBuf>,
    /// Extra directory searched for `.ttf`/`.otf` fonts.
    pub fonts_dir: Option<PathBuf>,
    /// Outline strategy for burned-in text.
    pub outline_mode: OutlineMode,
    /// Peak-normalize the narration track.
    pub normalize_audio: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let voices = [
            ("peter", "BrXwCQ7xdzi6T5h2idQP"),
            ("brian", "jpuuy9amUxVn651Jjmtq"),
            ("reddit", "jpuuy9amUxVn651Jjmtq"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let backgrounds = [
            (
                "minecraft_parkour1",
                "https://res.cloudinary.com/dh2bzsmyd/video/upload/v1751041495/hcipgj40g2rkujvkr5vi.mp4",
            ),
            (
                "minecraft_parkour2",
                "https://res.cloudinary.com/dh2bzsmyd/video/upload/v1751041842/lth6r8frjh29qobragsh.mp4",
            ),
            (
                "subway_surfers1",
                "https://res.cloudinary.com/dh2bzsmyd/video/upload/v1751043147/m9nkvmxhz9tph42lhspt.mp4",
            ),
            (
                "subway_surfers2",
                "https://res.cloudinary.com/dh2bzsmyd/video/upload/v1751043573/lbxmatbcaroagjnqaf58.mp4",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let characters = ["peter", "brian"]
            .into_iter()
            .map(|name| {
                (
                    name.to_owned(),
                    PathBuf::from("static").join(format!("{name}.png")),
                )
            })
            .collect();

        Self {
            canvas: Canvas::default(),
            fps: Fps::default(),
            voices,
            default_voice: "reddit".to_owned(),
            backgrounds,
            default_background: "minecraft_parkour1".to_owned(),
            characters,
            post_card: PostCardConfig::default(),
            caption: CaptionConfig::default(),
            chunk_max_chars: 40,
            default_word_group_size: 3,
            workspace_root: None,
            fonts_dir: None,
            outline_mode: OutlineMode::Native,
            normalize_audio: true,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .with_context(|| format!("open pipeline config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(std::io::BufReader::new(f))
            .map_err(|e| ReelError::validation(format!("parse pipeline config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> ReelResult<()> {
        self.canvas.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        if !self.backgrounds.contains_key(&self.default_background) {
            return Err(ReelError::validation(format!(
                "default background '{}' is not in the background table",
                self.default_background
            )));
        }
        if !self.voices.contains_key(&self.default_voice) {
            return Err(ReelError::validation(format!(
                "default voice '{}' is not in the voice table",
                self.default_voice
            )));
        }
        if self.chunk_max_chars == 0 {
            return Err(ReelError::validation("chunk_max_chars must be >= 1"));
        }
        if self.default_word_group_size == 0 {
            return Err(ReelError::validation("default_word_group_size must be >= 1"));
        }
        for (name, frac) in [
            ("caption.dialogue_width", self.caption.dialogue_width),
            ("caption.narration_width", self.caption.narration_width),
            ("caption.dialogue_center_y", self.caption.dialogue_center_y),
            ("caption.narration_center_y", self.caption.narration_center_y),
        ] {
            if !frac.is_finite() || frac <= 0.0 || frac > 1.0 {
                return Err(ReelError::validation(format!(
                    "{name} must be in (0, 1] (got {frac})"
                )));
            }
        }
        Ok(())
    }

    /// Resolve a background name to its URL, falling back to the default background.
    pub fn background_url(&self, name: Option<&str>) -> ReelResult<&str> {
        let requested = name.unwrap_or(&self.default_background);
        if let Some(url) = self.backgrounds.get(requested) {
            return Ok(url);
        }
        tracing::warn!(
            background = requested,
            "unknown background, using '{}'",
            self.default_background
        );
        self.backgrounds
            .get(&self.default_background)
            .map(String::as_str)
            .ok_or_else(|| ReelError::validation("default background is not configured"))
    }

    /// Resolve a voice name to the provider voice id.
    pub fn voice_id(&self, name: &str) -> ReelResult<&str> {
        self.voices
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ReelError::validation(format!("unknown voice '{name}'")))
    }
}

/// Options recognized on a job submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobOptions {
    /// Subtitle style name (unknown names fall back to `standard`).
    pub subtitle_style: Option<String>,
    /// Named background video.
    pub background_video: Option<String>,
    /// Named narration voice (narrated posts).
    pub voice: Option<String>,
    /// Words per subtitle group for word-aligned narration.
    pub word_group_size: Option<usize>,
    /// Multiplier applied to the style's base font size.
    pub subtitle_size_multiplier: Option<f32>,
    /// Template identifier chosen by the submitting UI; informational.
    pub template: Option<String>,
}

impl JobOptions {
    /// Reject out-of-range values.
    pub fn validate(&self) -> ReelResult<()> {
        if self.word_group_size == Some(0) {
            return Err(ReelError::validation("wordGroupSize must be >= 1"));
        }
        if let Some(m) = self.subtitle_size_multiplier
            && (!m.is_finite() || m <= 0.0)
        {
            return Err(ReelError::validation(format!(
                "subtitleSizeMultiplier must be finite and > 0 (got {m})"
            )));
        }
        Ok(())
    }

    /// Style name, defaulting to `standard`.
    pub fn style_name(&self) -> &str {
        self.subtitle_style
            .as_deref()
            .unwrap_or(crate::style::table::DEFAULT_STYLE)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
