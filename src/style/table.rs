use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};
use crate::style::color::Color;

/// Name of the style every unknown lookup falls back to.
pub const DEFAULT_STYLE: &str = "standard";

/// Text outline (stroke) drawn around glyphs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f32,
}

/// Immutable text-rendering properties for subtitles and captions.
///
/// Per-job adjustments never mutate a table entry; they derive a new value through
/// [`StyleSpec::scaled`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleSpec {
    /// Font family name as understood by the system font database.
    pub font_family: String,
    /// Base font size in pixels.
    pub size: f32,
    /// Glyph fill color.
    pub fill: Color,
    /// Optional glyph outline.
    #[serde(default)]
    pub outline: Option<Outline>,
    /// Optional solid box drawn behind the text block.
    #[serde(default)]
    pub background: Option<Color>,
}

impl StyleSpec {
    /// Derive a copy with the font size (and outline width) multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> ReelResult<StyleSpec> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ReelError::validation(format!(
                "subtitle size multiplier must be finite and > 0 (got {factor})"
            )));
        }
        let mut out = self.clone();
        out.size *= factor;
        if let Some(o) = out.outline.as_mut() {
            o.width *= factor;
        }
        Ok(out)
    }
}

/// Process-wide, read-only mapping from style name to [`StyleSpec`].
#[derive(Clone, Debug)]
pub struct StyleTable {
    styles: BTreeMap<String, StyleSpec>,
    premium: BTreeSet<String>,
}

impl StyleTable {
    /// Build a table from explicit entries. The `standard` style must be present.
    pub fn new(
        styles: BTreeMap<String, StyleSpec>,
        premium: impl IntoIterator<Item = String>,
    ) -> ReelResult<Self> {
        if !styles.contains_key(DEFAULT_STYLE) {
            return Err(ReelError::validation(format!(
                "style table must define the '{DEFAULT_STYLE}' style"
            )));
        }
        for (name, spec) in &styles {
            if !spec.size.is_finite() || spec.size <= 0.0 {
                return Err(ReelError::validation(format!(
                    "style '{name}' has invalid size {}",
                    spec.size
                )));
            }
        }
        Ok(Self {
            styles,
            premium: premium.into_iter().collect(),
        })
    }

    /// Return the named spec, or the `standard` spec for unknown names.
    pub fn lookup(&self, name: &str) -> &StyleSpec {
        match self.styles.get(name) {
            Some(spec) => spec,
            None => {
                tracing::debug!(style = name, "unknown subtitle style, using standard");
                &self.styles[DEFAULT_STYLE]
            }
        }
    }

    /// Return `true` when the style requires a paid tier. Unknown names are not premium.
    pub fn is_premium(&self, name: &str) -> bool {
        self.premium.contains(name)
    }

    /// Iterate style names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        fn spec(
            font: &str,
            size: f32,
            fill: Color,
            outline: Option<(Color, f32)>,
            background: Option<Color>,
        ) -> StyleSpec {
            StyleSpec {
                font_family: font.to_owned(),
                size,
                fill,
                outline: outline.map(|(color, width)| Outline { color, width }),
                background,
            }
        }

        let mut styles = BTreeMap::new();
        styles.insert(
            DEFAULT_STYLE.to_owned(),
            spec("Arial", 40.0, Color::WHITE, Some((Color::BLACK, 2.0)), None),
        );
        styles.insert(
            "glow_purple".to_owned(),
            spec(
                "Arial",
                44.0,
                Color::rgb(0xe9, 0xd5, 0xff),
                Some((Color::rgb(0x9d, 0x4e, 0xdd), 4.0)),
                None,
            ),
        );
        styles.insert(
            "retro_wave".to_owned(),
            spec(
                "Courier New",
                42.0,
                Color::rgb(0xff, 0x71, 0xce),
                Some((Color::rgb(0x01, 0xcd, 0xfe), 3.0)),
                None,
            ),
        );
        styles.insert(
            "comic_book".to_owned(),
            spec(
                "Comic Sans MS",
                46.0,
                Color::rgb(0xff, 0xe6, 0x00),
                Some((Color::BLACK, 4.0)),
                None,
            ),
        );
        styles.insert(
            "valorant".to_owned(),
            spec(
                "Impact",
                48.0,
                Color::rgb(0xff, 0x46, 0x55),
                Some((Color::rgb(0x0f, 0x19, 0x23), 3.0)),
                None,
            ),
        );
        styles.insert(
            "subtle_gradient".to_owned(),
            spec(
                "Arial",
                40.0,
                Color::rgb(0xf5, 0xf5, 0xf5),
                None,
                Some(Color::rgba(0, 0, 0, 140)),
            ),
        );
        styles.insert(
            "fire".to_owned(),
            spec(
                "Impact",
                48.0,
                Color::rgb(0xff, 0x8c, 0x00),
                Some((Color::rgb(0x8b, 0x00, 0x00), 3.0)),
                None,
            ),
        );
        styles.insert(
            "professional".to_owned(),
            spec(
                "Helvetica",
                38.0,
                Color::WHITE,
                None,
                Some(Color::rgba(0x11, 0x11, 0x11, 200)),
            ),
        );
        styles.insert(
            "horror".to_owned(),
            spec(
                "Georgia",
                44.0,
                Color::rgb(0xb3, 0x00, 0x00),
                Some((Color::BLACK, 3.0)),
                None,
            ),
        );

        let premium = [
            "glow_purple",
            "retro_wave",
            "comic_book",
            "valorant",
            "subtle_gradient",
            "fire",
            "professional",
            "horror",
        ]
        .map(str::to_owned);

        Self {
            styles,
            premium: premium.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style/table.rs"]
mod tests;
