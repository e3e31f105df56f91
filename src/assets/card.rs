//! Static post-card drawing.
//!
//! A card is a template image (or a plain white rounded panel) with the author avatar, handle,
//! optional verification mark, wrapped title and engagement counters drawn on top.

use std::path::Path;

use image::{Rgba, RgbaImage, imageops};

use crate::assets::text_raster::{TextRasterizer, escape_xml, save_png};
use crate::config::PostCardConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::model::NarratedPost;
use crate::timeline::chunk::wrap_words;

const PAD: u32 = 40;
const AVATAR: u32 = 80;
const HANDLE_SIZE: f32 = 34.0;
const TITLE_SIZE: f32 = 44.0;
const COUNTER_SIZE: f32 = 30.0;
const VERIFIED_BLUE: &str = "#1d9bf0";

/// Display form of an engagement counter: `999`, `1.2k`, `3.4M`.
pub fn format_count(n: u64) -> String {
    fn short(v: f64, suffix: &str) -> String {
        let s = format!("{v:.1}");
        let s = s.strip_suffix(".0").unwrap_or(&s);
        format!("{s}{suffix}")
    }
    match n {
        0..=999 => n.to_string(),
        1_000..=999_949 => short(n as f64 / 1_000.0, "k"),
        _ => short(n as f64 / 1_000_000.0, "M"),
    }
}

/// Vertical layout of a drawn card.
#[derive(Clone, Debug, PartialEq)]
pub struct CardLayout {
    /// Card width.
    pub width: u32,
    /// Card height.
    pub height: u32,
    /// Wrapped title lines.
    pub title_lines: Vec<String>,
}

/// Compute the layout of `post` on a card `width` pixels wide.
pub fn layout_card(post: &NarratedPost, width: u32, char_width_factor: f32) -> CardLayout {
    let usable = width.saturating_sub(2 * PAD) as f32;
    let max_chars = ((usable / (TITLE_SIZE * char_width_factor)).floor() as usize).max(1);
    let title_lines = wrap_words(&post.title, max_chars);
    let title_h = (title_lines.len() as f32 * TITLE_SIZE * 1.2).ceil() as u32;
    let height = PAD + AVATAR + 24 + title_h + 24 + COUNTER_SIZE as u32 + PAD;
    CardLayout {
        width,
        height,
        title_lines,
    }
}

/// SVG overlay with every text element of the card. `panel` adds the white rounded background.
pub fn card_svg(post: &NarratedPost, layout: &CardLayout, panel: bool) -> String {
    let (w, h) = (layout.width, layout.height);
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    if panel {
        svg.push_str(&format!(
            r##"<rect x="0" y="0" width="{w}" height="{h}" rx="28" fill="#ffffff"/>"##
        ));
    }

    let text_x = PAD + AVATAR + 20;
    let handle = post.handle.as_deref().unwrap_or("anonymous");
    let handle_y = PAD as f32 + AVATAR as f32 / 2.0 + HANDLE_SIZE * 0.35;
    svg.push_str(&format!(
        r##"<text x="{text_x}" y="{handle_y:.1}" font-family="'Arial', sans-serif" font-weight="bold" font-size="{HANDLE_SIZE}" fill="#1a1a1b">{}</text>"##,
        escape_xml(handle)
    ));
    if post.verified {
        // Placed after the handle using the same width heuristic as wrapping.
        let cx = text_x as f32 + handle.chars().count() as f32 * HANDLE_SIZE * 0.58 + 22.0;
        let cy = PAD as f32 + AVATAR as f32 / 2.0;
        svg.push_str(&format!(
            r##"<circle cx="{cx:.1}" cy="{cy:.1}" r="14" fill="{VERIFIED_BLUE}"/><path d="M {:.1} {:.1} l 5 5 l 9 -10" stroke="#ffffff" stroke-width="3.5" fill="none" stroke-linecap="round" stroke-linejoin="round"/>"##,
            cx - 7.0,
            cy
        ));
    }

    let title_top = (PAD + AVATAR + 24) as f32;
    for (i, line) in layout.title_lines.iter().enumerate() {
        let y = title_top + TITLE_SIZE * (0.95 + 1.2 * i as f32);
        svg.push_str(&format!(
            r##"<text x="{PAD}" y="{y:.1}" font-family="'Arial', sans-serif" font-weight="bold" font-size="{TITLE_SIZE}" fill="#1a1a1b">{}</text>"##,
            escape_xml(line)
        ));
    }

    let counters_y = h as f32 - PAD as f32;
    let mut counters = Vec::new();
    if let Some(n) = post.upvotes {
        counters.push(format!("{} upvotes", format_count(n)));
    }
    if let Some(n) = post.comments {
        counters.push(format!("{} comments", format_count(n)));
    }
    if !counters.is_empty() {
        svg.push_str(&format!(
            r##"<text x="{PAD}" y="{counters_y:.1}" font-family="'Arial', sans-serif" font-size="{COUNTER_SIZE}" fill="#787c7e">{}</text>"##,
            escape_xml(&counters.join("   "))
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Draws post cards into PNG files.
#[derive(Debug)]
pub struct CardPainter<'a> {
    text: &'a TextRasterizer,
    cfg: &'a PostCardConfig,
}

impl<'a> CardPainter<'a> {
    /// Painter using `text` for glyphs and `cfg` for geometry and fallback images.
    pub fn new(text: &'a TextRasterizer, cfg: &'a PostCardConfig) -> Self {
        Self { text, cfg }
    }

    /// Draw `post` into `dest`. `avatar` is a local image; unreadable avatars fall back.
    pub fn paint(&self, post: &NarratedPost, avatar: Option<&Path>, dest: &Path) -> ReelResult<()> {
        let template = match &self.cfg.template {
            Some(p) => Some(load_image(p)?),
            None => None,
        };
        let width = template
            .as_ref()
            .map(|t| t.width())
            .unwrap_or(self.cfg.width)
            .max(2 * PAD + AVATAR);
        let mut layout = layout_card(post, width, self.cfg.char_width_factor);

        let mut canvas = match template {
            Some(t) => {
                layout.height = layout.height.max(t.height());
                let mut base = RgbaImage::new(layout.width, layout.height);
                imageops::overlay(&mut base, &t, 0, 0);
                base
            }
            None => RgbaImage::new(layout.width, layout.height),
        };

        let overlay = self
            .text
            .rasterize(&card_svg(post, &layout, self.cfg.template.is_none()))?;
        imageops::overlay(&mut canvas, &overlay, 0, 0);

        let avatar_img = self.avatar_image(avatar);
        imageops::overlay(&mut canvas, &avatar_img, i64::from(PAD), i64::from(PAD));

        save_png(&canvas, dest)
    }

    fn avatar_image(&self, avatar: Option<&Path>) -> RgbaImage {
        let candidates = avatar.into_iter().chain(self.cfg.default_avatar.as_deref());
        for path in candidates {
            match load_image(path) {
                Ok(img) => {
                    let img = imageops::resize(&img, AVATAR, AVATAR, imageops::FilterType::Triangle);
                    return circle_mask(img);
                }
                Err(e) => tracing::warn!(avatar = %path.display(), error = %e, "avatar unusable, falling back"),
            }
        }
        grey_disc(AVATAR)
    }
}

fn load_image(path: &Path) -> ReelResult<RgbaImage> {
    image::open(path)
        .map(|i| i.to_rgba8())
        .map_err(|e| ReelError::render(format!("failed to read image '{}': {e}", path.display())))
}

fn circle_mask(mut img: RgbaImage) -> RgbaImage {
    let r = img.width().min(img.height()) as f32 / 2.0;
    for (x, y, px) in img.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        if dx * dx + dy * dy > r * r {
            px[3] = 0;
        }
    }
    img
}

fn grey_disc(size: u32) -> RgbaImage {
    circle_mask(RgbaImage::from_pixel(size, size, Rgba([178, 182, 186, 255])))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/card.rs"]
mod tests;
