//! Burned-in text: caption layout, SVG generation and rasterization to PNG.
//!
//! Captions are laid out with a fixed character-width heuristic (font size times a factor), turned
//! into a small SVG document and rasterized with `resvg`. Outlines are either native SVG strokes
//! painted under the fill, or a duplicate text layer offset beneath the main one.

use std::path::Path;
use std::sync::Arc;

use crate::config::OutlineMode;
use crate::foundation::error::{ReelError, ReelResult};
use crate::style::color::Color;
use crate::style::table::StyleSpec;
use crate::timeline::chunk::wrap_words;

/// Offset of the synthetic drop-shadow layer in [`OutlineMode::Shadow`].
pub const SHADOW_OFFSET_PX: f32 = 3.0;

const LINE_HEIGHT_EM: f32 = 1.25;
const MAX_DIM: u32 = 8_192;

/// Geometry of one caption image.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLayout {
    /// Image width in pixels (the caption box width).
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Wrapped lines, top to bottom.
    pub lines: Vec<String>,
    /// Baseline-to-baseline distance.
    pub line_height: f32,
    /// Inner padding on every side.
    pub padding: f32,
}

/// Wrap `text` into a caption box `box_width` pixels wide.
pub fn layout_caption(
    text: &str,
    style: &StyleSpec,
    box_width: u32,
    char_width_factor: f32,
) -> CaptionLayout {
    let outline = style.outline.map(|o| o.width).unwrap_or(0.0);
    let padding = outline + style.size * 0.25 + SHADOW_OFFSET_PX;
    let usable = (box_width as f32 - 2.0 * padding).max(style.size);
    let glyph = (style.size * char_width_factor).max(1.0);
    let max_chars = ((usable / glyph).floor() as usize).max(1);

    let mut lines = wrap_words(text, max_chars);
    if lines.is_empty() {
        lines.push(String::new());
    }
    let line_height = style.size * LINE_HEIGHT_EM;
    let height = (lines.len() as f32 * line_height + 2.0 * padding).ceil() as u32;
    CaptionLayout {
        width: box_width.max(1),
        height: height.max(1),
        lines,
        line_height,
        padding,
    }
}

/// SVG document for a laid-out caption.
pub fn caption_svg(layout: &CaptionLayout, style: &StyleSpec, mode: OutlineMode) -> String {
    let (family, weight) = font_attrs(&style.font_family);
    let cx = layout.width as f32 / 2.0;
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = layout.width,
        h = layout.height
    );

    if let Some(bg) = style.background {
        svg.push_str(&format!(
            r#"<rect x="0" y="0" width="{}" height="{}" rx="{:.1}" fill="{}" fill-opacity="{:.3}"/>"#,
            layout.width,
            layout.height,
            style.size * 0.3,
            bg.to_hex_rgb(),
            bg.opacity()
        ));
    }

    let text_open = |dx: f32, fill: Color, stroke: Option<(Color, f32)>| {
        let mut s = format!(
            r#"<text font-family="{family}" font-weight="{weight}" font-size="{size:.1}" text-anchor="middle" fill="{fill}" fill-opacity="{fo:.3}""#,
            size = style.size,
            fill = fill.to_hex_rgb(),
            fo = fill.opacity()
        );
        if let Some((color, width)) = stroke {
            s.push_str(&format!(
                r#" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.2}" stroke-linejoin="round" paint-order="stroke""#,
                color.to_hex_rgb(),
                color.opacity(),
                width * 2.0
            ));
        }
        if dx != 0.0 {
            s.push_str(&format!(r#" transform="translate({dx:.1},{dx:.1})""#));
        }
        s.push('>');
        s
    };

    let push_lines = |svg: &mut String, open: String| {
        svg.push_str(&open);
        for (i, line) in layout.lines.iter().enumerate() {
            let baseline =
                layout.padding + layout.line_height * i as f32 + style.size * 0.95;
            svg.push_str(&format!(
                r#"<tspan x="{cx:.1}" y="{baseline:.1}">{}</tspan>"#,
                escape_xml(line)
            ));
        }
        svg.push_str("</text>");
    };

    match (mode, style.outline) {
        (OutlineMode::Native, Some(o)) => {
            push_lines(&mut svg, text_open(0.0, style.fill, Some((o.color, o.width))));
        }
        (OutlineMode::Shadow, Some(o)) => {
            push_lines(&mut svg, text_open(SHADOW_OFFSET_PX, o.color, None));
            push_lines(&mut svg, text_open(0.0, style.fill, None));
        }
        (_, None) => push_lines(&mut svg, text_open(0.0, style.fill, None)),
    }

    svg.push_str("</svg>");
    svg
}

/// Split names like `Arial-Bold` into a CSS family list and a weight.
pub(crate) fn font_attrs(font_family: &str) -> (String, &'static str) {
    let (name, weight) = match font_family.rsplit_once('-') {
        Some((base, "Bold")) | Some((base, "bold")) => (base, "bold"),
        _ => (font_family, "normal"),
    };
    (format!("'{}', sans-serif", escape_xml(name)), weight)
}

/// Escape text for SVG element content and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// SVG rasterizer with a shared font database (system fonts plus an optional fonts directory).
#[derive(Clone)]
pub struct TextRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for TextRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRasterizer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl TextRasterizer {
    /// Load system fonts and every `.ttf`/`.otf`/`.ttc` file in `fonts_dir`.
    pub fn new(fonts_dir: Option<&Path>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = fonts_dir {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "font database ready");
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Rasterize an SVG document at its intrinsic size into straight-alpha RGBA.
    pub fn rasterize(&self, svg: &str) -> ReelResult<image::RgbaImage> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts)
            .map_err(|e| ReelError::render(format!("failed to parse generated svg: {e}")))?;

        let size = tree.size();
        let (w, h) = (size.width().ceil() as u32, size.height().ceil() as u32);
        if w == 0 || h == 0 || w > MAX_DIM || h > MAX_DIM {
            return Err(ReelError::render(format!("invalid text raster size {w}x{h}")));
        }
        let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
            .ok_or_else(|| ReelError::render("failed to allocate text pixmap"))?;
        resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let mut data = pixmap.take();
        unpremultiply_rgba8_in_place(&mut data);
        image::RgbaImage::from_raw(w, h, data)
            .ok_or_else(|| ReelError::render("text raster buffer size mismatch"))
    }

    /// Lay out, rasterize and save one caption as a transparent PNG.
    pub fn render_caption(
        &self,
        text: &str,
        style: &StyleSpec,
        box_width: u32,
        char_width_factor: f32,
        mode: OutlineMode,
        dest: &Path,
    ) -> ReelResult<CaptionLayout> {
        let layout = layout_caption(text, style, box_width, char_width_factor);
        let img = self.rasterize(&caption_svg(&layout, style, mode))?;
        save_png(&img, dest)?;
        Ok(layout)
    }
}

/// Write an RGBA image as PNG.
pub fn save_png(img: &image::RgbaImage, dest: &Path) -> ReelResult<()> {
    img.save_with_format(dest, image::ImageFormat::Png)
        .map_err(|e| ReelError::render(format!("failed to write png '{}': {e}", dest.display())))
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "fonts directory is not readable");
        return;
    };
    for path in rd.flatten().map(|e| e.path()) {
        let is_font = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .is_some_and(|ext| matches!(ext.as_str(), "ttf" | "otf" | "ttc"));
        if is_font && let Err(e) = db.load_font_file(&path) {
            tracing::warn!(font = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}

/// Resolve requested families, then fall back to generic families, then to any face at all.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;
    use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => Family::Serif,
                    usvg::FontFamily::SansSerif => Family::SansSerif,
                    usvg::FontFamily::Cursive => Family::Cursive,
                    usvg::FontFamily::Fantasy => Family::Fantasy,
                    usvg::FontFamily::Monospace => Family::Monospace,
                    usvg::FontFamily::Named(s) => Family::Name(s),
                })
                .collect();
            families.extend([Family::SansSerif, Family::Serif]);

            let style = match font.style() {
                usvg::FontStyle::Normal => Style::Normal,
                usvg::FontStyle::Italic => Style::Italic,
                usvg::FontStyle::Oblique => Style::Oblique,
            };
            let query = Query {
                families: &families,
                weight: Weight(font.weight()),
                stretch: Stretch::Normal,
                style,
            };
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text_raster.rs"]
mod tests;
