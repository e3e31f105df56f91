//! Compile a [`RenderPlan`] into one ffmpeg `filter_complex` invocation.
//!
//! The background is looped, scaled to cover the canvas and cropped. Every other segment is an
//! input image overlaid during its span with `enable='between(t,start,end)'`. Inputs are
//! deduplicated by path so repeated character art is read once.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::plan::{
    AssetRef, HAlign, Placement, RenderPlan, RenderSegment, SegmentKind, VAlign,
};

/// One `-i` input with the options that precede it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfmpegInput {
    /// Input options, e.g. `-stream_loop -1`.
    pub options: Vec<String>,
    /// Input file.
    pub path: PathBuf,
}

/// A compiled ffmpeg invocation, minus the output path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfmpegGraph {
    /// Inputs in index order.
    pub inputs: Vec<FfmpegInput>,
    /// The `-filter_complex` argument.
    pub filter_complex: String,
    /// Mapping and encoder arguments.
    pub output_args: Vec<String>,
}

impl FfmpegGraph {
    /// Full argument list writing to `out`.
    pub fn to_args(&self, out: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into()];
        for input in &self.inputs {
            args.extend(input.options.iter().map(OsString::from));
            args.push("-i".into());
            args.push(input.path.clone().into_os_string());
        }
        args.push("-filter_complex".into());
        args.push(self.filter_complex.clone().into());
        args.extend(self.output_args.iter().map(OsString::from));
        args.push(out.as_os_str().to_owned());
        args
    }
}

/// Build the graph. `text_images` maps text segment indices to their rasterized PNGs.
pub fn compile_graph(
    plan: &RenderPlan,
    text_images: &BTreeMap<usize, PathBuf>,
) -> ReelResult<FfmpegGraph> {
    let (w, h) = (plan.canvas.width, plan.canvas.height);
    let bg = plan
        .background()
        .ok_or_else(|| ReelError::render("plan has no background segment"))?;
    let AssetRef::File(bg_path) = &bg.asset else {
        return Err(ReelError::render("background must be a file"));
    };

    let mut inputs = vec![FfmpegInput {
        options: vec!["-stream_loop".into(), "-1".into()],
        path: bg_path.clone(),
    }];
    let mut by_path: HashMap<PathBuf, usize> = HashMap::new();
    let mut filters = vec![format!(
        "[0:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,fps={fps}[base]",
        fps = plan.fps.to_ffmpeg_arg()
    )];

    let overlays: Vec<(usize, &RenderSegment)> = plan
        .segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.kind != SegmentKind::Background)
        .collect();

    let mut current = "base".to_owned();
    for (n, (idx, seg)) in overlays.iter().enumerate() {
        let path = match &seg.asset {
            AssetRef::File(p) => p.clone(),
            AssetRef::Text(_) => text_images.get(idx).cloned().ok_or_else(|| {
                ReelError::render(format!("text segment {idx} was not rasterized"))
            })?,
        };
        let input = *by_path.entry(path.clone()).or_insert_with(|| {
            inputs.push(FfmpegInput {
                options: Vec::new(),
                path,
            });
            inputs.len() - 1
        });

        let layer = format!("l{n}");
        filters.push(format!(
            "[{input}:v]format=rgba{}[{layer}]",
            scale_filter(&seg.placement)
        ));
        let (x, y) = position(&seg.placement);
        let next = if n + 1 == overlays.len() {
            "vout".to_owned()
        } else {
            format!("v{n}")
        };
        filters.push(format!(
            "[{current}][{layer}]overlay=x={x}:y={y}:enable='between(t,{:.6},{:.6})'[{next}]",
            seg.span.start,
            seg.span.end()
        ));
        current = next;
    }
    if overlays.is_empty() {
        filters.push("[base]null[vout]".to_owned());
    }

    let mut output_args = vec!["-map".to_owned(), "[vout]".to_owned()];
    if let Some(audio) = &plan.audio {
        inputs.push(FfmpegInput {
            options: Vec::new(),
            path: audio.clone(),
        });
        output_args.extend([
            "-map".to_owned(),
            format!("{}:a", inputs.len() - 1),
            "-c:a".to_owned(),
            "aac".to_owned(),
            "-b:a".to_owned(),
            "192k".to_owned(),
        ]);
    } else {
        output_args.push("-an".to_owned());
    }
    let duration = format!("{:.6}", plan.total_duration);
    let rate = plan.fps.to_ffmpeg_arg();
    output_args.extend(
        [
            "-t",
            duration.as_str(),
            "-r",
            rate.as_str(),
            "-c:v",
            "libx264",
            "-preset",
            "veryfast",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]
        .map(str::to_owned),
    );

    Ok(FfmpegGraph {
        inputs,
        filter_complex: filters.join(";"),
        output_args,
    })
}

fn scale_filter(placement: &Placement) -> String {
    match placement {
        Placement::Anchored {
            width: Some(w), ..
        } => format!(",scale={w}:-1"),
        Placement::Anchored {
            height: Some(h), ..
        } => format!(",scale=-1:{h}"),
        _ => String::new(),
    }
}

fn position(placement: &Placement) -> (String, String) {
    match placement {
        Placement::Fill => ("0".into(), "0".into()),
        Placement::Anchored { h, v, margin, .. } => {
            let x = match h {
                HAlign::Left => format!("{margin}"),
                HAlign::Center => "(W-w)/2".to_owned(),
                HAlign::Right => format!("W-w-{margin}"),
            };
            let y = match v {
                VAlign::Top => format!("{margin}"),
                VAlign::Center => "(H-h)/2".to_owned(),
                VAlign::Bottom => format!("H-h-{margin}"),
            };
            (x, y)
        }
        Placement::CaptionBox {
            center_y_fraction, ..
        } => ("(W-w)/2".into(), format!("H*{center_y_fraction:.4}-h/2")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compose.rs"]
mod tests;
