//! Concatenate measured speech clips into one narration track.
//!
//! Clip `i` starts at the cumulative duration of clips `0..i`, which is exactly the start time the
//! timeline gives its segments. Clips are resampled to [`MIX_SAMPLE_RATE`] stereo with linear
//! interpolation.

use std::path::Path;

use crate::assets::media::{AudioPcm, MIX_SAMPLE_RATE};
use crate::foundation::error::{ReelError, ReelResult};

/// Output channel count.
pub const NARRATION_CHANNELS: u16 = 2;

/// One continuous narration track.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationTrack {
    /// Interleaved stereo samples at [`MIX_SAMPLE_RATE`].
    pub samples: Vec<f32>,
    /// Start of each source clip in seconds.
    pub clip_starts: Vec<f64>,
    /// Sum of the source clip durations.
    pub duration_secs: f64,
}

impl NarrationTrack {
    /// Frames in the output buffer.
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(NARRATION_CHANNELS)
    }
}

/// Lay `clips` end to end.
pub fn concat_tracks(clips: &[AudioPcm]) -> NarrationTrack {
    let mut clip_starts = Vec::with_capacity(clips.len());
    let mut t = 0.0f64;
    for clip in clips {
        clip_starts.push(t);
        t += clip.duration_secs();
    }
    let total_frames = secs_to_frame(t);
    let mut samples = vec![0.0f32; total_frames * usize::from(NARRATION_CHANNELS)];

    for (clip, &start) in clips.iter().zip(&clip_starts) {
        let dst_start = secs_to_frame(start);
        let dst_end = secs_to_frame(start + clip.duration_secs()).min(total_frames);
        place_clip(&mut samples, clip, dst_start, dst_end);
    }

    NarrationTrack {
        samples,
        clip_starts,
        duration_secs: t,
    }
}

fn secs_to_frame(secs: f64) -> usize {
    (secs * f64::from(MIX_SAMPLE_RATE)).round().max(0.0) as usize
}

fn place_clip(out: &mut [f32], clip: &AudioPcm, dst_start: usize, dst_end: usize) {
    let src = clip.interleaved_f32.as_slice();
    let channels = usize::from(clip.channels);
    let src_frames = clip.frames();
    if src_frames == 0 || clip.sample_rate == 0 {
        return;
    }
    let step = f64::from(clip.sample_rate) / f64::from(MIX_SAMPLE_RATE);

    for dst in dst_start..dst_end {
        let src_pos = (dst - dst_start) as f64 * step;
        let f0 = src_pos.floor() as usize;
        if f0 >= src_frames {
            break;
        }
        let f1 = (f0 + 1).min(src_frames - 1);
        let frac = (src_pos - f0 as f64) as f32;
        let lerp = |c: usize| {
            let a = src[f0 * channels + c];
            let b = src[f1 * channels + c];
            a + (b - a) * frac
        };
        let (l, r) = if channels == 1 {
            let v = lerp(0);
            (v, v)
        } else {
            (lerp(0), lerp(1))
        };
        let i = dst * usize::from(NARRATION_CHANNELS);
        out[i] = l;
        out[i + 1] = r;
    }
}

/// Scale samples so the loudest one reaches `target` (no-op on silence).
pub fn normalize_peak(samples: &mut [f32], target: f32) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak <= f32::EPSILON {
        return;
    }
    let gain = target / peak;
    for s in samples.iter_mut() {
        *s = (*s * gain).clamp(-1.0, 1.0);
    }
}

/// Write 16-bit PCM stereo WAV at [`MIX_SAMPLE_RATE`].
pub fn write_wav(track: &NarrationTrack, path: &Path) -> ReelResult<()> {
    let spec = hound::WavSpec {
        channels: NARRATION_CHANNELS,
        sample_rate: MIX_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav_err =
        |e: hound::Error| ReelError::render(format!("failed to write '{}': {e}", path.display()));
    let mut w = hound::WavWriter::create(path, spec).map_err(wav_err)?;
    for &s in &track.samples {
        let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        w.write_sample(v).map_err(wav_err)?;
    }
    w.finalize().map_err(wav_err)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/narration.rs"]
mod tests;
