//! Audio decoding and media probing.
//!
//! WAV files are read in-process with `hound`; every other container goes through the system
//! `ffmpeg` binary, decoded to interleaved `f32` stereo at [`MIX_SAMPLE_RATE`].

use std::path::Path;
use std::process::{Command, Stdio};

use crate::foundation::error::{ReelError, ReelResult};

/// Sample rate of the narration track and of ffmpeg-decoded audio.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Decoded audio.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Channel count (1 or 2 in practice).
    pub channels: u16,
    /// Interleaved samples in `[-1, 1]`.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.interleaved_f32.len() / usize::from(self.channels)
        }
    }

    /// Measured duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Return `true` when an `ffmpeg` binary can be executed.
pub fn is_ffmpeg_on_path() -> bool {
    tool_runs("ffmpeg")
}

/// Return `true` when an `ffprobe` binary can be executed.
pub fn is_ffprobe_on_path() -> bool {
    tool_runs("ffprobe")
}

fn tool_runs(bin: &str) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Decode an audio file, choosing the decoder from the extension.
pub fn decode_audio(path: &Path) -> ReelResult<AudioPcm> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if is_wav {
        decode_wav(path)
    } else {
        decode_audio_f32_stereo(path, MIX_SAMPLE_RATE)
    }
}

/// Decode a RIFF WAV file (integer or float samples).
pub fn decode_wav(path: &Path) -> ReelResult<AudioPcm> {
    let mut reader = hound::WavReader::open(path).map_err(|e| {
        ReelError::render(format!("failed to open wav '{}': {e}", path.display()))
    })?;
    let spec = reader.spec();
    let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect()
        }
    };
    let interleaved_f32 = samples.map_err(|e| {
        ReelError::render(format!("failed to decode wav '{}': {e}", path.display()))
    })?;
    Ok(AudioPcm {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        interleaved_f32,
    })
}

/// Decode any ffmpeg-readable audio to interleaved `f32` stereo.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::render(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelError::render(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    if !out.stdout.len().is_multiple_of(4) {
        return Err(ReelError::render(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let interleaved_f32 = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32,
    })
}

/// Container duration in seconds as reported by `ffprobe`.
pub fn probe_duration(path: &Path) -> ReelResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| ReelError::render(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::render(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelError::render(format!("ffprobe json parse failed: {e}")))?;
    parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| {
            ReelError::render(format!("ffprobe reported no duration for '{}'", path.display()))
        })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
