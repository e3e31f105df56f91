use crate::foundation::error::{ReelError, ReelResult};

/// Tolerance used when comparing timeline seconds.
pub const TIME_EPSILON: f64 = 1e-9;

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if den == 0 {
            return Err(ReelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Render as an ffmpeg rate argument (`num/den`).
    pub fn to_ffmpeg_arg(self) -> String {
        format!("{}/{}", self.num, self.den)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 24, den: 1 }
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Validate dimensions for yuv420p output (non-zero and even).
    pub fn validate(self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("canvas width/height must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
        }
    }
}

/// Half-open interval `[start, start + duration)` on the job timeline, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeSpan {
    /// Offset from the start of the video.
    pub start: f64,
    /// Length of the interval.
    pub duration: f64,
}

impl TimeSpan {
    /// Create a validated span (finite, non-negative start and duration).
    pub fn new(start: f64, duration: f64) -> ReelResult<Self> {
        if !start.is_finite() || start < 0.0 {
            return Err(ReelError::validation(format!(
                "span start must be finite and >= 0 (got {start})"
            )));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(ReelError::validation(format!(
                "span duration must be finite and >= 0 (got {duration})"
            )));
        }
        Ok(Self { start, duration })
    }

    /// Build a span from its bounds.
    pub fn from_bounds(start: f64, end: f64) -> ReelResult<Self> {
        Self::new(start, end - start)
    }

    /// Exclusive end of the span.
    pub fn end(self) -> f64 {
        self.start + self.duration
    }

    /// Return `true` when the span lies within `[0, total]`.
    pub fn within(self, total: f64) -> bool {
        self.start >= -TIME_EPSILON && self.end() <= total + TIME_EPSILON
    }

    /// Return `true` when both spans share a non-empty interval.
    pub fn overlaps(self, other: TimeSpan) -> bool {
        self.start < other.end() - TIME_EPSILON && other.start < self.end() - TIME_EPSILON
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
