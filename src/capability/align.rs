//! Word-level speech alignment capability.

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};

use super::http;

/// One recognized word with its timestamps in seconds from the start of the audio.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    /// Recognized spelling.
    pub word: String,
    /// Start time.
    pub start: f64,
    /// End time.
    pub end: f64,
}

impl WordTiming {
    /// Convenience constructor.
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }
}

/// Produces ordered word timestamps for a narration track.
pub trait SpeechAligner: Send + Sync {
    /// Align `audio` (an encoded file named `file_name`). Failures are [`ReelError::Alignment`].
    fn align(&self, audio: &[u8], file_name: &str) -> ReelResult<Vec<WordTiming>>;
}

/// Production endpoint of the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Whisper transcription with word-level timestamp granularity.
#[derive(Clone, Debug)]
pub struct WhisperAligner {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct TranscriptionOut {
    #[serde(default)]
    words: Vec<WordTiming>,
}

impl WhisperAligner {
    /// Client against the production endpoint.
    pub fn new(api_key: impl Into<String>) -> ReelResult<Self> {
        Self::with_base_url(api_key, OPENAI_BASE_URL)
    }

    /// Client against an arbitrary base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> ReelResult<Self> {
        Ok(Self {
            client: http::blocking_client(http::DEFAULT_TIMEOUT)?,
            base_url: http::trim_base(base_url),
            api_key: api_key.into(),
        })
    }
}

impl SpeechAligner for WhisperAligner {
    #[tracing::instrument(skip(self, audio), fields(bytes = audio.len()))]
    fn align(&self, audio: &[u8], file_name: &str) -> ReelResult<Vec<WordTiming>> {
        use reqwest::blocking::multipart::{Form, Part};

        let url = format!("{}/v1/audio/transcriptions", self.base_url);
        let part = Part::bytes(audio.to_vec())
            .file_name(file_name.to_owned())
            .mime_str(mime_for(file_name))
            .map_err(|e| ReelError::alignment(format!("invalid audio part: {e}")))?;
        let form = Form::new()
            .part("file", part)
            .text("model", "whisper-1")
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| ReelError::alignment(format!("request to '{url}' failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(ReelError::alignment(http::failure_detail(resp)));
        }
        let out: TranscriptionOut = resp
            .json()
            .map_err(|e| ReelError::alignment(format!("transcription json parse failed: {e}")))?;
        tracing::debug!(words = out.words.len(), "aligned narration");
        Ok(out.words)
    }
}

fn mime_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}
