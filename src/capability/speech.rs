//! Text-to-speech capability.

use std::time::Duration;

use crate::foundation::error::{ReelError, ReelResult};

use super::http;

/// Encoded speech returned by a synthesizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeechAudio {
    /// Encoded audio bytes.
    pub bytes: Vec<u8>,
    /// File extension matching the encoding (`mp3`, `wav`, ...), without the dot.
    pub extension: String,
}

/// Turns text into spoken audio with a provider voice.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice_id`. Never retries; failures are [`ReelError::Synthesis`].
    fn synthesize(&self, text: &str, voice_id: &str) -> ReelResult<SpeechAudio>;
}

/// Production endpoint of the ElevenLabs API.
pub const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
/// Model used for all voices.
pub const ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";

/// ElevenLabs text-to-speech over blocking HTTP.
#[derive(Clone, Debug)]
pub struct ElevenLabsSynthesizer {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model_id: String,
}

impl ElevenLabsSynthesizer {
    /// Client against the production endpoint.
    pub fn new(api_key: impl Into<String>) -> ReelResult<Self> {
        Self::with_base_url(api_key, ELEVENLABS_BASE_URL)
    }

    /// Client against an arbitrary base URL (mock servers, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> ReelResult<Self> {
        Ok(Self {
            client: http::blocking_client(http::DEFAULT_TIMEOUT)?,
            base_url: http::trim_base(base_url),
            api_key: api_key.into(),
            model_id: ELEVENLABS_MODEL.to_owned(),
        })
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> ReelResult<Self> {
        self.client = http::blocking_client(timeout)?;
        Ok(self)
    }
}

impl SpeechSynthesizer for ElevenLabsSynthesizer {
    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    fn synthesize(&self, text: &str, voice_id: &str) -> ReelResult<SpeechAudio> {
        let url = format!("{}/v1/text-to-speech/{voice_id}", self.base_url);
        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
        });
        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .map_err(|e| ReelError::synthesis(format!("request to '{url}' failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(ReelError::synthesis(format!(
                "voice '{voice_id}': {}",
                http::failure_detail(resp)
            )));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| ReelError::synthesis(format!("failed to read audio body: {e}")))?;
        if bytes.is_empty() {
            return Err(ReelError::synthesis(format!(
                "voice '{voice_id}': provider returned empty audio"
            )));
        }
        tracing::debug!(bytes = bytes.len(), "synthesized speech");
        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
            extension: "mp3".to_owned(),
        })
    }
}
