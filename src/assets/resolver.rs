//! Maps job inputs to local files inside the job workspace.

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine as _;

use crate::assets::card::CardPainter;
use crate::assets::text_raster::TextRasterizer;
use crate::capability::{RemoteFetcher, SpeechSynthesizer};
use crate::config::PipelineConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::model::NarratedPost;
use crate::workspace::Workspace;

/// Fetches or synthesizes every raw input of a job. Holds no timing logic.
#[derive(Clone)]
pub struct AssetResolver {
    config: Arc<PipelineConfig>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    fetcher: Arc<dyn RemoteFetcher>,
    text: Arc<TextRasterizer>,
}

impl AssetResolver {
    /// Resolver over the given configuration and capabilities.
    pub fn new(
        config: Arc<PipelineConfig>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        fetcher: Arc<dyn RemoteFetcher>,
        text: Arc<TextRasterizer>,
    ) -> Self {
        Self {
            config,
            synthesizer,
            fetcher,
            text,
        }
    }

    /// Synthesize `text` with the named voice into `speech.<ext>` in the workspace.
    pub fn synthesize_speech(
        &self,
        ws: &mut Workspace,
        text: &str,
        voice: &str,
    ) -> ReelResult<PathBuf> {
        let voice_id = self.config.voice_id(voice)?;
        let audio = self.synthesizer.synthesize(text, voice_id)?;
        let ext = sanitize_ext(&audio.extension).unwrap_or("mp3");
        ws.write(&format!("speech.{ext}"), &audio.bytes)
    }

    /// Download `url` into the workspace, keeping the URL's file extension.
    pub fn fetch_remote(&self, ws: &mut Workspace, url: &str) -> ReelResult<PathBuf> {
        let ext = url_extension(url).unwrap_or("bin");
        let dest = ws.alloc(&format!("remote.{ext}"))?;
        self.fetcher.fetch_to(url, &dest)?;
        Ok(dest)
    }

    /// Download the named background (unknown or absent names use the default background).
    pub fn resolve_background(&self, ws: &mut Workspace, name: Option<&str>) -> ReelResult<PathBuf> {
        let url = self.config.background_url(name)?;
        self.fetch_remote(ws, url)
    }

    /// Copy the speaker's character art into the workspace.
    pub fn character_art(&self, ws: &mut Workspace, speaker: &str) -> ReelResult<PathBuf> {
        let src = self.config.characters.get(speaker).ok_or_else(|| {
            ReelError::validation(format!("no character art configured for '{speaker}'"))
        })?;
        let bytes = std::fs::read(src).map_err(|e| {
            ReelError::fetch(format!(
                "failed to read character art '{}': {e}",
                src.display()
            ))
        })?;
        let ext = src
            .extension()
            .and_then(|e| e.to_str())
            .and_then(sanitize_ext)
            .unwrap_or("png");
        ws.write(&format!("art_{}.{ext}", file_stem_safe(speaker)), &bytes)
    }

    /// Produce the post card image: the pre-rendered data URL when present, otherwise a drawn card.
    pub fn render_post_card(&self, ws: &mut Workspace, post: &NarratedPost) -> ReelResult<PathBuf> {
        if let Some(data_url) = post.card_image.as_deref().filter(|s| !s.trim().is_empty()) {
            let (ext, bytes) = decode_data_url(data_url)?;
            return ws.write(&format!("card.{ext}"), &bytes);
        }

        let avatar = match post.avatar_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => match self.fetch_remote(ws, url) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(url, error = %e, "avatar fetch failed, using default");
                    None
                }
            },
            None => None,
        };

        let dest = ws.alloc("card.png")?;
        CardPainter::new(&self.text, &self.config.post_card).paint(post, avatar.as_deref(), &dest)?;
        Ok(dest)
    }
}

/// Decode a `data:image/<type>;base64,<payload>` URL into a file extension and bytes.
pub fn decode_data_url(url: &str) -> ReelResult<(&'static str, Vec<u8>)> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| ReelError::validation("card image is not a data: URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ReelError::validation("card image data URL has no payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ReelError::validation("card image data URL must be base64-encoded"))?;
    let ext = match mime.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        other => {
            return Err(ReelError::validation(format!(
                "unsupported card image type '{other}'"
            )));
        }
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ReelError::validation(format!("card image base64 is invalid: {e}")))?;
    Ok((ext, bytes))
}

/// Lowercase alphanumeric extension of the URL path's last segment.
pub(crate) fn url_extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    sanitize_ext(ext)
}

fn sanitize_ext(ext: &str) -> Option<&str> {
    (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

fn file_stem_safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolver.rs"]
mod tests;
