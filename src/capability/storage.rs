//! Object-storage publish capability.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest as _, Sha256};

use crate::foundation::error::{ReelError, ReelResult};

use super::http;

/// Uploads a finished file and returns a durable URL.
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `path`. `mime_hint` is e.g. `video/mp4`. Failures are [`ReelError::Publish`].
    fn upload(&self, path: &Path, mime_hint: &str) -> ReelResult<String>;
}

/// Production endpoint of the Cloudinary upload API.
pub const CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com";

/// Signed Cloudinary uploads.
#[derive(Clone, Debug)]
pub struct CloudinaryStore {
    client: reqwest::blocking::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: Option<String>,
}

#[derive(serde::Deserialize)]
struct UploadOut {
    secure_url: Option<String>,
}

impl CloudinaryStore {
    /// Store against the production endpoint.
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> ReelResult<Self> {
        Self::with_base_url(cloud_name, api_key, api_secret, CLOUDINARY_BASE_URL)
    }

    /// Store against an arbitrary base URL.
    pub fn with_base_url(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> ReelResult<Self> {
        Ok(Self {
            client: http::blocking_client(Duration::from_secs(600))?,
            base_url: http::trim_base(base_url),
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: None,
        })
    }

    /// Upload into `folder`.
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    fn sign(&self, params: &[(&str, String)]) -> String {
        sign_params(params, &self.api_secret)
    }
}

/// Cloudinary signature: sorted `k=v` pairs joined by `&`, secret appended, SHA-256 hex.
pub(crate) fn sign_params(params: &[(&str, String)], secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

pub(crate) fn resource_type(mime_hint: &str) -> &'static str {
    match mime_hint.split('/').next() {
        Some("video") | Some("audio") => "video",
        Some("image") => "image",
        _ => "raw",
    }
}

impl ObjectStore for CloudinaryStore {
    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    fn upload(&self, path: &Path, mime_hint: &str) -> ReelResult<String> {
        use reqwest::blocking::multipart::{Form, Part};

        let bytes = std::fs::read(path).map_err(|e| {
            ReelError::publish(format!("failed to read '{}': {e}", path.display()))
        })?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
            .to_string();

        let mut params = vec![("timestamp", timestamp)];
        if let Some(folder) = &self.folder {
            params.push(("folder", folder.clone()));
        }
        let signature = self.sign(&params);

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_owned());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_hint)
            .map_err(|e| ReelError::publish(format!("invalid mime hint '{mime_hint}': {e}")))?;
        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (k, v) in params {
            form = form.text(k, v);
        }

        let url = format!(
            "{}/v1_1/{}/{}/upload",
            self.base_url,
            self.cloud_name,
            resource_type(mime_hint)
        );
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| ReelError::publish(format!("upload to '{url}' failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(ReelError::publish(http::failure_detail(resp)));
        }
        let out: UploadOut = resp
            .json()
            .map_err(|e| ReelError::publish(format!("upload response parse failed: {e}")))?;
        let url = out
            .secure_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ReelError::publish("upload response has no secure_url"))?;
        tracing::info!(url = %url, "published");
        Ok(url)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capability/storage.rs"]
mod tests;
