use std::time::Duration;

use crate::foundation::error::{ReelError, ReelResult};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest response body excerpt carried in error messages.
const EXCERPT_CHARS: usize = 300;

pub(crate) fn blocking_client(timeout: Duration) -> ReelResult<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .user_agent(concat!("reelsmith/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ReelError::Other(anyhow::anyhow!("failed to build http client: {e}")))
}

/// Status plus a bounded, single-line excerpt of a failed response body.
pub(crate) fn failure_detail(resp: reqwest::blocking::Response) -> String {
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    let mut excerpt: String = body.trim().chars().take(EXCERPT_CHARS).collect();
    excerpt = excerpt.replace(['\n', '\r'], " ");
    if excerpt.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {excerpt}")
    }
}

pub(crate) fn trim_base(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_owned()
}
