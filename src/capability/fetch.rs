//! Remote download capability.

use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};

use super::http;

/// Streams a remote resource into a local file.
pub trait RemoteFetcher: Send + Sync {
    /// Download `url` into `dest`, returning the byte count. Failures are [`ReelError::Fetch`].
    fn fetch_to(&self, url: &str, dest: &Path) -> ReelResult<u64>;
}

/// Plain blocking HTTP(S) GET.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Fetcher with the default timeouts.
    pub fn new() -> ReelResult<Self> {
        Ok(Self {
            client: http::blocking_client(http::DEFAULT_TIMEOUT)?,
        })
    }
}

impl RemoteFetcher for HttpFetcher {
    #[tracing::instrument(skip(self, dest))]
    fn fetch_to(&self, url: &str, dest: &Path) -> ReelResult<u64> {
        let mut resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| ReelError::fetch(format!("GET '{url}' failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(ReelError::fetch(format!(
                "GET '{url}': {}",
                http::failure_detail(resp)
            )));
        }
        let mut file = std::fs::File::create(dest).map_err(|e| {
            ReelError::fetch(format!("failed to create '{}': {e}", dest.display()))
        })?;
        let n = std::io::copy(&mut resp, &mut file).map_err(|e| {
            ReelError::fetch(format!("failed to stream '{url}' to '{}': {e}", dest.display()))
        })?;
        tracing::debug!(bytes = n, dest = %dest.display(), "fetched remote resource");
        Ok(n)
    }
}
