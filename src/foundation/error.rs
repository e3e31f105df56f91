/// Convenience result type used across reelsmith.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy for the job pipeline.
///
/// Variants map onto three retry classes (see [`ErrorClass`]); the pipeline itself never retries.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid job content, options or configuration. Raised before any resource is allocated.
    #[error("validation error: {0}")]
    Validation(String),

    /// A remote resource could not be downloaded.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The speech-synthesis capability failed.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Word-level alignment failed or did not match the narrated text.
    #[error("alignment error: {0}")]
    Alignment(String),

    /// Composition or encoding failed.
    #[error("render error: {0}")]
    Render(String),

    /// Upload to object storage failed.
    #[error("publish error: {0}")]
    Publish(String),

    /// The per-job workspace could not be created or removed.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification used by callers to pick a retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself is wrong; retrying cannot help.
    Validation,
    /// An external capability failed; a retry may succeed.
    External,
    /// A local failure (encoder, filesystem, bug).
    Internal,
}

impl ErrorClass {
    /// Return `true` when a caller may reasonably retry the job.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::External)
    }
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`ReelError::Synthesis`] value.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`ReelError::Alignment`] value.
    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Publish`] value.
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    /// Build a [`ReelError::Workspace`] value.
    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    /// Retry class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::Validation,
            Self::Fetch(_) | Self::Synthesis(_) | Self::Alignment(_) | Self::Publish(_) => {
                ErrorClass::External
            }
            Self::Render(_) | Self::Workspace(_) | Self::Other(_) => ErrorClass::Internal,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
