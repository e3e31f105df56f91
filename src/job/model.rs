use std::fmt;

use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};

/// Opaque job identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh random id (16 lowercase hex chars).
    pub fn generate() -> Self {
        let n: u64 = rand::thread_rng().r#gen();
        Self(format!("{n:016x}"))
    }

    /// Wrap an existing id. Only `[A-Za-z0-9_-]` is accepted so ids are safe in file names.
    pub fn new(id: impl Into<String>) -> ReelResult<Self> {
        let id = id.into();
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ReelError::validation(format!("invalid job id '{id}'")));
        }
        Ok(Self(id))
    }

    /// Borrow the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two supported input shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Scripted multi-character dialogue.
    Dialogue,
    /// A single narrated social-media post.
    NarratedPost,
}

/// One ordered line of dialogue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueLine {
    /// Speaker identity; selects both voice and character art.
    #[serde(alias = "character")]
    pub speaker: String,
    /// Spoken and captioned text.
    pub text: String,
    /// Where the speaker art is placed (`center`, `left`, `top-right`, ...).
    #[serde(default, alias = "imagePlacement")]
    pub placement: Option<String>,
}

/// A narrated post: title, optional body and optional display metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NarratedPost {
    /// Post title. Always narrated first.
    pub title: String,
    /// Post body. Empty bodies produce a card-only video.
    pub body: Option<String>,
    /// Author handle shown on the card.
    pub handle: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Whether the author carries a verification mark.
    pub verified: bool,
    /// Upvote count.
    pub upvotes: Option<u64>,
    /// Comment count.
    pub comments: Option<u64>,
    /// Pre-rendered card as a `data:image/...;base64,` URL. Skips card drawing when present.
    #[serde(alias = "image_data_url", alias = "imageDataUrl")]
    pub card_image: Option<String>,
}

impl NarratedPost {
    /// Body text with surrounding whitespace removed; `None` when empty.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }
}

/// Job content payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JobContent {
    /// Ordered dialogue lines.
    Dialogue {
        /// Lines in playback order.
        lines: Vec<DialogueLine>,
    },
    /// A single narrated post.
    NarratedPost {
        /// The post.
        post: NarratedPost,
    },
}

impl JobContent {
    /// The job kind this content belongs to.
    pub fn kind(&self) -> JobKind {
        match self {
            Self::Dialogue { .. } => JobKind::Dialogue,
            Self::NarratedPost { .. } => JobKind::NarratedPost,
        }
    }

    /// Reject empty required content before any resource is allocated.
    pub fn validate(&self) -> ReelResult<()> {
        match self {
            Self::Dialogue { lines } => {
                if lines.is_empty() {
                    return Err(ReelError::validation("dialogue has no lines"));
                }
                for (i, line) in lines.iter().enumerate() {
                    if line.text.trim().is_empty() {
                        return Err(ReelError::validation(format!(
                            "dialogue line {i} has empty text"
                        )));
                    }
                    if line.speaker.trim().is_empty() {
                        return Err(ReelError::validation(format!(
                            "dialogue line {i} has no speaker"
                        )));
                    }
                }
                Ok(())
            }
            Self::NarratedPost { post } => {
                if post.title.trim().is_empty() {
                    return Err(ReelError::validation("narrated post has no title"));
                }
                Ok(())
            }
        }
    }
}

/// Lifecycle of a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Enqueued, not yet picked up.
    Pending,
    /// A worker is executing it.
    Running,
    /// Finished with a result reference.
    Succeeded,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    /// Return `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Status-query view of one job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job identity.
    pub id: JobId,
    /// Job kind.
    pub kind: JobKind,
    /// Lifecycle state.
    pub status: JobStatus,
    /// Latest human-readable progress string.
    pub stage: Option<String>,
    /// Published video URL on success.
    pub result_url: Option<String>,
    /// Short error message on failure.
    pub error: Option<String>,
}

/// Successful job result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutput {
    /// Durable reference returned by the object store.
    pub video_url: String,
}

#[cfg(test)]
#[path = "../../tests/unit/job/model.rs"]
mod tests;
