//! External collaborators consumed by the pipeline.
//!
//! Each capability is an object-safe trait used through `Arc<dyn ...>`, with one blocking HTTP
//! adapter per trait. Tests substitute in-process fakes.

pub mod align;
pub mod fetch;
pub mod speech;
pub mod storage;

mod http;

pub use align::{SpeechAligner, WhisperAligner, WordTiming};
pub use fetch::{HttpFetcher, RemoteFetcher};
pub use speech::{ElevenLabsSynthesizer, SpeechAudio, SpeechSynthesizer};
pub use storage::{CloudinaryStore, ObjectStore};
