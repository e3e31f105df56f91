//! Job identity, status tracking, progress reporting and the worker queue.

/// Job ids, content payloads and status records.
pub mod model;
/// Best-effort stage reporting.
pub mod progress;
pub mod queue;
/// In-memory job status store.
pub mod store;
