pub mod http_sink;

use async_trait::async_trait;
use thiserror::Error;

use crate::document::RateDocument;

/// Errors surfaced by an index write.
///
/// All of these are recoverable from the pipeline's point of view: the record
/// stays unacknowledged and the feed redelivers it.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("index write failed: {0}")]
    Http(reqwest::Error),

    #[error("index write rejected with status {code}")]
    Status { code: u16 },

    #[error("index write timed out")]
    Timeout,
}

/// Durable, searchable store for accepted rates.
///
/// `write` either durably succeeds or returns an error; no partial-write
/// state is exposed. Writes with the same `doc_id` must be idempotent.
#[async_trait]
pub trait IndexSink: Send + Sync {
    async fn write(&self, doc_id: &str, doc: &RateDocument) -> Result<(), SinkError>;
}
