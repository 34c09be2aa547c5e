//! HttpIndexSink
//! --------------------
//! HTTP implementation of the [`IndexSink`] trait for OpenSearch-compatible
//! stores. One accepted rate becomes one `PUT {base_url}/{index}/_doc/{id}`
//! with a JSON body; the deterministic id makes redelivered writes upserts.
//!
//! A request timeout is reported as [`SinkError::Timeout`] and is never
//! retried here: retry is the feed's redelivery mechanism, not the sink's.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{IndexSink, SinkError};
use crate::document::RateDocument;

pub const DEFAULT_INDEX: &str = "rates";
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection parameters for the index store.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Base URL of the store, e.g. `http://localhost:9200`.
    pub base_url: String,
    /// Index documents are written into.
    pub index: String,
    /// Per-request timeout; elapsing it counts as a write failure.
    pub timeout: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9200".to_string(),
            index: DEFAULT_INDEX.to_string(),
            timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

pub struct HttpIndexSink {
    client: reqwest::Client,
    cfg: SinkConfig,
}

impl HttpIndexSink {
    pub fn new(cfg: SinkConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self { client, cfg })
    }

    fn doc_url(&self, doc_id: &str) -> String {
        format!(
            "{}/{}/_doc/{}",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.index,
            doc_id
        )
    }
}

#[async_trait]
impl IndexSink for HttpIndexSink {
    async fn write(&self, doc_id: &str, doc: &RateDocument) -> Result<(), SinkError> {
        let url = self.doc_url(doc_id);

        let response = self
            .client
            .put(&url)
            .json(doc)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SinkError::Timeout
                } else {
                    SinkError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                code: status.as_u16(),
            });
        }

        debug!(doc_id, index = %self.cfg.index, "document indexed");
        Ok(())
    }
}
