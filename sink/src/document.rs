//! Persisted document shape and deterministic document identity.

use chrono::Utc;
use serde::Serialize;

use rates::types::Rate;

/// Body persisted into the search index for one accepted rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDocument {
    pub symbol: String,
    pub ask: f64,
    pub bid: f64,
    /// Timestamp carried on the rate itself.
    pub rate_time: String,
    /// Wall clock at write time, RFC 3339.
    pub inserted_at: String,
}

impl RateDocument {
    pub fn from_rate(rate: &Rate) -> Self {
        Self {
            symbol: rate.symbol.clone(),
            ask: rate.ask,
            bid: rate.bid,
            rate_time: rate.timestamp.clone(),
            inserted_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Deterministic document id: `symbol:timestamp`.
///
/// Determinism makes redelivered writes idempotent upserts rather than
/// duplicate documents.
pub fn document_id(rate: &Rate) -> String {
    format!("{}:{}", rate.symbol, rate.timestamp)
}
