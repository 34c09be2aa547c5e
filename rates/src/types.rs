use std::fmt;

use serde::{Deserialize, Serialize};

/// One observed quote for a tradable symbol.
///
/// `timestamp` is an opaque, symbol-scoped string. It is used for display and
/// as part of the persisted document's identity, never parsed or compared as
/// a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub symbol: String,
    pub ask: f64,
    pub bid: f64,
    pub timestamp: String,
}

impl Rate {
    pub fn new(
        symbol: impl Into<String>,
        ask: f64,
        bid: f64,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            ask,
            bid,
            timestamp: timestamp.into(),
        }
    }

    /// Mid-price: arithmetic mean of ask and bid, computed fresh each call.
    pub fn mid(&self) -> f64 {
        (self.ask + self.bid) / 2.0
    }

    /// Whether this record may enter the filter at all.
    ///
    /// Ask and bid must be finite, non-negative numbers and the symbol must be
    /// non-empty. No ordering between ask and bid is enforced.
    pub fn is_well_formed(&self) -> bool {
        !self.symbol.is_empty()
            && self.ask.is_finite()
            && self.bid.is_finite()
            && self.ask >= 0.0
            && self.bid >= 0.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} || bid:{} || ask:{} || {}",
            self.symbol, self.bid, self.ask, self.timestamp
        )
    }
}
