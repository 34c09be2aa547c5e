use std::collections::HashSet;

/// Configuration knobs for the outlier filter.
///
/// These are injected into [`crate::outlier::OutlierFilter::new`] rather than
/// read from process-wide state, so tests and partitioned workers can carry
/// different settings.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Maximum allowed relative mid-price deviation from the baseline.
    ///
    /// A new rate whose mid-price moves by more than this fraction of the
    /// last accepted mid-price is treated as an outlier. Expressed as a
    /// fraction, not percent: 0.01 == 1%.
    pub threshold: f64,

    /// Number of back-to-back rejections after which the next outlier is
    /// accepted anyway ("forced acceptance").
    ///
    /// Bounds the worst case: a genuine market move is delayed by at most
    /// this many observations before the baseline catches up.
    pub max_consecutive_outliers: u32,

    /// Allow-list of instruments the filter tracks. Symbols outside this set
    /// never create per-symbol state.
    pub supported_symbols: HashSet<String>,
}

impl FilterConfig {
    pub fn is_supported(&self, symbol: &str) -> bool {
        self.supported_symbols.contains(symbol)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            max_consecutive_outliers: 5,
            supported_symbols: ["USDTRY", "EURTRY", "GBPTRY"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let cfg = FilterConfig::default();
        assert_eq!(cfg.threshold, 0.01);
        assert_eq!(cfg.max_consecutive_outliers, 5);
        assert!(cfg.is_supported("USDTRY"));
        assert!(cfg.is_supported("EURTRY"));
        assert!(cfg.is_supported("GBPTRY"));
        assert!(!cfg.is_supported("USDJPY"));
    }
}
