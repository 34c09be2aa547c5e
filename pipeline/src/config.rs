use std::collections::HashSet;
use std::time::Duration;

use rates::config::FilterConfig;
use sink::store::http_sink::SinkConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Outlier filter knobs (threshold, override limit, allow-list).
    pub filter: FilterConfig,

    /// Index store connection parameters.
    pub sink: SinkConfig,

    // =========================
    // Stream configuration
    // =========================
    /// Topic the upstream averaged-rate stream publishes to.
    pub topic: String,

    /// Consumer group identity; redelivery and offset tracking are scoped
    /// to this group.
    pub group_id: String,

    /// Capacity of the async channel between feed and pipeline.
    ///
    /// Acts as backpressure:
    /// - if the sink slows down, the feed naturally blocks
    /// - prevents unbounded memory growth
    pub delivery_queue_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let filter = FilterConfig {
            threshold: env_parsed("OUTLIER_THRESHOLD", 0.01),
            max_consecutive_outliers: env_parsed("OUTLIER_MAX_CONSECUTIVE", 5),
            supported_symbols: std::env::var("SUPPORTED_SYMBOLS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect::<HashSet<_>>()
                })
                .unwrap_or_else(|_| FilterConfig::default().supported_symbols),
        };

        let sink = SinkConfig {
            base_url: std::env::var("SINK_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:9200".to_string()),
            index: std::env::var("SINK_INDEX").unwrap_or_else(|_| "rates".to_string()),
            timeout: Duration::from_millis(env_parsed("SINK_TIMEOUT_MS", 5_000)),
        };

        Self {
            filter,
            sink,
            topic: std::env::var("RATES_TOPIC").unwrap_or_else(|_| "avg-data".to_string()),
            group_id: std::env::var("RATES_GROUP_ID")
                .unwrap_or_else(|_| "os-consumers".to_string()),
            delivery_queue_capacity: env_parsed("DELIVERY_QUEUE_CAPACITY", 256),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
