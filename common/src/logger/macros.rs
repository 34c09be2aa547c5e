use super::TraceId;
use tracing::{Level, Span};

/// Create a root span for one record delivery
pub fn delivery_span(trace_id: &TraceId) -> Span {
    tracing::span!(
        Level::INFO,
        "delivery",
        trace_id = %trace_id.as_str()
    )
}

/// Create a child span (inherits trace_id automatically)
pub fn child_span(stage: &'static str) -> Span {
    tracing::span!(Level::INFO, "stage", stage)
}
