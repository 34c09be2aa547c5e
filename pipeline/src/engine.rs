//! The pipeline engine.
//!
//! For each delivered record, it:
//!   1. Runs the outlier filter.
//!   2. On `Forward`, writes the document to the index sink.
//!   3. Maps the outcome onto the acknowledgment protocol: commit on
//!      `Forwarded` / `Suppressed` / `Unsupported`, leave uncommitted on
//!      `SinkFailed` so the feed redelivers the record.
//!
//! The engine drains one delivery channel sequentially, which preserves the
//! feed's per-symbol ordering. Several engines over disjoint partitions may
//! run concurrently against a shared filter; cross-symbol evaluations then
//! proceed in parallel.

use std::sync::Arc;

use tracing::{Instrument, debug, error, info};

use common::logger::{TraceId, child_span, delivery_span};
use feed::delivery::Delivery;
use rates::outlier::{Evaluation, OutlierFilter};
use rates::types::Rate;
use sink::document::{RateDocument, document_id};
use sink::store::IndexSink;

/// What happened to one record, inspected to decide acknowledge-vs-redeliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Accepted by the filter and durably indexed.
    Forwarded,
    /// Rejected as an outlier; fully processed, nothing indexed.
    Suppressed,
    /// Symbol outside the allow-list; fully processed, nothing indexed.
    Unsupported,
    /// Accepted by the filter but the index write failed; redeliver.
    SinkFailed,
}

pub struct PipelineEngine<S: IndexSink> {
    filter: Arc<OutlierFilter>,
    sink: Arc<S>,
}

impl<S: IndexSink> PipelineEngine<S> {
    pub fn new(filter: Arc<OutlierFilter>, sink: Arc<S>) -> Self {
        Self { filter, sink }
    }

    /// Sequence one record through filter then sink.
    pub async fn process(&self, rate: &Rate) -> RecordOutcome {
        match self.filter.evaluate(rate) {
            Evaluation::Unsupported => {
                debug!(rate = %rate, "skipped unsupported symbol");
                RecordOutcome::Unsupported
            }
            Evaluation::Suppress => {
                debug!(rate = %rate, "suppressed outlier");
                RecordOutcome::Suppressed
            }
            Evaluation::Forward => {
                let doc_id = document_id(rate);
                let doc = RateDocument::from_rate(rate);

                let write = self
                    .sink
                    .write(&doc_id, &doc)
                    .instrument(child_span("index-write"));

                match write.await {
                    Ok(()) => {
                        info!(doc_id = %doc_id, "rate indexed");
                        RecordOutcome::Forwarded
                    }
                    Err(e) => {
                        error!(doc_id = %doc_id, error = %e, "index write failed");
                        RecordOutcome::SinkFailed
                    }
                }
            }
        }
    }

    /// Drain deliveries until the channel closes.
    ///
    /// Closing the feed side is the graceful-shutdown signal: the in-flight
    /// record finishes, then the loop exits.
    pub async fn run(&self, mut rx: tokio::sync::mpsc::Receiver<Delivery>) {
        while let Some(Delivery { rate, ack }) = rx.recv().await {
            let trace_id = TraceId::default();
            let span = delivery_span(&trace_id);

            let outcome = self.process(&rate).instrument(span).await;

            match outcome {
                // Leave the handle uncommitted: the feed redelivers.
                RecordOutcome::SinkFailed => drop(ack),
                _ => ack.commit(),
            }
        }

        info!("delivery channel closed, pipeline stopping");
    }
}
