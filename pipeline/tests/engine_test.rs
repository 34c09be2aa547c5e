use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use feed::RateFeed;
use feed::channel::ChannelFeed;
use pipeline::engine::{PipelineEngine, RecordOutcome};
use rates::config::FilterConfig;
use rates::outlier::OutlierFilter;
use rates::types::Rate;
use sink::document::RateDocument;
use sink::store::{IndexSink, SinkError};

/// Scriptable in-memory sink: fails the first `fail_first` writes, then
/// records every successful write.
struct MockSink {
    fail_remaining: AtomicUsize,
    attempts: AtomicUsize,
    writes: Mutex<Vec<(String, RateDocument)>>,
}

impl MockSink {
    fn reliable() -> Self {
        Self::failing(0)
    }

    fn failing(fail_first: usize) -> Self {
        Self {
            fail_remaining: AtomicUsize::new(fail_first),
            attempts: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
        }
    }

    fn written_ids(&self) -> Vec<String> {
        self.writes.lock().iter().map(|(id, _)| id.clone()).collect()
    }
}

#[async_trait]
impl IndexSink for MockSink {
    async fn write(&self, doc_id: &str, doc: &RateDocument) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SinkError::Timeout);
        }

        self.writes.lock().push((doc_id.to_string(), doc.clone()));
        Ok(())
    }
}

fn engine(sink: Arc<MockSink>) -> PipelineEngine<MockSink> {
    common::logger::init_logger("pipeline-tests");
    let filter = Arc::new(OutlierFilter::new(FilterConfig::default()));
    PipelineEngine::new(filter, sink)
}

fn usdtry(ask: f64, bid: f64, ts: &str) -> Rate {
    Rate::new("USDTRY", ask, bid, ts)
}

#[tokio::test]
async fn accepted_rate_is_indexed_with_deterministic_id() {
    let sink = Arc::new(MockSink::reliable());
    let engine = engine(sink.clone());

    let outcome = engine.process(&usdtry(32.10, 32.00, "t1")).await;

    assert_eq!(outcome, RecordOutcome::Forwarded);
    assert_eq!(sink.written_ids(), vec!["USDTRY:t1".to_string()]);

    let writes = sink.writes.lock();
    let (_, doc) = &writes[0];
    assert_eq!(doc.symbol, "USDTRY");
    assert_eq!(doc.rate_time, "t1");
}

#[tokio::test]
async fn suppressed_outlier_never_reaches_the_sink() {
    let sink = Arc::new(MockSink::reliable());
    let engine = engine(sink.clone());

    engine.process(&usdtry(32.10, 32.00, "t1")).await;
    let outcome = engine.process(&usdtry(40.00, 39.90, "t2")).await;

    assert_eq!(outcome, RecordOutcome::Suppressed);
    assert_eq!(sink.written_ids(), vec!["USDTRY:t1".to_string()]);
}

#[tokio::test]
async fn unsupported_symbol_is_skipped_without_sink_write() {
    let sink = Arc::new(MockSink::reliable());
    let engine = engine(sink.clone());

    let outcome = engine
        .process(&Rate::new("USDJPY", 150.0, 149.9, "t1"))
        .await;

    assert_eq!(outcome, RecordOutcome::Unsupported);
    assert!(sink.written_ids().is_empty());
}

#[tokio::test]
async fn sink_failure_maps_to_sink_failed() {
    let sink = Arc::new(MockSink::failing(1));
    let engine = engine(sink.clone());

    let outcome = engine.process(&usdtry(32.10, 32.00, "t1")).await;

    assert_eq!(outcome, RecordOutcome::SinkFailed);
    assert!(sink.written_ids().is_empty());
    // Filter state advanced: a redelivered identical record re-confirms
    // the same baseline and is forwarded again.
    let outcome = engine.process(&usdtry(32.10, 32.00, "t1")).await;
    assert_eq!(outcome, RecordOutcome::Forwarded);
}

#[tokio::test]
async fn run_commits_suppressed_and_unsupported_records() {
    let sink = Arc::new(MockSink::reliable());
    let engine = engine(sink.clone());

    let (src_tx, src_rx) = mpsc::channel(8);
    let (tx, rx) = mpsc::channel(8);

    let engine_handle = tokio::spawn(async move { engine.run(rx).await });
    let feed = ChannelFeed::new(src_rx).with_redelivery_delay(Duration::from_millis(5));
    let feed_handle = tokio::spawn(feed.run(tx));

    src_tx.send(usdtry(32.10, 32.00, "t1")).await.unwrap(); // forwarded
    src_tx.send(usdtry(40.00, 39.90, "t2")).await.unwrap(); // suppressed
    src_tx
        .send(Rate::new("USDJPY", 150.0, 149.9, "t3")) // unsupported
        .await
        .unwrap();
    drop(src_tx);

    // The feed only finishes if every record was committed exactly once.
    feed_handle.await.unwrap().unwrap();
    engine_handle.await.unwrap();

    assert_eq!(sink.written_ids(), vec!["USDTRY:t1".to_string()]);
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_sink_write_is_redelivered_until_indexed() {
    let sink = Arc::new(MockSink::failing(2));
    let engine = engine(sink.clone());

    let (src_tx, src_rx) = mpsc::channel(8);
    let (tx, rx) = mpsc::channel(8);

    let engine_handle = tokio::spawn(async move { engine.run(rx).await });
    let feed = ChannelFeed::new(src_rx).with_redelivery_delay(Duration::from_millis(5));
    let feed_handle = tokio::spawn(feed.run(tx));

    src_tx.send(usdtry(32.10, 32.00, "t1")).await.unwrap();
    drop(src_tx);

    feed_handle.await.unwrap().unwrap();
    engine_handle.await.unwrap();

    // Two failed attempts, then the redelivered record lands.
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(sink.written_ids(), vec!["USDTRY:t1".to_string()]);
}
