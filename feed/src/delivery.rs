//! Delivery and acknowledgment types shared between feeds and the pipeline.

use rates::types::Rate;
use tokio::sync::oneshot;

/// One record handed to the pipeline, paired with its acknowledgment handle.
#[derive(Debug)]
pub struct Delivery {
    pub rate: Rate,
    pub ack: AckHandle,
}

/// Opaque acknowledgment handle for a single delivery.
///
/// `commit` marks the record as durably processed. Dropping the handle
/// without committing signals the feed to redeliver the same record.
#[derive(Debug)]
pub struct AckHandle {
    tx: oneshot::Sender<()>,
}

impl AckHandle {
    /// Create a handle plus the receiver the feed waits on.
    pub fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Mark the delivery as durably processed.
    pub fn commit(self) {
        // The feed having gone away is not our problem.
        let _ = self.tx.send(());
    }
}
