pub mod channel;
pub mod delivery;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::delivery::Delivery;

/// High-level abstraction for the inbound rate stream.
///
/// Implementations push decoded records, each paired with an acknowledgment
/// handle, in per-symbol order. A record whose handle is dropped uncommitted
/// must be redelivered (at-least-once). `run` returns once the source is
/// exhausted or the receiving side has gone away.
#[async_trait]
pub trait RateFeed: Send + Sync {
    async fn run(self, tx: Sender<Delivery>) -> anyhow::Result<()>;
}
