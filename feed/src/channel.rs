//! ChannelFeed
//!
//! In-process implementation of [`RateFeed`] backed by an mpsc source.
//!
//! Responsibilities:
//!   • Drop malformed records at the boundary (the filter only ever sees
//!     well-formed rates)
//!   • Pair every record with an acknowledgment handle
//!   • Redeliver a record whose handle was dropped uncommitted, after a
//!     short pause, until it is committed (at-least-once)
//!
//! Per-symbol ordering holds because records are taken from the source one
//! at a time and the next record is not sent until the current one has been
//! committed.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::warn;

use rates::types::Rate;

use crate::RateFeed;
use crate::delivery::{AckHandle, Delivery};

pub const DEFAULT_REDELIVERY_DELAY: Duration = Duration::from_millis(200);

pub struct ChannelFeed {
    source: Receiver<Rate>,
    redelivery_delay: Duration,
}

impl ChannelFeed {
    pub fn new(source: Receiver<Rate>) -> Self {
        Self {
            source,
            redelivery_delay: DEFAULT_REDELIVERY_DELAY,
        }
    }

    pub fn with_redelivery_delay(mut self, delay: Duration) -> Self {
        self.redelivery_delay = delay;
        self
    }
}

#[async_trait]
impl RateFeed for ChannelFeed {
    async fn run(mut self, tx: Sender<Delivery>) -> anyhow::Result<()> {
        while let Some(rate) = self.source.recv().await {
            if !rate.is_well_formed() {
                warn!(rate = %rate, "malformed record dropped at feed boundary");
                continue;
            }

            let mut attempt: u32 = 0;
            loop {
                attempt += 1;

                let (ack, committed) = AckHandle::channel();
                let delivery = Delivery {
                    rate: rate.clone(),
                    ack,
                };

                if tx.send(delivery).await.is_err() {
                    // Pipeline has shut down; nothing left to deliver to.
                    return Ok(());
                }

                match committed.await {
                    Ok(()) => break,
                    Err(_) => {
                        warn!(
                            symbol = %rate.symbol,
                            attempt,
                            "delivery not committed, redelivering"
                        );
                        tokio::time::sleep(self.redelivery_delay).await;
                    }
                }
            }
        }

        Ok(())
    }
}
