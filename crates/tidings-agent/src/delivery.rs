// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered event queue between the generation task and its reader.
//!
//! Events are tagged with the epoch of the generation that produced them.
//! Accepting a new generation advances the epoch, which discards anything
//! still queued from earlier generations.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tidings_core::types::GenerationEvent;
use tokio::sync::{Mutex, mpsc};
use tracing::trace;

type Tagged = (u64, GenerationEvent);

/// Unbounded FIFO of generation events with a single logical reader.
pub struct DeliveryChannel {
    tx: mpsc::UnboundedSender<Tagged>,
    rx: Mutex<mpsc::UnboundedReceiver<Tagged>>,
    epoch: AtomicU64,
}

impl DeliveryChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            epoch: AtomicU64::new(0),
        }
    }

    /// Epoch of the generation currently allowed to publish.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Starts a new epoch. Events from older epochs are dropped on read.
    pub(crate) fn begin_epoch(&self, epoch: u64) {
        self.epoch.store(epoch, Ordering::Release);
    }

    /// Queues an event for `epoch`. Events from a superseded epoch are dropped.
    pub(crate) fn publish(&self, epoch: u64, event: GenerationEvent) {
        if epoch != self.epoch() {
            trace!(epoch, "dropping event from superseded generation");
            return;
        }
        // The receiver lives as long as `self`, so sending cannot fail.
        let _ = self.tx.send((epoch, event));
    }

    /// Waits up to `timeout` for the next current-epoch event.
    pub async fn poll(&self, timeout: Duration) -> Option<GenerationEvent> {
        let mut rx = self.rx.lock().await;
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some((epoch, event))) if epoch == self.epoch() => return Some(event),
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => return None,
            }
        }
    }

    /// Returns the next current-epoch event without waiting.
    pub async fn try_next(&self) -> Option<GenerationEvent> {
        let mut rx = self.rx.lock().await;
        while let Ok((epoch, event)) = rx.try_recv() {
            if epoch == self.epoch() {
                return Some(event);
            }
        }
        None
    }
}

impl Default for DeliveryChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Publishing handle bound to one generation.
#[derive(Clone)]
pub(crate) struct EventSink {
    channel: Arc<DeliveryChannel>,
    epoch: u64,
}

impl EventSink {
    pub(crate) fn new(channel: Arc<DeliveryChannel>, epoch: u64) -> Self {
        Self { channel, epoch }
    }

    pub(crate) fn chunk(&self, text: impl Into<String>) {
        self.channel.publish(self.epoch, GenerationEvent::chunk(text));
    }

    pub(crate) fn terminal(&self, event: GenerationEvent) {
        self.channel.publish(self.epoch, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn events_arrive_in_order() {
        let channel = DeliveryChannel::new();
        channel.begin_epoch(1);
        channel.publish(1, GenerationEvent::chunk("a"));
        channel.publish(1, GenerationEvent::chunk("b"));

        let timeout = Duration::from_millis(100);
        assert_eq!(channel.poll(timeout).await, Some(GenerationEvent::chunk("a")));
        assert_eq!(channel.poll(timeout).await, Some(GenerationEvent::chunk("b")));
        assert_eq!(channel.poll(timeout).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn new_epoch_discards_pending_events() {
        let channel = DeliveryChannel::new();
        channel.begin_epoch(1);
        channel.publish(1, GenerationEvent::chunk("stale"));

        channel.begin_epoch(2);
        channel.publish(1, GenerationEvent::chunk("late"));
        channel.publish(2, GenerationEvent::chunk("fresh"));

        assert_eq!(
            channel.poll(Duration::from_millis(100)).await,
            Some(GenerationEvent::chunk("fresh"))
        );
        assert_eq!(channel.try_next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_wakes_on_publish() {
        let channel = Arc::new(DeliveryChannel::new());
        channel.begin_epoch(1);

        let publisher = Arc::clone(&channel);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            publisher.publish(1, GenerationEvent::chunk("x"));
        });

        let event = channel.poll(Duration::from_secs(1)).await;
        assert_eq!(event, Some(GenerationEvent::chunk("x")));
    }
}
