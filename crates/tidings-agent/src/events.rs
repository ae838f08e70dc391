// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reader side of the delivery channel.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tidings_core::types::GenerationEvent;

use crate::controller::GenerationController;
use crate::delivery::DeliveryChannel;

/// Events of one generation, ending with exactly one terminal event.
pub type EventStream = Pin<Box<dyn Stream<Item = GenerationEvent> + Send>>;

struct EventReader {
    delivery: Arc<DeliveryChannel>,
    controller: Arc<GenerationController>,
    poll_interval: Duration,
    finished: bool,
}

impl EventReader {
    async fn next_event(&mut self) -> Option<GenerationEvent> {
        if self.finished {
            return None;
        }

        let event = loop {
            if let Some(event) = self.delivery.poll(self.poll_interval).await {
                break event;
            }
            if self.controller.is_running() {
                continue;
            }
            // Idle with nothing queued: a terminal event may have landed
            // between the timeout and the state check.
            break self
                .delivery
                .try_next()
                .await
                .unwrap_or(GenerationEvent::Done { output: None });
        };

        self.finished = event.is_terminal();
        Some(event)
    }
}

/// Reads events until a terminal event, or an implicit `done` once the
/// controller is idle and nothing is queued.
pub(crate) fn event_stream(
    delivery: Arc<DeliveryChannel>,
    controller: Arc<GenerationController>,
    poll_interval: Duration,
) -> EventStream {
    let reader = EventReader {
        delivery,
        controller,
        poll_interval,
        finished: false,
    };
    Box::pin(futures::stream::unfold(reader, |mut reader| async move {
        let event = reader.next_event().await?;
        Some((event, reader))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test(start_paused = true)]
    async fn idle_reader_ends_with_implicit_done() {
        let delivery = Arc::new(DeliveryChannel::new());
        let controller = Arc::new(GenerationController::new(Arc::clone(&delivery)));

        let events: Vec<_> = event_stream(delivery, controller, Duration::from_millis(100))
            .collect()
            .await;
        assert_eq!(events, vec![GenerationEvent::Done { output: None }]);
    }

    #[tokio::test(start_paused = true)]
    async fn reader_stops_after_terminal() {
        let delivery = Arc::new(DeliveryChannel::new());
        let controller = Arc::new(GenerationController::new(Arc::clone(&delivery)));
        let active = controller.try_begin().unwrap();
        active.sink().chunk("a");
        active.complete(GenerationEvent::Done {
            output: Some("a".into()),
        });

        let events: Vec<_> = event_stream(delivery, controller, Duration::from_millis(100))
            .collect()
            .await;
        assert_eq!(
            events,
            vec![
                GenerationEvent::chunk("a"),
                GenerationEvent::Done {
                    output: Some("a".into())
                }
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reader_waits_while_running() {
        let delivery = Arc::new(DeliveryChannel::new());
        let controller = Arc::new(GenerationController::new(Arc::clone(&delivery)));
        let active = controller.try_begin().unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(550)).await;
            active.sink().chunk("late");
            active.complete(GenerationEvent::Done { output: None });
        });

        let events: Vec<_> = event_stream(delivery, controller, Duration::from_millis(100))
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], GenerationEvent::chunk("late"));
    }
}
