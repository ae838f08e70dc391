// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-flight generation controller.
//!
//! The phase lives in a `watch` channel. `Idle -> Running` is one atomic
//! `send_if_modified`, so two concurrent starts can never both win. Each
//! accepted generation gets a fresh [`CancellationToken`] stored in the
//! running phase; stop requests cancel that token and nothing else.
//!
//! Every accepted start hands out an [`ActiveGeneration`] guard. Dropping it
//! publishes a fallback terminal event if none was sent and returns the
//! phase to `Idle`, whatever path the generation took.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tidings_core::types::{GenerationEvent, TerminalError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::delivery::{DeliveryChannel, EventSink};

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    /// No generation in flight; a start will be accepted.
    Idle,
    /// A generation is in flight; starts are rejected.
    Running,
}

impl std::fmt::Display for GenerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationState::Idle => write!(f, "idle"),
            GenerationState::Running => write!(f, "running"),
        }
    }
}

/// How a finished generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Completed,
    Cancelled,
    Failed,
}

impl GenerationOutcome {
    fn of(event: &GenerationEvent) -> Self {
        match event {
            GenerationEvent::Error {
                error: TerminalError::Interrupted,
            } => GenerationOutcome::Cancelled,
            GenerationEvent::Error { .. } => GenerationOutcome::Failed,
            _ => GenerationOutcome::Completed,
        }
    }
}

impl std::fmt::Display for GenerationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationOutcome::Completed => write!(f, "completed"),
            GenerationOutcome::Cancelled => write!(f, "cancelled"),
            GenerationOutcome::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Idle {
        last_outcome: Option<GenerationOutcome>,
    },
    Running {
        epoch: u64,
        token: CancellationToken,
    },
}

/// Owns the single-flight invariant for one assistant instance.
pub struct GenerationController {
    phase: watch::Sender<Phase>,
    delivery: Arc<DeliveryChannel>,
    epochs: AtomicU64,
}

impl GenerationController {
    pub fn new(delivery: Arc<DeliveryChannel>) -> Self {
        let (phase, _) = watch::channel(Phase::Idle { last_outcome: None });
        Self {
            phase,
            delivery,
            epochs: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> GenerationState {
        match &*self.phase.borrow() {
            Phase::Idle { .. } => GenerationState::Idle,
            Phase::Running { .. } => GenerationState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == GenerationState::Running
    }

    /// Outcome of the most recent finished generation.
    pub fn last_outcome(&self) -> Option<GenerationOutcome> {
        match &*self.phase.borrow() {
            Phase::Idle { last_outcome } => *last_outcome,
            Phase::Running { .. } => None,
        }
    }

    /// Moves `Idle -> Running`. Returns `None` without side effects if a
    /// generation is already running.
    pub(crate) fn try_begin(self: &Arc<Self>) -> Option<ActiveGeneration> {
        let mut begun = None;
        self.phase.send_if_modified(|phase| {
            if matches!(phase, Phase::Running { .. }) {
                return false;
            }
            let epoch = self.epochs.fetch_add(1, Ordering::Relaxed) + 1;
            let token = CancellationToken::new();
            self.delivery.begin_epoch(epoch);
            *phase = Phase::Running {
                epoch,
                token: token.clone(),
            };
            begun = Some((epoch, token));
            true
        });

        let (epoch, token) = begun?;
        info!(epoch, "generation started");
        Some(ActiveGeneration {
            controller: Arc::clone(self),
            sink: EventSink::new(Arc::clone(&self.delivery), epoch),
            epoch,
            token,
            outcome: None,
        })
    }

    /// Requests cooperative cancellation of the running generation.
    /// Returns `false` when there is nothing to stop.
    pub fn request_stop(&self) -> bool {
        match &*self.phase.borrow() {
            Phase::Running { epoch, token } => {
                token.cancel();
                info!(epoch, "stop requested");
                true
            }
            Phase::Idle { .. } => false,
        }
    }

    /// Resolves once no generation is running.
    pub async fn wait_until_idle(&self) {
        let mut rx = self.phase.subscribe();
        // The sender is owned by `self`, so the channel cannot close here.
        let _ = rx.wait_for(|phase| matches!(phase, Phase::Idle { .. })).await;
    }

    fn finish(&self, epoch: u64, outcome: GenerationOutcome) {
        self.phase.send_replace(Phase::Idle {
            last_outcome: Some(outcome),
        });
        info!(epoch, %outcome, "generation finished");
    }
}

/// Guard for one accepted generation.
pub(crate) struct ActiveGeneration {
    controller: Arc<GenerationController>,
    sink: EventSink,
    epoch: u64,
    token: CancellationToken,
    outcome: Option<GenerationOutcome>,
}

impl ActiveGeneration {
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub(crate) fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    /// Publishes the terminal event. The phase returns to `Idle` on drop.
    pub(crate) fn complete(mut self, terminal: GenerationEvent) {
        if !terminal.is_terminal() {
            warn!(epoch = self.epoch, "non-terminal event passed as terminal");
            return;
        }
        self.outcome = Some(GenerationOutcome::of(&terminal));
        self.sink.terminal(terminal);
    }
}

impl Drop for ActiveGeneration {
    fn drop(&mut self) {
        let outcome = match self.outcome {
            Some(outcome) => outcome,
            None => {
                warn!(epoch = self.epoch, "generation ended without a terminal event");
                self.sink.terminal(GenerationEvent::Error {
                    error: TerminalError::Failed("generation ended unexpectedly".into()),
                });
                GenerationOutcome::Failed
            }
        };
        self.controller.finish(self.epoch, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn controller() -> (Arc<GenerationController>, Arc<DeliveryChannel>) {
        let delivery = Arc::new(DeliveryChannel::new());
        (
            Arc::new(GenerationController::new(Arc::clone(&delivery))),
            delivery,
        )
    }

    #[test]
    fn second_begin_is_rejected_while_running() {
        let (controller, _) = controller();
        let first = controller.try_begin();
        assert!(first.is_some());
        assert!(controller.try_begin().is_none());
        assert_eq!(controller.state(), GenerationState::Running);

        drop(first);
        assert_eq!(controller.state(), GenerationState::Idle);
        assert!(controller.try_begin().is_some());
    }

    #[test]
    fn stop_cancels_only_the_running_token() {
        let (controller, _) = controller();
        assert!(!controller.request_stop());

        let active = controller.try_begin().unwrap();
        let token = active.token();
        assert!(controller.request_stop());
        assert!(token.is_cancelled());
        active.complete(GenerationEvent::Error {
            error: TerminalError::Interrupted,
        });
        assert_eq!(controller.last_outcome(), Some(GenerationOutcome::Cancelled));

        let next = controller.try_begin().unwrap();
        assert!(!next.token().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_guard_publishes_fallback_terminal() {
        let (controller, delivery) = controller();
        let active = controller.try_begin().unwrap();
        active.sink().chunk("partial");
        drop(active);

        let timeout = Duration::from_millis(100);
        assert_eq!(delivery.poll(timeout).await, Some(GenerationEvent::chunk("partial")));
        let terminal = delivery.poll(timeout).await.unwrap();
        assert!(matches!(
            terminal,
            GenerationEvent::Error {
                error: TerminalError::Failed(_)
            }
        ));
        assert_eq!(controller.last_outcome(), Some(GenerationOutcome::Failed));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_publishes_exactly_one_terminal() {
        let (controller, delivery) = controller();
        let active = controller.try_begin().unwrap();
        active.complete(GenerationEvent::Done {
            output: Some("ok".into()),
        });

        let timeout = Duration::from_millis(100);
        assert!(delivery.poll(timeout).await.unwrap().is_terminal());
        assert_eq!(delivery.poll(timeout).await, None);
        assert_eq!(controller.last_outcome(), Some(GenerationOutcome::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_until_idle_resolves_after_finish() {
        let (controller, _) = controller();
        let active = controller.try_begin().unwrap();

        let waiter = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.wait_until_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(active);
        waiter.await.unwrap();
        assert!(!controller.is_running());
    }

    #[test]
    fn display_names() {
        assert_eq!(GenerationState::Running.to_string(), "running");
        assert_eq!(GenerationOutcome::Cancelled.to_string(), "cancelled");
    }
}
