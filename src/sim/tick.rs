//! Fixed-interval simulation tick loop

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::backend::protocol::OutboundEvent;
use crate::backend::BackendClient;
use crate::util::time::epoch_secs;

use super::registry::{Transition, WorldRegistry};

/// Translate a tick's transitions into outbound wire events.
/// One entity can arrive and wake in the same tick; that is two events.
pub fn outbound_events(transitions: &[Transition]) -> Vec<OutboundEvent> {
    let mut events = Vec::new();
    for transition in transitions {
        if transition.report.arrived {
            events.push(OutboundEvent::Arrived {
                entity_id: transition.entity_id.clone(),
                destination: transition.location,
            });
        }
        if transition.report.woke {
            events.push(OutboundEvent::WokeUp {
                entity_id: transition.entity_id.clone(),
            });
        }
    }
    events
}

/// The periodic task that advances every entity and dispatches the
/// resulting transition events.
///
/// Dispatch runs on spawned tasks over payload copies, so a backend that
/// is slow or down never stalls the next tick. The loop ends when the
/// shutdown signal flips, after draining in-flight dispatches.
pub struct TickLoop {
    registry: Arc<WorldRegistry>,
    backend: BackendClient,
    period: Duration,
    shutdown: watch::Receiver<bool>,
}

impl TickLoop {
    pub fn new(state: &AppState) -> Self {
        Self {
            registry: state.registry.clone(),
            backend: state.backend.clone(),
            period: state.config.tick_interval,
            shutdown: state.shutdown.subscribe(),
        }
    }

    pub async fn run(self) {
        info!(period_ms = self.period.as_millis() as u64, "tick loop started");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut dispatches: JoinSet<()> = JoinSet::new();
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(&mut dispatches);

                    // Reap finished dispatch tasks without blocking the loop
                    while let Some(Some(result)) = dispatches.join_next().now_or_never() {
                        if let Err(err) = result {
                            error!(%err, "event dispatch task failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        // Let in-flight deliveries finish or time out before exit
        while let Some(result) = dispatches.join_next().await {
            if let Err(err) = result {
                error!(%err, "event dispatch task failed");
            }
        }
        info!("tick loop stopped");
    }

    fn tick(&self, dispatches: &mut JoinSet<()>) {
        let now = epoch_secs();
        let transitions = self.registry.advance_all(now);
        if transitions.is_empty() {
            return;
        }

        let events = outbound_events(&transitions);
        info!(count = events.len(), "tick produced transition events");

        let backend = self.backend.clone();
        dispatches.spawn(async move {
            let sends = events.iter().map(|event| async {
                if let Err(err) = backend.deliver(event.endpoint(), &event.to_payload()).await {
                    warn!(
                        entity_id = event.entity_id(),
                        endpoint = event.endpoint(),
                        error = %err,
                        "transition event lost after retries"
                    );
                }
            });
            join_all(sends).await;
        });
    }
}
