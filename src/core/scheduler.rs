//! # Scheduler
//!
//! One tokio task per instrument. Each task owns its instrument outright and
//! is the only code that ever calls into it, so `update_data()` and
//! `action()` for one instrument are serialized without any locking.
//!
//! ```text
//!   ┌──────────── task "temp" ────────────┐
//!   │ interval tick → update_data()       │──┐
//!   │ command       → action(item, data)  │  │   SchedulerEvent
//!   └─────────────────────────────────────┘  ├──────────────────▶ intake (render loop)
//!   ┌──────────── task "psu" ─────────────┐  │
//!   │ ...                                 │──┘
//!   └─────────────────────────────────────┘
//! ```
//!
//! After every call the task diffs the instrument's data against the last
//! published snapshot and sends only the changed keys. Per-task sends go
//! through one FIFO channel, so results for one instrument arrive in call
//! order.

use std::time::Duration;

use futures::future::join_all;
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::error::{ActionError, InstrumentError};
use crate::core::instrument::{DataMap, Instrument, Notifier, changed_keys};

/// What happened on one poll (or action) of one instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Keys whose values changed, with their new values. Never empty.
    Changed(DataMap),
    Failed(String),
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollResult {
    pub instrument: String,
    pub outcome: PollOutcome,
}

/// Everything the scheduler tasks report to the render loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    Poll(PollResult),
    ActionFailed(ActionError),
    Note { instrument: String, message: String },
}

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

enum Command {
    Action { item_id: String, payload: Value },
}

struct Worker {
    name: String,
    commands: mpsc::UnboundedSender<Command>,
    handle: JoinHandle<()>,
}

pub struct Scheduler {
    workers: Vec<Worker>,
    shutdown: watch::Sender<bool>,
}

/// Reason given when an instrument's task has exited after a fatal error.
pub const TASK_STOPPED: &str = "instrument task has stopped";

impl Scheduler {
    /// Spawns one task per instrument. Must be called within a tokio runtime.
    pub fn start(
        instruments: Vec<Box<dyn Instrument>>,
        default_interval: Duration,
        intake: mpsc::UnboundedSender<SchedulerEvent>,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);

        let workers = instruments
            .into_iter()
            .map(|instrument| {
                let name = instrument.name().to_string();
                let interval = instrument
                    .poll_interval()
                    .filter(|d| !d.is_zero())
                    .unwrap_or(default_interval)
                    .max(MIN_POLL_INTERVAL);
                let (commands, commands_rx) = mpsc::unbounded_channel();
                info!("Starting poll task for '{}' every {:?}", name, interval);
                let handle = tokio::spawn(run_worker(
                    instrument,
                    interval,
                    commands_rx,
                    shutdown_rx.clone(),
                    intake.clone(),
                ));
                Worker {
                    name,
                    commands,
                    handle,
                }
            })
            .collect();

        Self { workers, shutdown }
    }

    /// Queues an action on the instrument's task. Fails if the instrument is
    /// unknown or its task has exited.
    pub fn request_action(
        &self,
        instrument: &str,
        item_id: &str,
        payload: Value,
    ) -> Result<(), ActionError> {
        let worker = self
            .workers
            .iter()
            .find(|w| w.name == instrument)
            .ok_or_else(|| ActionError {
                instrument: instrument.to_string(),
                item_id: item_id.to_string(),
                reason: "no such instrument".to_string(),
            })?;

        worker
            .commands
            .send(Command::Action {
                item_id: item_id.to_string(),
                payload,
            })
            .map_err(|_| ActionError {
                instrument: instrument.to_string(),
                item_id: item_id.to_string(),
                reason: TASK_STOPPED.to_string(),
            })
    }

    /// Signals every task to stop and waits until all have returned. A task
    /// in the middle of `update_data()` or `action()` finishes that call first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let (names, handles): (Vec<_>, Vec<_>) =
            self.workers.into_iter().map(|w| (w.name, w.handle)).unzip();

        for (name, result) in names.iter().zip(join_all(handles).await) {
            if let Err(e) = result {
                error!("Poll task for '{}' ended abnormally: {}", name, e);
            }
        }
        info!("Scheduler stopped ({} tasks)", names.len());
    }
}

async fn run_worker(
    mut instrument: Box<dyn Instrument>,
    interval: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut shutdown: watch::Receiver<bool>,
    intake: mpsc::UnboundedSender<SchedulerEvent>,
) {
    let name = instrument.name().to_string();
    instrument.attach(Notifier::new(name.clone(), intake.clone()));

    let mut published = DataMap::new();
    publish_changes(&name, instrument.data(), &mut published, &intake);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            biased;

            _ = shutdown.changed() => break,

            Some(command) = commands.recv() => match command {
                Command::Action { item_id, payload } => {
                    debug!("'{}' action from '{}': {}", name, item_id, payload);
                    let result = instrument.action(&item_id, &payload).await;
                    // Data touched by a failed action is still published.
                    publish_changes(&name, instrument.data(), &mut published, &intake);
                    if let Err(e) = result {
                        warn!("Action on '{}' from '{}' failed: {}", name, item_id, e);
                        let event = SchedulerEvent::ActionFailed(ActionError {
                            instrument: name.clone(),
                            item_id,
                            reason: e.reason().to_string(),
                        });
                        if intake.send(event).is_err() {
                            break;
                        }
                    }
                }
            },

            _ = ticker.tick() => {
                let outcome = match instrument.update_data().await {
                    Ok(()) => {
                        if !publish_changes(&name, instrument.data(), &mut published, &intake) {
                            break;
                        }
                        continue;
                    }
                    Err(InstrumentError::Poll(reason)) => {
                        warn!("Polling '{}' failed: {}", name, reason);
                        PollOutcome::Failed(reason)
                    }
                    Err(InstrumentError::Fatal(reason)) => {
                        error!("'{}' reported a fatal error, polling stops: {}", name, reason);
                        PollOutcome::Fatal(reason)
                    }
                };

                let fatal = matches!(outcome, PollOutcome::Fatal(_));
                let event = SchedulerEvent::Poll(PollResult {
                    instrument: name.clone(),
                    outcome,
                });
                if intake.send(event).is_err() || fatal {
                    break;
                }
            }
        }
    }

    debug!("Poll task for '{}' exiting", name);
}

/// Sends the keys that changed since the last publication. Returns `false`
/// if the render loop has gone away.
fn publish_changes(
    name: &str,
    current: &DataMap,
    published: &mut DataMap,
    intake: &mpsc::UnboundedSender<SchedulerEvent>,
) -> bool {
    let changed = changed_keys(published, current);
    if changed.is_empty() {
        return true;
    }

    for (key, value) in &changed {
        if value.is_null() && !current.contains_key(key) {
            published.remove(key);
        } else {
            published.insert(key.clone(), value.clone());
        }
    }

    intake
        .send(SchedulerEvent::Poll(PollResult {
            instrument: name.to_string(),
            outcome: PollOutcome::Changed(changed),
        }))
        .is_ok()
}
