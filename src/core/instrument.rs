//! # Instruments
//!
//! An instrument is host code that owns a keyed data store and knows how to
//! refresh it (`update_data`) and how to apply user-triggered effects
//! (`action`). The dashboard never touches an instrument's data directly:
//! each instrument lives on its own scheduler task, and the render loop only
//! ever sees the change sets that task publishes.
//!
//! ```rust,ignore
//! struct Thermometer { data: DataMap }
//!
//! #[async_trait]
//! impl Instrument for Thermometer {
//!     fn name(&self) -> &str { "temp" }
//!     fn data(&self) -> &DataMap { &self.data }
//!
//!     async fn update_data(&mut self) -> Result<(), InstrumentError> {
//!         self.data.insert("t".into(), json!(read_sensor().await?));
//!         Ok(())
//!     }
//!
//!     async fn action(&mut self, _item_id: &str, _payload: &Value) -> Result<(), InstrumentError> {
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::error::InstrumentError;
use crate::core::scheduler::SchedulerEvent;

/// An instrument's data: text keys mapped to scalar or short-sequence values.
pub type DataMap = BTreeMap<String, Value>;

#[async_trait]
pub trait Instrument: Send {
    /// Unique name within a dashboard. Items bind to instruments by name.
    fn name(&self) -> &str;

    /// Current data. Read by the scheduler after every call to compute changes.
    fn data(&self) -> &DataMap;

    /// Poll cadence. `None` uses the dashboard's default interval.
    fn poll_interval(&self) -> Option<Duration> {
        None
    }

    /// Called once on the instrument's task before polling starts.
    fn attach(&mut self, _notifier: Notifier) {}

    /// Pull fresh values into the data store.
    async fn update_data(&mut self) -> Result<(), InstrumentError>;

    /// Apply an effect requested by the item `item_id`.
    async fn action(&mut self, item_id: &str, payload: &Value) -> Result<(), InstrumentError>;
}

/// Handle an instrument uses to write messages to the dashboard's log panel.
#[derive(Clone)]
pub struct Notifier {
    instrument: String,
    intake: UnboundedSender<SchedulerEvent>,
}

impl Notifier {
    pub(crate) fn new(instrument: String, intake: UnboundedSender<SchedulerEvent>) -> Self {
        Self { instrument, intake }
    }

    pub fn notify(&self, message: impl Into<String>) {
        let event = SchedulerEvent::Note {
            instrument: self.instrument.clone(),
            message: message.into(),
        };
        if self.intake.send(event).is_err() {
            debug!("Dropped note from '{}': dashboard is gone", self.instrument);
        }
    }
}

/// Keys of `current` whose value differs from `previous` (shallow inequality),
/// with their new values. Keys removed from `current` are reported as `null`.
pub fn changed_keys(previous: &DataMap, current: &DataMap) -> DataMap {
    let mut changed: DataMap = current
        .iter()
        .filter(|(key, value)| previous.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for key in previous.keys() {
        if !current.contains_key(key) {
            changed.insert(key.clone(), Value::Null);
        }
    }
    changed
}
