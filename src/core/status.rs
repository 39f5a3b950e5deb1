//! # Health and Activity
//!
//! Per-instrument health derived from poll outcomes, and the bounded activity
//! log shown in the dashboard's *Log* section.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::core::scheduler::PollOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InstrumentHealth {
    #[default]
    Ok,
    Failing {
        reason: String,
        consecutive: u32,
    },
    /// Polling has stopped. Items bound to the instrument render stale.
    Stopped {
        reason: String,
    },
}

impl InstrumentHealth {
    /// Next health after `outcome`. `Stopped` is terminal.
    pub fn apply(&mut self, outcome: &PollOutcome) {
        if self.is_stopped() {
            return;
        }
        *self = match outcome {
            PollOutcome::Changed(_) => InstrumentHealth::Ok,
            PollOutcome::Failed(reason) => {
                let consecutive = match self {
                    InstrumentHealth::Failing { consecutive, .. } => consecutive.saturating_add(1),
                    _ => 1,
                };
                InstrumentHealth::Failing {
                    reason: reason.clone(),
                    consecutive,
                }
            }
            PollOutcome::Fatal(reason) => InstrumentHealth::Stopped {
                reason: reason.clone(),
            },
        };
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, InstrumentHealth::Ok)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, InstrumentHealth::Stopped { .. })
    }

    /// Short status-line marker: `✓`, `!3`, `✗`.
    pub fn marker(&self) -> String {
        match self {
            InstrumentHealth::Ok => "✓".to_string(),
            InstrumentHealth::Failing { consecutive, .. } => format!("!{consecutive}"),
            InstrumentHealth::Stopped { .. } => "✗".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl LogEntry {
    pub fn line(&self) -> String {
        format!("[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Ring of the most recent messages. Oldest entries are evicted first.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.push_at(Local::now(), message);
    }

    pub fn push_at(&mut self, at: DateTime<Local>, message: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            at,
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_health_counts_consecutive_failures() {
        let mut health = InstrumentHealth::Ok;
        health.apply(&PollOutcome::Failed("timeout".into()));
        health.apply(&PollOutcome::Failed("timeout again".into()));
        assert_eq!(
            health,
            InstrumentHealth::Failing {
                reason: "timeout again".into(),
                consecutive: 2
            }
        );
        assert_eq!(health.marker(), "!2");
    }

    #[test]
    fn test_health_recovers_on_change() {
        let mut health = InstrumentHealth::Failing {
            reason: "x".into(),
            consecutive: 4,
        };
        health.apply(&PollOutcome::Changed(Default::default()));
        assert!(health.is_ok());
    }

    #[test]
    fn test_health_stopped_is_terminal() {
        let mut health = InstrumentHealth::Ok;
        health.apply(&PollOutcome::Fatal("unplugged".into()));
        health.apply(&PollOutcome::Changed(Default::default()));
        assert!(health.is_stopped());
        assert_eq!(health.marker(), "✗");
    }

    #[test]
    fn test_activity_log_evicts_oldest() {
        let mut log = ActivityLog::new(2);
        log.push("one");
        log.push("two");
        log.push("three");
        let messages: Vec<&str> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_activity_log_zero_capacity_keeps_nothing() {
        let mut log = ActivityLog::new(0);
        log.push("ignored");
        assert!(log.is_empty());
    }

    #[test]
    fn test_activity_log_huge_capacity_allocates_lazily() {
        let mut log = ActivityLog::new(usize::MAX);
        log.push("one");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_log_line_has_clock_prefix() {
        let at = Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        let mut log = ActivityLog::new(1);
        log.push_at(at, "psu: relay stuck");
        let line = log.entries().next().unwrap().line();
        assert_eq!(line, "[09:05:07] psu: relay stuck");
    }
}
