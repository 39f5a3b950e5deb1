//! Labterm library exports

pub mod core;
pub mod tui;

pub use crate::core::config::DashboardConfig;
pub use crate::core::{DashboardError, DataMap, Instrument, InstrumentError, Key, Notifier};
pub use crate::tui::{Dashboard, DashboardItem, HeadlessSurface, StopHandle, TerminalSurface};
