//! # Core Runtime
//!
//! Everything that does not depend on a terminal: instruments and their
//! scheduler, layout, keys, health and configuration.
//!
//! ```text
//!   ┌──────────────┐  ┌──────────────┐
//!   │ instrument A │  │ instrument B │   one tokio task each
//!   └──────┬───────┘  └──────┬───────┘
//!          │ PollResult      │
//!          └───────┬─────────┘
//!                  ▼
//!          ┌───────────────┐    intake (mpsc)
//!          │   scheduler   │──────────────────┐
//!          └───────────────┘                  ▼
//!                                      ┌─────────────┐
//!                                      │  dashboard  │  tui::dashboard
//!                                      │  main loop  │
//!                                      └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`instrument`]: the `Instrument` trait and change detection
//! - [`scheduler`]: per-instrument poll tasks and the intake channel
//! - [`layout`]: chrome reservation and item placement
//! - [`geometry`]: `Size` and `Region`
//! - [`key`]: backend-neutral key events
//! - [`status`]: instrument health and the activity log
//! - [`config`]: file/env/CLI configuration
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod geometry;
pub mod instrument;
pub mod key;
pub mod layout;
pub mod scheduler;
pub mod status;

pub use error::{ActionError, DashboardError, InstrumentError, RenderError, SurfaceError};
pub use geometry::{Region, Size};
pub use instrument::{DataMap, Instrument, Notifier};
pub use key::Key;
