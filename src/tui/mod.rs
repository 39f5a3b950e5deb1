//! # TUI Adapter
//!
//! The ratatui/crossterm layer: the terminal surface, key translation, the
//! item widgets and the [`Dashboard`] that drives them.
//!
//! This is the only module that knows about ratatui and crossterm. Instruments
//! and layout live in `core` and never see a terminal.
//!
//! ## Redraw Strategy
//!
//! Nothing is redrawn unless it changed:
//!
//! - an item is redrawn when its instrument publishes a key it watches, when
//!   it gains or loses focus, or when it handles a key
//! - chrome is redrawn on health changes, log entries and clock seconds
//! - a resize or color inversion redraws everything
//!
//! Each loop iteration calls `refresh()` at most once, and only if something
//! was drawn.

pub mod component;
pub mod components;
pub mod dashboard;
pub mod event;
pub mod surface;
pub mod theme;

pub use component::{ActionRequest, Binding, Cell, DashboardItem, RenderContext};
pub use dashboard::{Dashboard, DashboardState, StopHandle};
pub use surface::{CrosstermSurface, HeadlessSurface, Scripted, TerminalSurface};
pub use theme::Theme;
