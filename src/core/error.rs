//! # Error Types
//!
//! Failure taxonomy of the dashboard runtime.
//!
//! | Error             | Raised by                 | Handling                                   |
//! |-------------------|---------------------------|--------------------------------------------|
//! | `InstrumentError` | `update_data()`/`action()`| `Poll`: logged, polling continues          |
//! |                   |                           | `Fatal`: polling stops, items go stale     |
//! | `ActionError`     | action dispatch           | logged, no visual mutation                 |
//! | `RenderError`     | `DashboardItem::render`   | item draws nothing this tick, logged       |
//! | `SurfaceError`    | terminal surface          | orderly shutdown, terminal restored        |
//! | `DashboardError`  | `Dashboard::run` and build| returned to the caller                     |
//!
//! Layout overflow is not an error: items that do not fit are hidden.

use std::fmt;

/// Failure reported by host instrument code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstrumentError {
    /// Transient failure. The scheduler retries on the next tick.
    Poll(String),
    /// Unrecoverable failure. Polling for the instrument stops.
    Fatal(String),
}

impl InstrumentError {
    pub fn poll(reason: impl Into<String>) -> Self {
        InstrumentError::Poll(reason.into())
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        InstrumentError::Fatal(reason.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, InstrumentError::Fatal(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            InstrumentError::Poll(reason) | InstrumentError::Fatal(reason) => reason,
        }
    }
}

impl fmt::Display for InstrumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentError::Poll(reason) => write!(f, "poll error: {reason}"),
            InstrumentError::Fatal(reason) => write!(f, "fatal error: {reason}"),
        }
    }
}

impl std::error::Error for InstrumentError {}

/// An action requested by an item could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionError {
    pub instrument: String,
    pub item_id: String,
    pub reason: String,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "action from '{}' on '{}' failed: {}",
            self.item_id, self.instrument, self.reason
        )
    }
}

impl std::error::Error for ActionError {}

/// An item could not produce its cells for this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError(pub String);

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render error: {}", self.0)
    }
}

impl std::error::Error for RenderError {}

/// The terminal surface failed. Always terminates the run loop.
#[derive(Debug)]
pub enum SurfaceError {
    Io(std::io::Error),
    /// Backend-specific failure that carries no `io::Error`.
    Backend(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::Io(e) => write!(f, "terminal I/O error: {e}"),
            SurfaceError::Backend(msg) => write!(f, "terminal backend error: {msg}"),
        }
    }
}

impl std::error::Error for SurfaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SurfaceError::Io(e) => Some(e),
            SurfaceError::Backend(_) => None,
        }
    }
}

impl From<std::io::Error> for SurfaceError {
    fn from(e: std::io::Error) -> Self {
        SurfaceError::Io(e)
    }
}

/// Errors returned to the host application by the dashboard.
#[derive(Debug)]
pub enum DashboardError {
    Terminal(SurfaceError),
    DuplicateInstrument(String),
    DuplicateItem(String),
    UnknownInstrument { item_id: String, instrument: String },
    /// `run()` was called on a dashboard that is running or already stopped.
    NotRunnable,
    /// An item panicked while rendering.
    ItemPanicked(String),
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::Terminal(e) => write!(f, "{e}"),
            DashboardError::DuplicateInstrument(name) => {
                write!(f, "instrument '{name}' is already registered")
            }
            DashboardError::DuplicateItem(id) => write!(f, "item '{id}' is already registered"),
            DashboardError::UnknownInstrument {
                item_id,
                instrument,
            } => write!(
                f,
                "item '{item_id}' is bound to unknown instrument '{instrument}'"
            ),
            DashboardError::NotRunnable => write!(f, "dashboard has already been started"),
            DashboardError::ItemPanicked(id) => write!(f, "item '{id}' panicked while rendering"),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashboardError::Terminal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SurfaceError> for DashboardError {
    fn from(e: SurfaceError) -> Self {
        DashboardError::Terminal(e)
    }
}
