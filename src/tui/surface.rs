//! # Terminal Surfaces
//!
//! The dashboard draws through [`TerminalSurface`] and never touches a
//! terminal directly. Two adapters ship with the crate:
//!
//! - [`CrosstermSurface`]: the real terminal (ratatui `DefaultTerminal`)
//! - [`HeadlessSurface`]: a ratatui `TestBackend` driven by a script of keys
//!   and resizes, for tests and snapshotting
//!
//! Both stage cells in a `Buffer` and hand the whole buffer to
//! `Terminal::draw` on `refresh()`, so ratatui's diffing decides what is
//! actually written and a frame never shows half-applied updates.

use std::collections::VecDeque;
use std::io::stdout;
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info};
use ratatui::backend::{Backend, TestBackend};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::{DefaultTerminal, Terminal};

use crate::core::error::SurfaceError;
use crate::core::geometry::Size;
use crate::core::key::Key;
use crate::tui::component::Cell;
use crate::tui::event::translate_key;

pub trait TerminalSurface {
    fn size(&self) -> Size;

    /// Stages one cell. Cells outside the surface are ignored.
    fn write_cell(&mut self, cell: &Cell);

    /// Makes every staged cell visible at once.
    fn refresh(&mut self) -> Result<(), SurfaceError>;

    /// Waits up to `timeout` for a key press.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>, SurfaceError>;

    /// New size if the terminal was resized since the last call.
    fn take_resize(&mut self) -> Option<Size>;

    /// Returns the terminal to its original mode. Idempotent.
    fn restore(&mut self) -> Result<(), SurfaceError>;
}

fn stage(staging: &mut Buffer, cell: &Cell) {
    if let Some(target) = staging.cell_mut((cell.col, cell.row)) {
        // set_style only adds modifiers, so start from a blank cell.
        target.reset();
        target.set_symbol(&cell.symbol);
        target.set_style(cell.style);
    }
}

fn copy_into(staging: &Buffer, frame_buffer: &mut Buffer) {
    let area = frame_buffer.area;
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let (Some(src), Some(dst)) = (staging.cell((x, y)), frame_buffer.cell_mut((x, y))) {
                *dst = src.clone();
            }
        }
    }
}

fn rect_of(size: Size) -> Rect {
    Rect::new(0, 0, size.cols, size.rows)
}

// ============================================================================
// Crossterm
// ============================================================================

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Release events are reported separately once REPORT_EVENT_TYPES is on;
        // the key translator drops them. Terminals without the protocol ignore it.
        execute!(
            stdout(),
            Hide,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (hidden cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags, Show);
    }
}

/// The process's real terminal, in raw mode on the alternate screen.
pub struct CrosstermSurface {
    terminal: DefaultTerminal,
    staging: Buffer,
    pending_resize: Option<Size>,
    mode_guard: Option<TerminalModeGuard>,
    restored: bool,
}

impl CrosstermSurface {
    /// Enters raw mode and the alternate screen.
    pub fn init() -> Result<Self, SurfaceError> {
        let terminal = ratatui::try_init()?;
        let mode_guard = TerminalModeGuard::new()?;
        let area = terminal.size()?;
        debug!("Terminal size {}x{}", area.width, area.height);
        Ok(Self {
            terminal,
            staging: Buffer::empty(Rect::new(0, 0, area.width, area.height)),
            pending_resize: None,
            mode_guard: Some(mode_guard),
            restored: false,
        })
    }
}

impl TerminalSurface for CrosstermSurface {
    fn size(&self) -> Size {
        Size::new(self.staging.area.height, self.staging.area.width)
    }

    fn write_cell(&mut self, cell: &Cell) {
        stage(&mut self.staging, cell);
    }

    fn refresh(&mut self) -> Result<(), SurfaceError> {
        let staging = &self.staging;
        self.terminal
            .draw(|frame| copy_into(staging, frame.buffer_mut()))?;
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>, SurfaceError> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key_event) => Ok(translate_key(&key_event)),
            Event::Resize(cols, rows) => {
                debug!("Terminal resized to {}x{}", cols, rows);
                let size = Size::new(rows, cols);
                self.staging.resize(rect_of(size));
                self.pending_resize = Some(size);
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn take_resize(&mut self) -> Option<Size> {
        self.pending_resize.take()
    }

    fn restore(&mut self) -> Result<(), SurfaceError> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        self.mode_guard.take();
        ratatui::try_restore()?;
        info!("Terminal restored");
        Ok(())
    }
}

impl Drop for CrosstermSurface {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

// ============================================================================
// Headless
// ============================================================================

/// One step of a [`HeadlessSurface`] script. Each `poll_key` call consumes
/// one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Scripted {
    Key(Key),
    /// `n` polls that return no key.
    Idle(u32),
    Resize { cols: u16, rows: u16 },
}

/// In-memory terminal. Once the script runs out every poll returns `None`.
pub struct HeadlessSurface {
    terminal: Terminal<TestBackend>,
    staging: Buffer,
    script: VecDeque<Scripted>,
    pending_resize: Option<Size>,
    refreshes: usize,
    fail_refresh_after: Option<usize>,
    restored: bool,
}

impl HeadlessSurface {
    pub fn new(cols: u16, rows: u16) -> Result<Self, SurfaceError> {
        let terminal = Terminal::new(TestBackend::new(cols, rows))
            .map_err(|e| SurfaceError::Backend(e.to_string()))?;
        Ok(Self {
            terminal,
            staging: Buffer::empty(Rect::new(0, 0, cols, rows)),
            script: VecDeque::new(),
            pending_resize: None,
            refreshes: 0,
            fail_refresh_after: None,
            restored: false,
        })
    }

    pub fn with_script(mut self, steps: impl IntoIterator<Item = Scripted>) -> Self {
        self.script.extend(steps);
        self
    }

    /// Every `refresh()` after the first `n` fails with a broken pipe.
    pub fn fail_refresh_after(mut self, n: usize) -> Self {
        self.fail_refresh_after = Some(n);
        self
    }

    pub fn push(&mut self, step: Scripted) {
        self.script.push_back(step);
    }

    /// What the last successful `refresh()` put on screen.
    pub fn buffer(&self) -> &Buffer {
        self.terminal.backend().buffer()
    }

    pub fn row_text(&self, row: u16) -> String {
        let buffer = self.buffer();
        let area = buffer.area;
        (area.left()..area.right())
            .filter_map(|x| buffer.cell((x, row)))
            .map(|c| c.symbol())
            .collect()
    }

    pub fn screen_text(&self) -> String {
        let area = self.buffer().area;
        (area.top()..area.bottom())
            .map(|y| self.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    pub fn is_restored(&self) -> bool {
        self.restored
    }

    /// Size the backend currently reports.
    pub fn backend_size(&self) -> Option<Size> {
        self.terminal
            .backend()
            .size()
            .ok()
            .map(|s| Size::new(s.height, s.width))
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.terminal.backend_mut().resize(cols, rows);
        let size = Size::new(rows, cols);
        self.staging.resize(rect_of(size));
        self.pending_resize = Some(size);
    }
}

impl TerminalSurface for HeadlessSurface {
    fn size(&self) -> Size {
        Size::new(self.staging.area.height, self.staging.area.width)
    }

    fn write_cell(&mut self, cell: &Cell) {
        stage(&mut self.staging, cell);
    }

    fn refresh(&mut self) -> Result<(), SurfaceError> {
        if let Some(limit) = self.fail_refresh_after
            && self.refreshes >= limit
        {
            return Err(SurfaceError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "headless surface closed",
            )));
        }
        let staging = &self.staging;
        self.terminal
            .draw(|frame| copy_into(staging, frame.buffer_mut()))
            .map_err(|e| SurfaceError::Backend(e.to_string()))?;
        self.refreshes += 1;
        Ok(())
    }

    fn poll_key(&mut self, _timeout: Duration) -> Result<Option<Key>, SurfaceError> {
        match self.script.pop_front() {
            Some(Scripted::Key(key)) => Ok(Some(key)),
            Some(Scripted::Idle(n)) => {
                if n > 1 {
                    self.script.push_front(Scripted::Idle(n - 1));
                }
                Ok(None)
            }
            Some(Scripted::Resize { cols, rows }) => {
                self.resize(cols, rows);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn take_resize(&mut self) -> Option<Size> {
        self.pending_resize.take()
    }

    fn restore(&mut self) -> Result<(), SurfaceError> {
        self.restored = true;
        Ok(())
    }
}
