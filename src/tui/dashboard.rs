//! # Dashboard
//!
//! The orchestrator. Owns the surface, the items, the layout and, once
//! running, the scheduler.
//!
//! ```text
//!  Built ──run()──▶ Running ──quit / stop / terminal error / item panic──▶ Stopped
//! ```
//!
//! ## Loop
//!
//! Each iteration:
//!
//! 1. drain the intake without blocking and mark affected items dirty
//! 2. poll at most one key and route it (global keys, then the focused item)
//! 3. apply a pending resize: new chrome, new layout, everything dirty
//! 4. render dirty items and chrome into the surface, then one `refresh()`
//! 5. sleep until the next intake message or the tick interval
//!
//! Rendering, layout and input handling all happen on this one loop, so they
//! never race. Instrument data reaches the loop only as published change sets,
//! which are merged into per-instrument snapshots before rendering.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use log::{debug, error, info, warn};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use tokio::sync::mpsc::{self, UnboundedReceiver, error::TryRecvError};

use crate::core::config::DashboardConfig;
use crate::core::error::{ActionError, DashboardError};
use crate::core::geometry::{Region, Size};
use crate::core::instrument::{DataMap, Instrument};
use crate::core::key::Key;
use crate::core::layout::{ChromeLayout, ChromeSpec, LayoutManager, LayoutPlan, LayoutRequest};
use crate::core::scheduler::{PollOutcome, PollResult, Scheduler, SchedulerEvent, TASK_STOPPED};
use crate::core::status::{ActivityLog, InstrumentHealth, LogEntry};
use crate::tui::component::{ActionRequest, Cell, Component, DashboardItem, RenderContext};
use crate::tui::components::{CLOCK_FORMAT, HeaderBar, Section, StatusLine};
use crate::tui::surface::TerminalSurface;
use crate::tui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardState {
    Built,
    Running,
    Stopped,
}

/// Requests a stop from outside the run loop (another task, a signal
/// handler). The loop notices within one tick.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

struct ItemSlot {
    item: Box<dyn DashboardItem>,
    region: Option<Region>,
    dirty: bool,
}

enum KeyOutcome {
    Continue,
    Quit,
}

enum Wake {
    Event(Option<SchedulerEvent>),
    Tick,
}

pub struct Dashboard<S: TerminalSurface> {
    config: DashboardConfig,
    surface: S,
    instruments: Vec<Box<dyn Instrument>>,
    items: Vec<ItemSlot>,
    snapshots: HashMap<String, DataMap>,
    /// Registration order.
    health: Vec<(String, InstrumentHealth)>,
    log: ActivityLog,
    layout: LayoutManager,
    chrome: ChromeLayout,
    plan: LayoutPlan,
    focus: Option<usize>,
    /// Item id to focus on the first layout instead of the first candidate.
    initial_focus: Option<String>,
    theme: Theme,
    state: DashboardState,
    stop: StopHandle,
    chrome_dirty: bool,
    clock: Option<String>,
}

impl<S: TerminalSurface> Dashboard<S> {
    pub fn new(surface: S, config: DashboardConfig) -> Self {
        let log = ActivityLog::new(config.max_log_messages);
        Self {
            config,
            surface,
            instruments: Vec::new(),
            items: Vec::new(),
            snapshots: HashMap::new(),
            health: Vec::new(),
            log,
            layout: LayoutManager::default(),
            chrome: ChromeLayout::default(),
            plan: LayoutPlan::default(),
            focus: None,
            initial_focus: None,
            theme: Theme::default(),
            state: DashboardState::Built,
            stop: StopHandle::default(),
            chrome_dirty: true,
            clock: None,
        }
    }

    pub fn with_layout_manager(mut self, layout: LayoutManager) -> Self {
        self.layout = layout;
        self
    }

    /// Starts with focus on the item `id`. Falls back to the first focusable
    /// item if `id` is unknown, not focusable or hidden by the first layout.
    pub fn with_initial_focus(mut self, id: impl Into<String>) -> Self {
        self.initial_focus = Some(id.into());
        self
    }

    pub fn add_instrument(
        &mut self,
        instrument: impl Instrument + 'static,
    ) -> Result<(), DashboardError> {
        self.add_boxed_instrument(Box::new(instrument))
    }

    pub fn add_boxed_instrument(
        &mut self,
        instrument: Box<dyn Instrument>,
    ) -> Result<(), DashboardError> {
        if self.state != DashboardState::Built {
            return Err(DashboardError::NotRunnable);
        }
        let name = instrument.name().to_string();
        if self.health.iter().any(|(n, _)| *n == name) {
            return Err(DashboardError::DuplicateInstrument(name));
        }
        debug!("Registered instrument '{}'", name);
        self.health.push((name, InstrumentHealth::Ok));
        self.instruments.push(instrument);
        Ok(())
    }

    pub fn add_item(&mut self, item: impl DashboardItem + 'static) -> Result<(), DashboardError> {
        self.add_boxed_item(Box::new(item))
    }

    pub fn add_boxed_item(&mut self, item: Box<dyn DashboardItem>) -> Result<(), DashboardError> {
        if self.state != DashboardState::Built {
            return Err(DashboardError::NotRunnable);
        }
        if self.items.iter().any(|s| s.item.id() == item.id()) {
            return Err(DashboardError::DuplicateItem(item.id().to_string()));
        }
        debug!("Registered item '{}'", item.id());
        self.items.push(ItemSlot {
            item,
            region: None,
            dirty: true,
        });
        Ok(())
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> DashboardState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn focused_item(&self) -> Option<&str> {
        self.focus
            .and_then(|i| self.items.get(i))
            .map(|s| s.item.id())
    }

    /// Region of a visible item, `None` if hidden or unknown.
    pub fn region_of(&self, id: &str) -> Option<Region> {
        self.items
            .iter()
            .find(|s| s.item.id() == id)
            .and_then(|s| s.region)
    }

    pub fn hidden_count(&self) -> usize {
        self.plan.hidden_count()
    }

    pub fn health(&self, instrument: &str) -> Option<&InstrumentHealth> {
        self.health
            .iter()
            .find(|(n, _)| n == instrument)
            .map(|(_, h)| h)
    }

    /// Latest published data for an instrument.
    pub fn snapshot(&self, instrument: &str) -> Option<&DataMap> {
        self.snapshots.get(instrument)
    }

    pub fn activity_log(&self) -> &ActivityLog {
        &self.log
    }

    /// Runs until a quit key, a stop request, a terminal error or an item
    /// panic. The surface is restored before this returns, whatever the
    /// outcome. A dashboard runs at most once.
    pub async fn run(&mut self) -> Result<(), DashboardError> {
        if self.state != DashboardState::Built {
            return Err(DashboardError::NotRunnable);
        }
        self.state = DashboardState::Running;
        info!(
            "Dashboard starting with {} instruments and {} items",
            self.health.len(),
            self.items.len()
        );

        let result = self.run_until_stopped().await;
        let restored = self.surface.restore();
        self.state = DashboardState::Stopped;

        match &result {
            Ok(()) => info!("Dashboard stopped"),
            Err(e) => error!("Dashboard stopped: {}", e),
        }
        result?;
        restored.map_err(DashboardError::from)
    }

    async fn run_until_stopped(&mut self) -> Result<(), DashboardError> {
        self.validate()?;
        let (intake_tx, intake_rx) = mpsc::unbounded_channel();
        let instruments = std::mem::take(&mut self.instruments);
        let scheduler = Scheduler::start(instruments, self.config.default_poll_interval, intake_tx);

        let result = self.event_loop(&scheduler, intake_rx).await;
        scheduler.shutdown().await;
        result
    }

    fn validate(&self) -> Result<(), DashboardError> {
        let mut names = HashSet::new();
        for (name, _) in &self.health {
            if !names.insert(name.as_str()) {
                return Err(DashboardError::DuplicateInstrument(name.clone()));
            }
        }
        let mut ids = HashSet::new();
        for slot in &self.items {
            let id = slot.item.id();
            if !ids.insert(id) {
                return Err(DashboardError::DuplicateItem(id.to_string()));
            }
            if let Some(binding) = slot.item.binding()
                && !names.contains(binding.instrument.as_str())
            {
                return Err(DashboardError::UnknownInstrument {
                    item_id: id.to_string(),
                    instrument: binding.instrument.clone(),
                });
            }
        }
        Ok(())
    }

    async fn event_loop(
        &mut self,
        scheduler: &Scheduler,
        intake_rx: UnboundedReceiver<SchedulerEvent>,
    ) -> Result<(), DashboardError> {
        let mut intake = Some(intake_rx);
        let tick = self.config.tick_interval;

        self.relayout(self.surface.size());
        self.tick_clock();
        self.render_dirty()?;

        loop {
            if self.stop.is_stop_requested() {
                info!("Stop requested");
                return Ok(());
            }
            if !self.step(scheduler, &mut intake)? {
                return Ok(());
            }

            let wake = match intake.as_mut() {
                Some(rx) => tokio::select! {
                    event = rx.recv() => Wake::Event(event),
                    _ = tokio::time::sleep(tick) => Wake::Tick,
                },
                None => {
                    tokio::time::sleep(tick).await;
                    Wake::Tick
                }
            };
            match wake {
                Wake::Event(Some(event)) => self.apply_event(event),
                Wake::Event(None) => {
                    debug!("All poll tasks have exited");
                    intake = None;
                }
                Wake::Tick => {}
            }
        }
    }

    /// One loop iteration without the wait. `Ok(false)` means quit.
    fn step(
        &mut self,
        scheduler: &Scheduler,
        intake: &mut Option<UnboundedReceiver<SchedulerEvent>>,
    ) -> Result<bool, DashboardError> {
        self.drain_intake(intake);

        if let Some(key) = self.surface.poll_key(Duration::ZERO)?
            && let KeyOutcome::Quit = self.route_key(key, scheduler)
        {
            info!("Quit requested from keyboard");
            return Ok(false);
        }

        if let Some(size) = self.surface.take_resize() {
            self.relayout(size);
        }

        self.tick_clock();
        self.render_dirty()?;
        Ok(true)
    }

    fn drain_intake(&mut self, intake: &mut Option<UnboundedReceiver<SchedulerEvent>>) {
        let Some(rx) = intake.as_mut() else {
            return;
        };
        let disconnected = loop {
            match rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => break true,
            }
        };
        if disconnected {
            debug!("All poll tasks have exited");
            *intake = None;
        }
    }

    fn apply_event(&mut self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::Poll(PollResult {
                instrument,
                outcome,
            }) => {
                if let Some((_, health)) = self.health.iter_mut().find(|(n, _)| *n == instrument) {
                    let before = health.clone();
                    health.apply(&outcome);
                    if *health != before {
                        self.chrome_dirty = true;
                    }
                }
                match outcome {
                    PollOutcome::Changed(changes) => {
                        for slot in &mut self.items {
                            if let Some(binding) = slot.item.binding()
                                && binding.instrument == instrument
                                && binding.watches(&changes)
                            {
                                slot.dirty = true;
                            }
                        }
                        let snapshot = self.snapshots.entry(instrument).or_default();
                        for (key, value) in changes {
                            if value.is_null() {
                                snapshot.remove(&key);
                            } else {
                                snapshot.insert(key, value);
                            }
                        }
                    }
                    PollOutcome::Failed(reason) => {
                        self.record(format!("{instrument}: {reason}"));
                    }
                    PollOutcome::Fatal(reason) => {
                        self.mark_bound_dirty(&instrument);
                        self.record(format!("{instrument} stopped: {reason}"));
                    }
                }
            }
            SchedulerEvent::ActionFailed(e) => self.record(e.to_string()),
            SchedulerEvent::Note {
                instrument,
                message,
            } => {
                info!("[{}] {}", instrument, message);
                self.record(format!("{instrument}: {message}"));
            }
        }
    }

    fn record(&mut self, message: String) {
        self.log.push(message);
        if self.chrome.log.is_some() {
            self.chrome_dirty = true;
        }
    }

    fn mark_bound_dirty(&mut self, instrument: &str) {
        for slot in &mut self.items {
            if slot
                .item
                .binding()
                .is_some_and(|b| b.instrument == instrument)
            {
                slot.dirty = true;
            }
        }
    }

    fn mark_all_dirty(&mut self) {
        for slot in &mut self.items {
            slot.dirty = true;
        }
        self.chrome_dirty = true;
        self.clear(Region::of_size(self.surface.size()));
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    fn route_key(&mut self, key: Key, scheduler: &Scheduler) -> KeyOutcome {
        if key.is_interrupt() {
            return KeyOutcome::Quit;
        }

        let capturing = self.focused_is_capturing();
        if !capturing {
            if self.config.quit_keys.contains(&key) {
                return KeyOutcome::Quit;
            }
            if self.config.invert_keys.contains(&key) {
                self.theme.toggle();
                debug!("Colors inverted: {}", self.theme.inverted);
                self.mark_all_dirty();
                return KeyOutcome::Continue;
            }
            if self.config.focus_next_keys.contains(&key) {
                self.move_focus(true);
                return KeyOutcome::Continue;
            }
            if self.config.focus_prev_keys.contains(&key) {
                self.move_focus(false);
                return KeyOutcome::Continue;
            }
        }

        let Some(index) = self.focus else {
            return KeyOutcome::Continue;
        };
        let Some(slot) = self.items.get_mut(index) else {
            return KeyOutcome::Continue;
        };
        let request = slot.item.handle_key(&key);
        slot.dirty = true;
        if slot.item.captures_input() != capturing {
            self.chrome_dirty = true;
        }
        if let Some(request) = request {
            self.dispatch(index, request, scheduler);
        }
        KeyOutcome::Continue
    }

    fn dispatch(&mut self, index: usize, request: ActionRequest, scheduler: &Scheduler) {
        let Some(slot) = self.items.get(index) else {
            return;
        };
        let item_id = slot.item.id().to_string();
        let Some(binding) = slot.item.binding() else {
            warn!("Item '{}' requested an action but has no instrument", item_id);
            return;
        };
        let instrument = binding.instrument.clone();
        if self.health(&instrument).is_some_and(InstrumentHealth::is_stopped) {
            let e = ActionError {
                instrument,
                item_id,
                reason: TASK_STOPPED.to_string(),
            };
            warn!("{}", e);
            self.record(e.to_string());
            return;
        }
        debug!(
            "Action from '{}' to '{}': {}",
            item_id, instrument, request.payload
        );
        if let Err(e) = scheduler.request_action(&instrument, &item_id, request.payload) {
            warn!("{}", e);
            self.record(e.to_string());
        }
    }

    fn focused_is_capturing(&self) -> bool {
        self.focus
            .and_then(|i| self.items.get(i))
            .is_some_and(|s| s.item.captures_input())
    }

    fn focus_candidates(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, s)| s.region.is_some() && s.item.focusable())
            .map(|(i, _)| i)
            .collect()
    }

    fn move_focus(&mut self, forward: bool) {
        let next = cycle_focus(&self.focus_candidates(), self.focus, forward);
        self.set_focus(next);
    }

    fn set_focus(&mut self, next: Option<usize>) {
        if next == self.focus {
            return;
        }
        for index in [self.focus, next].into_iter().flatten() {
            if let Some(slot) = self.items.get_mut(index) {
                slot.dirty = true;
            }
        }
        debug!(
            "Focus moved to {:?}",
            next.and_then(|i| self.items.get(i)).map(|s| s.item.id())
        );
        self.focus = next;
    }

    /// Keeps focus on a visible focusable item after a layout change.
    fn ensure_focus_visible(&mut self) {
        let candidates = self.focus_candidates();
        if self.focus.is_none()
            && let Some(id) = self.initial_focus.take()
        {
            let wanted = candidates
                .iter()
                .copied()
                .find(|&i| self.items.get(i).is_some_and(|s| s.item.id() == id));
            match wanted {
                Some(index) => {
                    self.set_focus(Some(index));
                    return;
                }
                None => warn!("Initial focus '{}' is not a visible focusable item", id),
            }
        }
        match self.focus {
            Some(current) if candidates.contains(&current) => {}
            current => self.set_focus(cycle_focus(&candidates, current, true)),
        }
    }

    // ------------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------------

    fn chrome_spec(&self) -> ChromeSpec {
        let controls_rows = if self.config.show_controls {
            let lines = u16::try_from(self.config.controls_lines().len()).unwrap_or(u16::MAX);
            lines.saturating_add(1)
        } else {
            0
        };
        let log_rows = if self.config.show_log && self.config.max_log_messages > 0 {
            u16::try_from(self.config.max_log_messages)
                .unwrap_or(u16::MAX)
                .saturating_add(1)
        } else {
            0
        };
        ChromeSpec {
            header: !self.config.header.is_empty() || self.config.show_time,
            status: true,
            controls_rows,
            log_rows,
        }
    }

    fn relayout(&mut self, size: Size) {
        self.chrome = ChromeLayout::compute(size, &self.chrome_spec());
        let requests: Vec<LayoutRequest> = self
            .items
            .iter()
            .map(|s| LayoutRequest {
                min_size: s.item.min_size(),
                placement: s.item.placement(),
            })
            .collect();
        self.plan = self.layout.compute(self.chrome.content, &requests);

        for (index, slot) in self.items.iter_mut().enumerate() {
            slot.region = self.plan.region(index);
        }
        let hidden = self.plan.hidden_count();
        if hidden > 0 {
            warn!(
                "{} of {} items do not fit in {}x{} and are hidden",
                hidden,
                self.items.len(),
                size.cols,
                size.rows
            );
        } else {
            debug!("Layout for {}x{}: all items visible", size.cols, size.rows);
        }

        self.mark_all_dirty();
        self.ensure_focus_visible();
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    fn tick_clock(&mut self) {
        if !self.config.show_time {
            return;
        }
        let now = Local::now().format(CLOCK_FORMAT).to_string();
        if self.clock.as_deref() != Some(now.as_str()) {
            self.clock = Some(now);
            self.chrome_dirty = true;
        }
    }

    fn render_dirty(&mut self) -> Result<(), DashboardError> {
        let mut drew = false;
        if self.chrome_dirty {
            self.chrome_dirty = false;
            self.render_chrome();
            drew = true;
        }

        let dirty: Vec<(usize, Region)> = self
            .items
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                if !std::mem::take(&mut slot.dirty) {
                    return None;
                }
                slot.region.map(|region| (index, region))
            })
            .collect();

        for (index, region) in dirty {
            self.render_item(index, region)?;
            drew = true;
        }

        if drew {
            self.surface.refresh()?;
        }
        Ok(())
    }

    fn render_item(&mut self, index: usize, region: Region) -> Result<(), DashboardError> {
        let Some(slot) = self.items.get(index) else {
            return Ok(());
        };
        let empty = DataMap::new();
        let (data, stale) = match slot.item.binding() {
            Some(binding) => (
                self.snapshots.get(&binding.instrument).unwrap_or(&empty),
                self.health(&binding.instrument)
                    .is_some_and(InstrumentHealth::is_stopped),
            ),
            None => (&empty, false),
        };
        let ctx = RenderContext {
            region,
            data,
            focused: self.focus == Some(index),
            stale,
            theme: &self.theme,
        };

        let cells = match panic::catch_unwind(AssertUnwindSafe(|| slot.item.render(&ctx))) {
            Ok(Ok(cells)) => cells,
            Ok(Err(e)) => {
                let message = format!("{}: render failed: {}", slot.item.id(), e);
                warn!("{}", message);
                self.record(message);
                return Ok(());
            }
            Err(_) => {
                let id = slot.item.id().to_string();
                error!("Item '{}' panicked while rendering", id);
                return Err(DashboardError::ItemPanicked(id));
            }
        };

        self.clear(region);
        for cell in cells
            .iter()
            .filter(|c| region.contains_cell(c.row, c.col))
        {
            self.surface.write_cell(cell);
        }
        Ok(())
    }

    fn render_chrome(&mut self) {
        let size = self.surface.size();
        let mut scratch = Buffer::empty(Rect::from(Region::of_size(size)));

        if let Some(region) = self.chrome.header {
            HeaderBar::new(self.config.header.clone(), self.clock.clone(), &self.theme)
                .render(&mut scratch, region.into());
        }
        if let Some(region) = self.chrome.controls {
            Section {
                title: "Controls",
                lines: self.config.controls_lines(),
                theme: &self.theme,
            }
            .render(&mut scratch, region.into());
        }
        if let Some(region) = self.chrome.log {
            Section {
                title: "Log",
                lines: self.log.entries().map(LogEntry::line).collect(),
                theme: &self.theme,
            }
            .render(&mut scratch, region.into());
        }
        if let Some(region) = self.chrome.status {
            StatusLine {
                health: &self.health,
                hidden_items: self.plan.hidden_count(),
                editing: self.focused_is_capturing(),
                theme: &self.theme,
            }
            .render(&mut scratch, region.into());
        }

        let sections: Vec<Region> = self.chrome.sections().collect();
        for region in sections {
            for row in region.row..region.row.saturating_add(region.height) {
                for col in region.col..region.col.saturating_add(region.width) {
                    if let Some(cell) = scratch.cell((col, row)) {
                        self.surface.write_cell(&Cell {
                            row,
                            col,
                            symbol: cell.symbol().to_string(),
                            style: cell.style(),
                        });
                    }
                }
            }
        }
    }

    fn clear(&mut self, region: Region) {
        let style = self.theme.base();
        for row in region.row..region.row.saturating_add(region.height) {
            for col in region.col..region.col.saturating_add(region.width) {
                self.surface.write_cell(&Cell {
                    row,
                    col,
                    symbol: " ".to_string(),
                    style,
                });
            }
        }
    }
}

/// Next focus among `candidates` (ascending registration indices), wrapping
/// around. With no current focus, starts at either end.
fn cycle_focus(candidates: &[usize], current: Option<usize>, forward: bool) -> Option<usize> {
    let Some(current) = current else {
        return if forward {
            candidates.first().copied()
        } else {
            candidates.last().copied()
        };
    };
    if forward {
        candidates
            .iter()
            .copied()
            .find(|&i| i > current)
            .or_else(|| candidates.first().copied())
    } else {
        candidates
            .iter()
            .rev()
            .copied()
            .find(|&i| i < current)
            .or_else(|| candidates.last().copied())
    }
}
