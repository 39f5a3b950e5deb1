//! # Demo Bench
//!
//! Simulated instruments wired to a small dashboard, so the binary shows
//! something useful without hardware:
//!
//! - `psu`: a bench power supply with a switchable output
//! - `temp`: a heated chamber that drifts toward an editable setpoint
//! - `net`: TCP reachability of `--check` endpoints (only if any are given)

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use serde_json::{Value, json};
use tokio::net::TcpStream;

use labterm::core::{DashboardError, DataMap, Instrument, InstrumentError, Notifier};
use labterm::tui::components::{Editable, Gauge, Label, Light, Readonly, Switch};
use labterm::tui::{Dashboard, TerminalSurface};

const PSU_SETPOINT_V: f64 = 12.0;
const PSU_LOAD_OHMS: f64 = 10.0;
const CHAMBER_AMBIENT_C: f64 = 21.0;
const SETPOINT_RANGE_C: (f64, f64) = (0.0, 100.0);
const CHECK_TIMEOUT: Duration = Duration::from_millis(800);

pub fn populate<S: TerminalSurface>(
    dashboard: &mut Dashboard<S>,
    targets: &[String],
) -> Result<(), DashboardError> {
    dashboard.add_instrument(PowerSupply::new())?;
    dashboard.add_instrument(Chamber::new())?;

    dashboard.add_item(Label::new("psu-title", "Power supply"))?;
    dashboard.add_item(Switch::new("psu-on", "psu", "on").label("Output"))?;
    dashboard.add_item(
        Readonly::new("psu-v", "psu", "voltage")
            .label("Voltage")
            .suffix(" V")
            .decimals(2),
    )?;
    dashboard.add_item(
        Readonly::new("psu-i", "psu", "current")
            .label("Current")
            .suffix(" A")
            .decimals(3),
    )?;

    dashboard.add_item(Label::new("temp-title", "Chamber"))?;
    dashboard.add_item(
        Gauge::new("temp-t", "temp", "t", SETPOINT_RANGE_C.0, SETPOINT_RANGE_C.1)
            .label("Temp °C")
            .decimals(1),
    )?;
    dashboard.add_item(
        Editable::new("temp-sp", "temp", "setpoint", "set_setpoint")
            .label("Setpoint")
            .decimals(1),
    )?;
    dashboard.add_item(Light::new("temp-heat", "temp", "heating").label("Heating"))?;

    if !targets.is_empty() {
        dashboard.add_instrument(TcpCheck::new(targets.to_vec()))?;
        dashboard.add_item(Label::new("net-title", "Network"))?;
        for (i, target) in targets.iter().enumerate() {
            let light = Light::new(format!("net-{i}"), "net", target).label(target.clone());
            dashboard.add_item(light)?;
        }
    }
    Ok(())
}

/// Smooth pseudo-noise in [-1, 1] from elapsed time.
fn wobble(started: Instant, period_s: f64) -> f64 {
    (started.elapsed().as_secs_f64() * std::f64::consts::TAU / period_s).sin()
}

fn command(payload: &Value) -> &str {
    payload.get("cmd").and_then(Value::as_str).unwrap_or_default()
}

struct PowerSupply {
    data: DataMap,
    started: Instant,
}

impl PowerSupply {
    fn new() -> Self {
        let mut data = DataMap::new();
        data.insert("on".to_string(), json!(false));
        data.insert("voltage".to_string(), json!(0.0));
        data.insert("current".to_string(), json!(0.0));
        Self {
            data,
            started: Instant::now(),
        }
    }

    fn is_on(&self) -> bool {
        self.data.get("on").and_then(Value::as_bool).unwrap_or(false)
    }
}

#[async_trait]
impl Instrument for PowerSupply {
    fn name(&self) -> &str {
        "psu"
    }

    fn data(&self) -> &DataMap {
        &self.data
    }

    async fn update_data(&mut self) -> Result<(), InstrumentError> {
        let (voltage, current) = if self.is_on() {
            let v = PSU_SETPOINT_V + 0.02 * wobble(self.started, 7.0);
            (v, v / PSU_LOAD_OHMS)
        } else {
            (0.0, 0.0)
        };
        self.data.insert("voltage".to_string(), json!(voltage));
        self.data.insert("current".to_string(), json!(current));
        Ok(())
    }

    async fn action(&mut self, item_id: &str, payload: &Value) -> Result<(), InstrumentError> {
        match command(payload) {
            "toggle" => {
                let on = !self.is_on();
                debug!("psu output {} (from '{}')", if on { "on" } else { "off" }, item_id);
                self.data.insert("on".to_string(), json!(on));
                self.update_data().await
            }
            other => Err(InstrumentError::poll(format!("unknown command '{other}'"))),
        }
    }
}

struct Chamber {
    data: DataMap,
    started: Instant,
    notifier: Option<Notifier>,
}

impl Chamber {
    fn new() -> Self {
        let mut data = DataMap::new();
        data.insert("t".to_string(), json!(CHAMBER_AMBIENT_C));
        data.insert("setpoint".to_string(), json!(CHAMBER_AMBIENT_C));
        data.insert("heating".to_string(), json!(false));
        Self {
            data,
            started: Instant::now(),
            notifier: None,
        }
    }

    fn number(&self, key: &str) -> f64 {
        self.data.get(key).and_then(Value::as_f64).unwrap_or(CHAMBER_AMBIENT_C)
    }
}

#[async_trait]
impl Instrument for Chamber {
    fn name(&self) -> &str {
        "temp"
    }

    fn data(&self) -> &DataMap {
        &self.data
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(500))
    }

    fn attach(&mut self, notifier: Notifier) {
        self.notifier = Some(notifier);
    }

    async fn update_data(&mut self) -> Result<(), InstrumentError> {
        let t = self.number("t");
        let setpoint = self.number("setpoint");
        let next = t + 0.1 * (setpoint - t) + 0.05 * wobble(self.started, 11.0);
        let was_heating = self.data.get("heating").and_then(Value::as_bool).unwrap_or(false);
        let heating = next < setpoint - 0.2;

        self.data.insert("t".to_string(), json!((next * 100.0).round() / 100.0));
        self.data.insert("heating".to_string(), json!(heating));
        if was_heating
            && !heating
            && let Some(notifier) = &self.notifier
        {
            notifier.notify(format!("reached {setpoint:.1} °C"));
        }
        Ok(())
    }

    async fn action(&mut self, _item_id: &str, payload: &Value) -> Result<(), InstrumentError> {
        match command(payload) {
            "set_setpoint" => {
                let value = payload
                    .get("value")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| InstrumentError::poll("setpoint must be a number"))?;
                let (lo, hi) = SETPOINT_RANGE_C;
                if !(lo..=hi).contains(&value) {
                    return Err(InstrumentError::poll(format!(
                        "setpoint {value} outside {lo}..{hi} °C"
                    )));
                }
                self.data.insert("setpoint".to_string(), json!(value));
                Ok(())
            }
            other => Err(InstrumentError::poll(format!("unknown command '{other}'"))),
        }
    }
}

/// One boolean key per `host:port` target: whether a TCP connect succeeds.
struct TcpCheck {
    targets: Vec<String>,
    data: DataMap,
}

impl TcpCheck {
    fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            data: DataMap::new(),
        }
    }
}

async fn reachable(target: &str) -> bool {
    matches!(
        tokio::time::timeout(CHECK_TIMEOUT, TcpStream::connect(target)).await,
        Ok(Ok(_))
    )
}

#[async_trait]
impl Instrument for TcpCheck {
    fn name(&self) -> &str {
        "net"
    }

    fn data(&self) -> &DataMap {
        &self.data
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(Duration::from_secs(2))
    }

    async fn update_data(&mut self) -> Result<(), InstrumentError> {
        let results = futures::future::join_all(self.targets.iter().map(|t| reachable(t))).await;
        for (target, up) in self.targets.iter().zip(results) {
            self.data.insert(target.clone(), json!(up));
        }
        Ok(())
    }

    async fn action(&mut self, _item_id: &str, _payload: &Value) -> Result<(), InstrumentError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_psu_toggle_powers_output() {
        let mut psu = PowerSupply::new();
        psu.action("psu-on", &json!({ "cmd": "toggle" })).await.unwrap();
        assert!(psu.is_on());
        let v = psu.data()["voltage"].as_f64().unwrap();
        assert!((v - PSU_SETPOINT_V).abs() < 0.1);
        psu.action("psu-on", &json!({ "cmd": "toggle" })).await.unwrap();
        assert_eq!(psu.data()["voltage"], json!(0.0));
    }

    #[tokio::test]
    async fn test_chamber_rejects_out_of_range_setpoint() {
        let mut chamber = Chamber::new();
        let err = chamber
            .action("temp-sp", &json!({ "cmd": "set_setpoint", "value": 400.0 }))
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(chamber.data()["setpoint"], json!(CHAMBER_AMBIENT_C));
    }

    #[tokio::test]
    async fn test_chamber_heats_toward_setpoint() {
        let mut chamber = Chamber::new();
        chamber
            .action("temp-sp", &json!({ "cmd": "set_setpoint", "value": 60.0 }))
            .await
            .unwrap();
        chamber.update_data().await.unwrap();
        assert!(chamber.number("t") > CHAMBER_AMBIENT_C);
        assert_eq!(chamber.data()["heating"], json!(true));
    }

    #[tokio::test]
    async fn test_check_marks_closed_port_down() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().to_string();
        drop(listener);
        let mut check = TcpCheck::new(vec![open.clone()]);
        check.update_data().await.unwrap();
        assert_eq!(check.data()[&open], json!(false));
    }

    #[test]
    fn test_populate_registers_demo_items() {
        let surface = labterm::HeadlessSurface::new(80, 24).unwrap();
        let mut dashboard = Dashboard::new(surface, Default::default());
        populate(&mut dashboard, &["127.0.0.1:1".to_string()]).unwrap();
        assert!(matches!(
            populate(&mut dashboard, &[]),
            Err(DashboardError::DuplicateInstrument(_))
        ));
    }
}
