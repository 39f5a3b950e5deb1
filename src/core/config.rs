//! # Configuration
//!
//! Centralizes all dashboard settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.labterm/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::key::{Key, ParseKeyError};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LabtermConfig {
    #[serde(default)]
    pub dashboard: DashboardSection,
    #[serde(default)]
    pub keys: KeysSection,
    #[serde(default)]
    pub chrome: ChromeSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DashboardSection {
    pub tick_interval_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

/// Key names as written in the file. Parsed during resolution.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct KeysSection {
    pub focus_next: Option<Vec<String>>,
    pub focus_prev: Option<Vec<String>>,
    pub quit: Option<Vec<String>>,
    pub invert: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChromeSection {
    pub header: Option<String>,
    pub show_time: Option<bool>,
    pub show_log: Option<bool>,
    pub show_controls: Option<bool>,
    pub controls_text: Option<String>,
    pub max_log_messages: Option<usize>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 300;
pub const DEFAULT_MAX_LOG_MESSAGES: usize = 6;
pub const DEFAULT_HEADER: &str = "labterm";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Minimum wake period of the render/input loop.
    pub tick_interval: Duration,
    /// Poll interval for instruments that do not set their own.
    pub default_poll_interval: Duration,
    pub focus_next_keys: Vec<Key>,
    pub focus_prev_keys: Vec<Key>,
    pub quit_keys: Vec<Key>,
    pub invert_keys: Vec<Key>,
    pub header: String,
    pub show_time: bool,
    pub show_log: bool,
    pub show_controls: bool,
    /// Replaces the generated key summary in the *Controls* section.
    pub controls_text: Option<String>,
    pub max_log_messages: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            default_poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            focus_next_keys: vec![Key::Tab, Key::Down, Key::Right],
            focus_prev_keys: vec![Key::BackTab, Key::Up, Key::Left],
            quit_keys: vec![Key::Char('q')],
            invert_keys: vec![Key::Char('i')],
            header: DEFAULT_HEADER.to_string(),
            show_time: true,
            show_log: true,
            show_controls: true,
            controls_text: None,
            max_log_messages: DEFAULT_MAX_LOG_MESSAGES,
        }
    }
}

impl DashboardConfig {
    /// Lines of the *Controls* section, excluding its title.
    pub fn controls_lines(&self) -> Vec<String> {
        if let Some(text) = &self.controls_text {
            return text.lines().map(str::to_string).collect();
        }
        let mut quit = join_keys(&self.quit_keys);
        quit.push_str(" Ctrl-C");
        vec![
            format!(
                "focus: {} / {}",
                join_keys(&self.focus_next_keys),
                join_keys(&self.focus_prev_keys)
            ),
            "Enter: activate or edit   Esc: cancel edit".to_string(),
            format!("quit: {quit}   invert: {}", join_keys(&self.invert_keys)),
        ]
    }
}

fn join_keys(keys: &[Key]) -> String {
    keys.iter()
        .map(Key::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Values given on the command line. `None` = not specified.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub tick_interval_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub header: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidKey { field: &'static str, source: ParseKeyError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::InvalidKey { field, source } => {
                write!(f, "config error in keys.{field}: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.labterm/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".labterm").join("config.toml"))
}

/// Load config from `path`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `LabtermConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config(path: &Path) -> Result<LabtermConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(LabtermConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: LabtermConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_CONTENT: &str = r#"# labterm configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [dashboard]
# tick_interval_ms = 50        # Or set LABTERM_TICK_INTERVAL_MS
# poll_interval_ms = 300       # Or set LABTERM_POLL_INTERVAL_MS

# [keys]
# focus_next = ["Tab", "Down", "Right"]
# focus_prev = ["Shift-Tab", "Up", "Left"]
# quit = ["q"]                 # Ctrl-C always quits
# invert = ["i"]

# [chrome]
# header = "labterm"           # Or set LABTERM_HEADER
# show_time = true
# show_log = true
# show_controls = true
# controls_text = "Tab: next\nq: quit"
# max_log_messages = 6
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_CONTENT) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &LabtermConfig, cli: &CliOverrides) -> Result<DashboardConfig, ConfigError> {
    resolve_with(config, cli, |name| std::env::var(name).ok())
}

/// Same as [`resolve`] with an explicit environment lookup.
pub fn resolve_with<F>(
    config: &LabtermConfig,
    cli: &CliOverrides,
    env: F,
) -> Result<DashboardConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = DashboardConfig::default();

    let tick_ms = cli
        .tick_interval_ms
        .or_else(|| env_millis(&env, "LABTERM_TICK_INTERVAL_MS"))
        .or(config.dashboard.tick_interval_ms)
        .unwrap_or(DEFAULT_TICK_INTERVAL_MS);

    let poll_ms = cli
        .poll_interval_ms
        .or_else(|| env_millis(&env, "LABTERM_POLL_INTERVAL_MS"))
        .or(config.dashboard.poll_interval_ms)
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

    let header = cli
        .header
        .clone()
        .or_else(|| env("LABTERM_HEADER"))
        .or_else(|| config.chrome.header.clone())
        .unwrap_or(defaults.header);

    let chrome = &config.chrome;
    Ok(DashboardConfig {
        tick_interval: Duration::from_millis(tick_ms.max(1)),
        default_poll_interval: Duration::from_millis(poll_ms.max(1)),
        focus_next_keys: parse_keys("focus_next", &config.keys.focus_next)?
            .unwrap_or(defaults.focus_next_keys),
        focus_prev_keys: parse_keys("focus_prev", &config.keys.focus_prev)?
            .unwrap_or(defaults.focus_prev_keys),
        quit_keys: parse_keys("quit", &config.keys.quit)?.unwrap_or(defaults.quit_keys),
        invert_keys: parse_keys("invert", &config.keys.invert)?.unwrap_or(defaults.invert_keys),
        header,
        show_time: chrome.show_time.unwrap_or(defaults.show_time),
        show_log: chrome.show_log.unwrap_or(defaults.show_log),
        show_controls: chrome.show_controls.unwrap_or(defaults.show_controls),
        controls_text: chrome.controls_text.clone(),
        max_log_messages: chrome.max_log_messages.unwrap_or(defaults.max_log_messages),
    })
}

fn env_millis<F>(env: &F, name: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = env(name)?;
    match raw.trim().parse() {
        Ok(ms) => Some(ms),
        Err(_) => {
            warn!("Ignoring {name}={raw:?}: not a number of milliseconds");
            None
        }
    }
}

fn parse_keys(
    field: &'static str,
    names: &Option<Vec<String>>,
) -> Result<Option<Vec<Key>>, ConfigError> {
    let Some(names) = names else {
        return Ok(None);
    };
    names
        .iter()
        .map(|name| name.parse::<Key>())
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
        .map_err(|source| ConfigError::InvalidKey { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_parses() {
        let config = LabtermConfig::default();
        assert!(config.dashboard.tick_interval_ms.is_none());
        assert!(config.keys.quit.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved =
            resolve_with(&LabtermConfig::default(), &CliOverrides::default(), no_env).unwrap();
        assert_eq!(resolved, DashboardConfig::default());
        assert_eq!(resolved.tick_interval, Duration::from_millis(50));
        assert_eq!(resolved.default_poll_interval, Duration::from_millis(300));
        assert_eq!(resolved.max_log_messages, 6);
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config: LabtermConfig = toml::from_str(
            r#"
[dashboard]
tick_interval_ms = 20
poll_interval_ms = 1000

[keys]
quit = ["x", "Esc"]

[chrome]
header = "Bench 3"
show_log = false
max_log_messages = 2
"#,
        )
        .unwrap();
        let resolved = resolve_with(&config, &CliOverrides::default(), no_env).unwrap();
        assert_eq!(resolved.tick_interval, Duration::from_millis(20));
        assert_eq!(resolved.default_poll_interval, Duration::from_secs(1));
        assert_eq!(resolved.quit_keys, vec![Key::Char('x'), Key::Esc]);
        assert_eq!(resolved.header, "Bench 3");
        assert!(!resolved.show_log);
        assert_eq!(resolved.max_log_messages, 2);
        assert_eq!(resolved.focus_next_keys, DashboardConfig::default().focus_next_keys);
    }

    #[test]
    fn test_env_overrides_file_and_cli_overrides_env() {
        let config = LabtermConfig {
            dashboard: DashboardSection {
                tick_interval_ms: Some(20),
                poll_interval_ms: Some(500),
            },
            ..Default::default()
        };
        let env = |name: &str| match name {
            "LABTERM_TICK_INTERVAL_MS" => Some("30".to_string()),
            "LABTERM_POLL_INTERVAL_MS" => Some("700".to_string()),
            "LABTERM_HEADER" => Some("from env".to_string()),
            _ => None,
        };
        let cli = CliOverrides {
            poll_interval_ms: Some(900),
            ..Default::default()
        };
        let resolved = resolve_with(&config, &cli, env).unwrap();
        assert_eq!(resolved.tick_interval, Duration::from_millis(30));
        assert_eq!(resolved.default_poll_interval, Duration::from_millis(900));
        assert_eq!(resolved.header, "from env");
    }

    #[test]
    fn test_malformed_env_value_is_ignored() {
        let env = |_: &str| Some("soon".to_string());
        let resolved =
            resolve_with(&LabtermConfig::default(), &CliOverrides::default(), env).unwrap();
        assert_eq!(resolved.tick_interval, Duration::from_millis(DEFAULT_TICK_INTERVAL_MS));
    }

    #[test]
    fn test_zero_intervals_are_clamped() {
        let cli = CliOverrides {
            tick_interval_ms: Some(0),
            poll_interval_ms: Some(0),
            header: None,
        };
        let resolved = resolve_with(&LabtermConfig::default(), &cli, no_env).unwrap();
        assert_eq!(resolved.tick_interval, Duration::from_millis(1));
        assert_eq!(resolved.default_poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_invalid_key_name_is_reported() {
        let config: LabtermConfig = toml::from_str("[keys]\ninvert = [\"F13\"]").unwrap();
        let err = resolve_with(&config, &CliOverrides::default(), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey { field: "invert", .. }));
        assert!(err.to_string().contains("F13"));
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config: LabtermConfig = toml::from_str("[chrome]\nshow_time = false\n").unwrap();
        assert_eq!(config.chrome.show_time, Some(false));
        assert!(config.chrome.header.is_none());
        assert!(config.dashboard.poll_interval_ms.is_none());
    }

    #[test]
    fn test_generated_default_is_valid_toml() {
        let config: LabtermConfig = toml::from_str(DEFAULT_CONFIG_CONTENT).unwrap();
        assert!(config.chrome.header.is_none());
    }

    #[test]
    fn test_load_config_generates_default_when_missing() {
        let dir = std::env::temp_dir().join(format!("labterm-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let config = load_config(&path).unwrap();
        assert!(config.dashboard.tick_interval_ms.is_none());
        assert!(path.exists());

        fs::write(&path, "[dashboard]\ntick_interval_ms = 75\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.dashboard.tick_interval_ms, Some(75));

        fs::write(&path, "[dashboard\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_controls_lines_follow_configured_keys() {
        let config = DashboardConfig::default();
        let lines = config.controls_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Tab"));
        assert!(lines[2].contains("q Ctrl-C"));

        let custom = DashboardConfig {
            controls_text: Some("one\ntwo".to_string()),
            ..Default::default()
        };
        assert_eq!(custom.controls_lines(), vec!["one", "two"]);
    }
}
