mod demo;

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use labterm::core::config::{self, CliOverrides, LabtermConfig};
use labterm::tui::{CrosstermSurface, Dashboard};
use log::{error, info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "labterm", about = "Terminal dashboard for lab instruments")]
struct Args {
    /// Config file (default: ~/.labterm/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render loop tick in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Default instrument poll interval in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Header title
    #[arg(long)]
    header: Option<String>,

    /// Where to write the debug log
    #[arg(long, default_value = "labterm.log")]
    log_file: PathBuf,

    /// TCP endpoint to monitor, as host:port (repeatable)
    #[arg(long = "check", value_name = "HOST:PORT")]
    checks: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // The terminal is in raw mode while running, so logs go to a file.
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&args.log_file) {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match args.config.clone().or_else(config::config_path) {
        Some(path) => config::load_config(&path)?,
        None => {
            warn!("No home directory found, using built-in defaults");
            LabtermConfig::default()
        }
    };
    let overrides = CliOverrides {
        tick_interval_ms: args.tick_ms,
        poll_interval_ms: args.poll_ms,
        header: args.header.clone(),
    };
    let config = config::resolve(&file_config, &overrides)?;
    info!("Labterm starting up: {:?}", config);

    let surface = CrosstermSurface::init()?;
    let mut dashboard = Dashboard::new(surface, config);
    demo::populate(&mut dashboard, &args.checks)?;

    let stop = dashboard.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });

    if let Err(e) = dashboard.run().await {
        error!("Labterm exited with error: {}", e);
        return Err(e.into());
    }
    Ok(())
}
