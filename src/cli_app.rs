//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use thiserror::Error;

use xsmon::core::color::{Rgb, Rgba};
use xsmon::core::config::Config;
use xsmon::core::errors::{ErrorCategory, XsmonError};
use xsmon::daemon::loop_main::EventLoop;
use xsmon::logger;
use xsmon::platform::pal::detect_platform;
use xsmon::x11::X11Display;

/// xsmon — CPU and memory sparklines for the X11 system tray.
#[derive(Debug, Parser)]
#[command(
    name = "xsmon",
    author,
    version,
    about = "System tray CPU and memory monitor",
    long_about = None,
    disable_version_flag = true
)]
pub struct Cli {
    /// Icon background color.
    #[arg(long = "bg_color", value_name = "#RRGGBB")]
    bg_color: Option<Rgb>,
    /// CPU graph color.
    #[arg(long = "cpu_color", value_name = "#RRGGBB")]
    cpu_color: Option<Rgb>,
    /// Memory graph color.
    #[arg(long = "mem_color", value_name = "#RRGGBB")]
    mem_color: Option<Rgb>,
    /// Alert tint, blended over the graph colors.
    #[arg(long = "alert_color", value_name = "#RRGGBB[AA]")]
    alert_color: Option<Rgba>,
    /// CPU alert threshold in percent.
    #[arg(long = "cpu_alert", value_name = "PERCENT")]
    cpu_alert: Option<f64>,
    /// Memory alert threshold in percent.
    #[arg(long = "mem_alert", value_name = "PERCENT")]
    mem_alert: Option<f64>,
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log at debug level (unless RUST_LOG is set).
    #[arg(long)]
    verbose: bool,
    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
    /// Print version.
    #[arg(short = 'v', long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: (),
}

impl Cli {
    /// Layer the command-line flags over `config`. Flags win.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(color) = self.bg_color {
            config.colors.background = color;
        }
        if let Some(color) = self.cpu_color {
            config.colors.cpu = color;
        }
        if let Some(color) = self.mem_color {
            config.colors.memory = color;
        }
        if let Some(color) = self.alert_color {
            config.colors.alert = color;
        }
        if let Some(threshold) = self.cpu_alert {
            config.alerts.cpu_threshold = threshold;
        }
        if let Some(threshold) = self.mem_alert {
            config.alerts.memory_threshold = threshold;
        }
    }

    /// Defaults, then file, then environment, then flags.
    fn effective_config(&self) -> Result<Config, CliError> {
        let mut config = Config::load(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration, metric, or display failure.
    #[error(transparent)]
    Xsmon(#[from] XsmonError),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Xsmon(_) | Self::Io(_) => 1,
        }
    }

    /// Follow-up line for the exit message, by failure class.
    pub fn hint(&self) -> Option<&'static str> {
        let Self::Xsmon(error) = self else {
            return None;
        };
        Some(match error.category() {
            ErrorCategory::Config => {
                "check the config file, XSMON_* variables and flags (--print-config shows the merged result)"
            }
            ErrorCategory::Environment => {
                "check that $DISPLAY names a reachable X server and that files are readable"
            }
            ErrorCategory::Metric => "system counters under /proc are missing or malformed",
        })
    }
}

/// Resolve configuration, then either print it or run the tray monitor.
///
/// Configuration problems surface here, before any display connection.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    logger::init(cli.verbose);
    let config = cli.effective_config()?;

    if cli.print_config {
        let mut out = io::stdout().lock();
        out.write_all(config.to_toml()?.as_bytes())?;
        out.flush()?;
        return Ok(());
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_hash = %config.stable_hash()?,
        "starting xsmon"
    );

    let platform = detect_platform()?;
    let display = X11Display::connect(None)?;
    let mut event_loop = EventLoop::new(display, &config, platform)?;
    event_loop.run()?;
    Ok(())
}
