//! Commandline argument parser using clap for SenseDash

use crate::config::{ConfigError, DashConfig};
use crate::rolling_window::EvictionPolicy;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Live dashboard for the sleep monitoring wearable
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct DashArgs {
    #[command(subcommand)]
    /// Where the sensor stream comes from
    pub command: SourceCommand,

    /// Config file in ron format; flags below override it
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Number of points kept on each chart
    #[arg(long = "capacity")]
    pub capacity: Option<usize>,

    /// What a chart does when it is full
    #[arg(short = 'p', long = "policy", value_enum)]
    pub policy: Option<PolicyArg>,

    /// Directory exported tables are written to
    #[arg(short = 'o', long = "export-dir")]
    pub export_dir: Option<PathBuf>,
}

/// The source a session reads from.
#[derive(Debug, Subcommand, Clone)]
pub enum SourceCommand {
    /// Stream from a serial device, such as a BLE UART bridge
    #[command(about)]
    Serial(SerialCommand),

    /// Replay a captured stream from a file, or stdin when given `-`
    #[command(about)]
    Replay(ReplayCommand),

    /// Stream from a simulated wearable
    #[command(about)]
    Demo(DemoCommand),
}

/// Options for a serial device.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct SerialCommand {
    /// Device path; when omitted a device selector is shown
    #[arg(long = "port")]
    pub port: Option<PathBuf>,

    /// Line speed, overrides the config file
    #[arg(short = 'b', long = "baud")]
    pub baud: Option<u32>,
}

/// Options for replaying a capture.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct ReplayCommand {
    /// Capture file to replay
    pub file: PathBuf,

    /// Largest chunk handed to the dashboard at once, in bytes
    #[arg(long = "chunk", default_value_t = 20)]
    pub chunk: usize,

    /// Pause between chunks, in milliseconds
    #[arg(short = 'i', long = "interval-ms", default_value_t = 10)]
    pub interval_ms: u64,
}

/// Options for the simulated wearable.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct DemoCommand {
    /// Records per second
    #[arg(short = 'r', long = "rate", default_value_t = 2.0)]
    pub rate: f64,
}

/// Commandline spelling of an [`EvictionPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Slide the window, dropping the oldest point
    Shift,
    /// Collapse a full window into its average
    Compress,
}

impl From<PolicyArg> for EvictionPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Shift => EvictionPolicy::Shift,
            PolicyArg::Compress => EvictionPolicy::Compress,
        }
    }
}

impl DashArgs {
    /// Loads the config file, if one was given, and applies the flags on top
    /// of it.
    pub fn resolve_config(&self) -> Result<DashConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => DashConfig::from_path(path)?,
            None => DashConfig::default(),
        };

        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(policy) = self.policy {
            config.policy = policy.into();
        }
        if let Some(export_dir) = &self.export_dir {
            config.export_dir = export_dir.clone();
        }
        if let SourceCommand::Serial(SerialCommand {
            baud: Some(baud), ..
        }) = &self.command
        {
            config.baud_rate = *baud;
        }

        config.validate()?;
        Ok(config)
    }
}
