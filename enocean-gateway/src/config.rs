//! Configuration file format and command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use enocean_protocol::{Address, EepId};

use crate::capability::CapabilityOptions;
use crate::error::GatewayError;
use crate::gateway::GatewayOptions;
use crate::transport::{TransportTarget, DEFAULT_BAUD_RATE};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "enocean-gateway.toml";

/// enocean-gateway - monitor EnOcean devices through an ESP3 radio module
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serial port of the radio module
    #[arg(short, long)]
    pub port: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    pub baud_rate: Option<u32>,

    /// Serial-to-TCP bridge address (host:port) instead of a serial port
    #[arg(short, long)]
    pub tcp: Option<String>,

    /// Configuration file path
    #[arg(short = 'f', long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory where log files are stored
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Number of days to keep log files
    #[arg(long)]
    pub log_retention_days: Option<u64>,
}

/// Configuration file contents.
#[derive(Debug, Deserialize, Default)]
pub struct GatewayConfig {
    #[serde(default)]
    pub transport: TransportSection,
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TransportSection {
    pub serial_port: Option<String>,
    pub baud_rate: Option<u32>,
    pub tcp_address: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GatewaySection {
    pub response_timeout_ms: Option<u64>,
    pub cover_watchdog_secs: Option<u64>,
    pub command_queue_depth: Option<usize>,
    pub sender_address: Option<Address>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoggingSection {
    pub log_dir: Option<PathBuf>,
    pub retention_days: Option<u64>,
    pub level: Option<String>,
}

/// A device registered at start-up.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceEntry {
    pub address: Address,
    pub eep: EepId,
}

impl GatewayConfig {
    pub fn from_toml(contents: &str) -> Result<Self, GatewayError> {
        toml::from_str(contents).map_err(|e| GatewayError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    /// Load the file named on the command line, else the default file if present.
    pub fn resolve(args: &Args) -> Result<Self, GatewayError> {
        let path = args.config.clone().or_else(|| {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            default_path.exists().then_some(default_path)
        });
        match path {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Transport from the command line, falling back to the file.
    pub fn transport_target(&self, args: &Args) -> Result<TransportTarget, GatewayError> {
        if let Some(address) = args.tcp.as_ref() {
            return Ok(TransportTarget::Tcp(address.clone()));
        }
        let baud_rate = args
            .baud_rate
            .or(self.transport.baud_rate)
            .unwrap_or(DEFAULT_BAUD_RATE);
        if let Some(port) = args.port.as_ref() {
            return Ok(TransportTarget::Serial {
                port: port.clone(),
                baud_rate,
            });
        }
        if let Some(address) = self.transport.tcp_address.as_ref() {
            return Ok(TransportTarget::Tcp(address.clone()));
        }
        match self.transport.serial_port.as_ref() {
            Some(port) => Ok(TransportTarget::Serial {
                port: port.clone(),
                baud_rate,
            }),
            None => Err(GatewayError::Config(
                "no transport configured, use --port or --tcp".into(),
            )),
        }
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        let defaults = GatewayOptions::default();
        let mut capabilities = CapabilityOptions::default();
        if let Some(secs) = self.gateway.cover_watchdog_secs {
            capabilities.cover_watchdog = Duration::from_secs(secs);
        }
        GatewayOptions {
            response_timeout: self
                .gateway
                .response_timeout_ms
                .map_or(defaults.response_timeout, Duration::from_millis),
            command_queue_depth: self
                .gateway
                .command_queue_depth
                .unwrap_or(defaults.command_queue_depth),
            sender_address: self.gateway.sender_address,
            capabilities,
            builtin_profiles: true,
        }
    }

    pub fn log_dir(&self, args: &Args) -> PathBuf {
        args.log_dir
            .clone()
            .or_else(|| self.logging.log_dir.clone())
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    pub fn log_retention_days(&self, args: &Args) -> u64 {
        args.log_retention_days
            .or(self.logging.retention_days)
            .unwrap_or(7)
    }
}
