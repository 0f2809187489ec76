//! Configuration for the tally server and client.
//!
//! The server supports both command-line arguments and a TOML
//! configuration file; CLI arguments take precedence over file values.
//! The client is CLI-only.

use clap::Parser;
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Command-line arguments for the tally server
#[derive(Parser, Debug)]
#[command(name = "char-tally-server")]
#[command(version = "0.1.0")]
#[command(about = "Counts printable ASCII characters streamed by tally clients", long_about = None)]
pub struct ServerArgs {
    /// Port to listen on
    pub port: u16,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Command-line arguments for the tally client
#[derive(Parser, Debug)]
#[command(name = "char-tally-client")]
#[command(version = "0.1.0")]
#[command(about = "Streams a file to a tally server and prints the printable count", long_about = None)]
pub struct ClientArgs {
    /// IPv4 address of the server
    pub address: Ipv4Addr,

    /// Port the server listens on
    pub port: u16,

    /// Path to the file to stream
    pub file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen backlog
    #[serde(default = "default_backlog")]
    pub backlog: i32,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            backlog: default_backlog(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_backlog() -> i32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backlog: i32,
    pub log_level: String,
}

impl ServerConfig {
    /// Resolve configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(ServerArgs::parse())
    }

    /// Merge parsed CLI args with the TOML file they may point at.
    pub fn resolve(args: ServerArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = args.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Ok(ServerConfig {
            host: args.host.unwrap_or(toml_config.server.host),
            port: args.port,
            backlog: toml_config.server.backlog,
            log_level: if args.log_level != "info" {
                args.log_level
            } else {
                toml_config.logging.level
            },
        })
    }

    /// Bind address in `host:port` form.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
