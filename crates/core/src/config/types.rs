use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::counter::DEFAULT_COUNTER_NAME;
use crate::fulfillment::FulfillmentConfig;
use crate::queue::QueueConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub fulfillment: FulfillmentConfig,
    #[serde(default)]
    pub counter: CounterConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("orderline.db")
}

/// Counter actor configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CounterConfig {
    /// Logical name of the deployment's counter instance.
    #[serde(default = "default_counter_name")]
    pub name: String,
    /// Command channel depth; callers block once this fills.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            name: default_counter_name(),
            command_buffer: default_command_buffer(),
        }
    }
}

fn default_counter_name() -> String {
    DEFAULT_COUNTER_NAME.to_string()
}

fn default_command_buffer() -> usize {
    64
}
