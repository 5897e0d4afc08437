use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::location::LinkBuilder;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server address (e.g., "0.0.0.0:8080")
    #[serde(default = "default_addr")]
    pub addr: String,
    /// JSON file holding the record collections
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Origin embedded in printed QR links (e.g., "https://records.example.org")
    #[serde(default = "default_public_origin")]
    pub public_origin: String,
    /// Path prefix between origin and route in QR links ("#" for hash routing)
    #[serde(default = "default_link_prefix")]
    pub link_prefix: String,
    /// Directory of the web front end
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Administrator account
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// bcrypt hash of the admin password; login is disabled while empty
    #[serde(default)]
    pub password_hash: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password_hash: String::new(),
        }
    }
}

// Default value functions
fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from("./data/records.json")
}

fn default_public_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_link_prefix() -> String {
    "#".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("webapp/dist")
}

fn default_admin_username() -> String {
    "admin".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            data_file: default_data_file(),
            public_origin: default_public_origin(),
            link_prefix: default_link_prefix(),
            static_dir: default_static_dir(),
            log: LogConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Builder for the identifying links of printed labels
    pub fn links(&self) -> LinkBuilder {
        LinkBuilder::new(&self.public_origin, &self.link_prefix)
    }
}
