use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Run configuration (`apiprobe.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raises the default log level to debug and logs the curl command lines
    pub debug_mode: bool,

    /// Root of the request definition files
    pub input_dir: PathBuf,

    /// Root of the persisted response outputs
    pub output_dir: PathBuf,

    /// Where the issue list of a reporting run is written
    pub report_file: PathBuf,

    pub secrets: SecretsConfig,
    pub executor: ExecutorConfig,
    pub heartbeat: HeartbeatConfig,
    pub notification: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug_mode: false,
            input_dir: PathBuf::from("./data/input"),
            output_dir: PathBuf::from("./data/output"),
            report_file: PathBuf::from("./logs/report.json"),
            secrets: SecretsConfig::default(),
            executor: ExecutorConfig::default(),
            heartbeat: HeartbeatConfig::default(),
            notification: NotificationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub store_file: PathBuf,

    /// `hash,secret` CSV imported into an empty store
    pub seed_file: PathBuf,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            store_file: PathBuf::from("./db/secrets.jsonl"),
            seed_file: PathBuf::from("./db/seed.csv"),
        }
    }
}

/// Which HTTP delegate executes the requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// External `curl` process
    #[default]
    Curl,
    /// In-process `reqwest` client
    Native,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub kind: ExecutorKind,
    pub curl_path: PathBuf,
    pub jq_path: PathBuf,
    pub connect_timeout_secs: u64,
    pub max_time_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            kind: ExecutorKind::Curl,
            curl_path: PathBuf::from("curl"),
            jq_path: PathBuf::from("jq"),
            connect_timeout_secs: 8,
            max_time_secs: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    pub interval_in_hours: u64,

    /// RFC3339 timestamp of the last heartbeat, empty if none was ever sent
    pub last_heartbeat_time: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_in_hours: 24,
            last_heartbeat_time: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webex: Option<WebexConfig>,
}

impl NotificationConfig {
    /// The WebEx settings, if present and switched on
    pub fn active_webex(&self) -> Option<&WebexConfig> {
        self.webex.as_ref().filter(|webex| webex.active)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebexConfig {
    pub active: bool,
    pub webhook_url: String,

    /// Appended to `webhook_url`; may be a `<secret-HASH>` placeholder
    pub space: String,
}
