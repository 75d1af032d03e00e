pub mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigLoader, LoadedConfig};
pub use types::{
    Config, ExecutorConfig, ExecutorKind, HeartbeatConfig, NotificationConfig, SecretsConfig,
    WebexConfig,
};
