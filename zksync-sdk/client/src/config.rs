use std::{path::Path, path::PathBuf, time::Duration};

use clap::Parser;
use serde::{Deserialize, Serialize};
use url::Url;
use zksync_sdk_types::DEFAULT_POLLING_INTERVAL_MS;

use crate::LogFormat;

/// CLI args for binaries embedding the SDK.
#[derive(Parser, Debug)]
pub struct ClientArgs {
    #[arg(long = "log-format", value_name = "FORMAT", default_value_t = LogFormat::Terminal)]
    pub log_format: LogFormat,

    /// Path to the config toml file
    #[arg(long)]
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub l1_rpc_url: Url,
    pub l2_rpc_url: Url,
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
    #[serde(default = "default_cache_contract_addresses")]
    pub cache_contract_addresses: bool,
}

fn default_polling_interval_ms() -> u64 {
    DEFAULT_POLLING_INTERVAL_MS
}

fn default_cache_contract_addresses() -> bool {
    true
}

impl NetworkConfig {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }
}

pub fn load_sdk_config(path: impl AsRef<Path>) -> eyre::Result<SdkConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: SdkConfig = toml::from_str(&contents)?;
    Ok(config)
}
