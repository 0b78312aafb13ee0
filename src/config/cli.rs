use crate::config::toml_config::{AppConfig, CatalogConfig};
use crate::utils::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "smart-pharmacy")]
#[command(about = "Pharmacy ordering service with prescription reading")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override server.bind from config
    #[arg(long)]
    pub bind: Option<String>,

    /// Override catalog.path from config
    #[arg(long)]
    pub catalog: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON log lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// 載入設定檔（若有）並套用命令列覆蓋
    pub fn load_app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(path) = &self.catalog {
            config.catalog = Some(CatalogConfig { path: path.clone() });
        }
        if self.json_logs {
            config.logging.json = true;
        }

        Ok(config)
    }
}
