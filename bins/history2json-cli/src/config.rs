use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "history2json", about = "JSON Lines history export: config check and batch replay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the module configuration and show where records would go
    Check(CheckArgs),
    /// Export JSON Lines records through the exporter, batch by batch
    Replay(ReplayArgs),
}

/// Where `history2json.conf` is found.
#[derive(Args, Clone, Debug)]
pub struct ConfigSource {
    /// Path to history2json.conf
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Module directory holding history2json.conf (ignored with --config)
    #[arg(long, env = "HISTORY2JSON_MODULE_PATH")]
    pub module_dir: Option<String>,
}

impl ConfigSource {
    pub fn path(&self) -> PathBuf {
        match &self.config {
            Some(path) => path.clone(),
            None => history_config_zbx::module_config_path(self.module_dir.as_deref()),
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: ConfigSource,
}

#[derive(Args, Clone, Debug)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// JSON Lines input, `-` for stdin
    #[arg(long, default_value = "-")]
    pub input: String,

    /// JSON file with host and item metadata
    #[arg(long)]
    pub metadata: Option<PathBuf>,
}
