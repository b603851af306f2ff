use clap::Parser;
use jefe_bridge_cli::commands::{self, load_config};
use jefe_bridge_cli::infrastructure::{EnhancedLogger, LogConfig};
use jefe_bridge_cli::Args;
use jefe_bridge_core::BridgeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(args.config_file.as_deref())?;

    let log_directory = BridgeConfig::validate_and_get_env_var("LOG_DIR", "", false)?;
    let log_config = LogConfig {
        enable_file: !log_directory.is_empty(),
        log_directory: if log_directory.is_empty() {
            LogConfig::default().log_directory
        } else {
            log_directory
        },
        ..LogConfig::with_level(&config.log_level)
    };
    EnhancedLogger::new(log_config).init();

    log::debug!(
        "{} {} on chain {}",
        jefe_bridge_core::NAME,
        jefe_bridge_core::VERSION,
        config.source_network.chain_id
    );
    commands::run(args, config).await
}
