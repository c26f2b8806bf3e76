use std::process::ExitCode;

use affiliate_storefront_lib::application::LoadState;
use affiliate_storefront_lib::infrastructure::config::AppConfig;
use affiliate_storefront_lib::infrastructure::{init_logging_with_config, log_system_info};
use anyhow::Context;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging_with_config(&config.logging)?;
    log_system_info();

    if config.server.enabled {
        affiliate_storefront_lib::serve(&config).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = affiliate_storefront_lib::run(&config).await?;
    info!(
        "📄 Wrote {} ({} state, {} cards, {} cycles)",
        report.output.display(),
        report.state,
        report.cards,
        report.cycles
    );

    if !report.initialized || report.state == LoadState::Error {
        error!("Storefront page is showing an error state");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
