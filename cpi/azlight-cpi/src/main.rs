use azlight_common::config::CONFIG_PATH_ENV;
use azlight_common::telemetry;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing("azlight-cpi")?;

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .map(PathBuf::from)
        .ok_or_else(|| {
            anyhow::anyhow!("Usage: azlight-cpi <config.json> (or set {})", CONFIG_PATH_ENV)
        })?;

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;

    let response = dispatch::run(&config_path, &input).await;
    info!("Responding to CPI request (error: {})", response.error.is_some());

    let mut stdout = tokio::io::stdout();
    stdout.write_all(serde_json::to_string(&response)?.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;

    Ok(())
}

mod dispatch;
mod protocol;
mod state;
