use anyhow::Context;
use tracing::{Level, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` is optional; real environment variables always win.
    let dotenv = dotenvy::dotenv();

    ai_llm_service::telemetry::init("info", Level::DEBUG)
        .context("installing tracing subscriber")?;

    if let Err(e) = dotenv {
        warn!(error = %e, "no .env loaded, using process environment");
    }

    api::start().await.context("healthcare assistant API")?;

    Ok(())
}
