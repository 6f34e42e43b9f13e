//! Search-sync engine entry point.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use search_sync::{Dependencies, IndexingError};

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting search-sync engine");

    let mut dependencies = Dependencies::new().await?;

    if let Err(e) = dependencies.orchestrator.run().await {
        error!(error = %e, "Orchestrator exited with error");
        return Err(e.into());
    }

    info!("Search-sync engine stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
