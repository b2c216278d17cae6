use gh_slack_notify::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, load_config};
use gh_slack_notify::logging::setup_logging;
use gh_slack_notify::{AppState, NotifyError, RunMode, api};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

async fn run() -> Result<(), NotifyError> {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&PathBuf::from(&config_path))?;

    let _log_guard = setup_logging(config.log_dir.clone())?;
    info!("Using config at {:?}", config_path);

    let state = Arc::new(AppState::new(config)?);

    match state.config.mode {
        RunMode::SingleShot => {
            info!("Running once on a canned event");
            // Failures were already reported and logged by the pipeline
            let _ = state.notifier.run_single_shot().await;
        }
        RunMode::Serve => {
            let bind_address = state.config.bind_address.clone();
            let app = api::router(state);
            let listener = tokio::net::TcpListener::bind(&bind_address).await?;
            info!("Listening on {}", bind_address);
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    if let Err(e) = run().await {
        error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
