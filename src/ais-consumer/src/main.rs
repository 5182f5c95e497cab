use std::process::ExitCode;

use ais_consumer::{settings::Settings, startup::App};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_ref())),
        )
        .init();

    let app = match App::build(&settings) {
        Ok(app) => app,
        Err(e) => {
            error!("failed to build app: {e:?}");
            return ExitCode::FAILURE;
        }
    };

    match app.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("app exited with error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
