mod chart;
mod config;
mod ephemeris;
mod error;
mod geocode;
mod reading;
mod server;
mod timezone;
mod types;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = PathBuf::from("config.toml");
    let config = if config_path.exists() {
        config::AppConfig::load(&config_path)?
    } else {
        config::AppConfig::default()
    };

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config))
}

async fn run(config: config::AppConfig) -> anyhow::Result<()> {
    let geocoder = Arc::new(geocode::NominatimGeocoder::new(&config.geocoding));
    let backend = Arc::new(reading::OpenAiCompatibleBackend::new(&config.generation));
    let orchestrator = chart::ChartOrchestrator::new(
        geocoder,
        timezone::TimezoneResolver::new(),
        ephemeris::EphemerisEngine::new(&config.ephemeris),
        reading::ReadingGenerator::new(backend),
    );

    let state = server::AppState {
        orchestrator: Arc::new(orchestrator),
    };
    server::start_server(state, &config.server.bind_addr).await
}
