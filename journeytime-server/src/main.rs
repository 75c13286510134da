use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use journeytime_server::catalog::Catalog;
use journeytime_server::config::ServiceConfig;
use journeytime_server::inference::ModelRegistry;
use journeytime_server::predict::{LegPredictor, PredictionEngine};
use journeytime_server::resolve::TripResolver;
use journeytime_server::schedule::{ScheduleStore, load_gtfs_dir};
use journeytime_server::weather::{
    CacheConfig, CachedWeatherClient, FixedWeather, Weather, WeatherClient,
};
use journeytime_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env().expect("Invalid configuration");

    // Schedule and models are required; fail fast if either is unusable
    info!(dir = %config.gtfs_dir.display(), "loading GTFS schedule");
    let schedule: Arc<dyn ScheduleStore> = Arc::new(
        load_gtfs_dir(&config.gtfs_dir, config.city_center).expect("Failed to load GTFS schedule"),
    );

    let models = Arc::new(ModelRegistry::open(&config.models).expect("Failed to load models"));
    let catalog =
        Catalog::build(Arc::clone(&schedule), Arc::clone(&models)).expect("Failed to build line catalog");
    let counts = catalog.snapshot().await.counts();
    info!(
        valid_lines = counts.valid_lines,
        modelled_lines = counts.modelled_lines,
        "line catalog ready"
    );

    let weather = match config.weather() {
        Some(weather_config) => {
            let client =
                WeatherClient::new(weather_config).expect("Failed to create weather client");
            Weather::Live(CachedWeatherClient::new(client, &CacheConfig::default()))
        }
        None => {
            warn!(
                temperature = config.fallback_temperature,
                "OPENWEATHER_API_KEY not set, using a fixed temperature"
            );
            Weather::Fixed(FixedWeather {
                temperature: config.fallback_temperature,
            })
        }
    };

    // Spawn background task to refresh the line catalog
    let catalog_refresh = catalog.clone();
    let refresh_interval = config.catalog_refresh_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_interval);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match catalog_refresh.refresh().await {
                Ok(counts) => info!(
                    valid_lines = counts.valid_lines,
                    modelled_lines = counts.modelled_lines,
                    "refreshed line catalog"
                ),
                Err(e) => error!(error = %e, "failed to refresh line catalog"),
            }
        }
    });

    let predictor = LegPredictor::new(
        TripResolver::new(schedule),
        PredictionEngine::new(models),
        catalog,
        Arc::new(weather),
        config.fallback_temperature,
    );
    let state = AppState::new(predictor, config.timezone);
    let app = create_router(state);

    let addr = config.bind_addr;
    info!("Journey time predictor listening on http://{addr}");
    info!("  GET  /health                - Health check");
    info!("  POST /journey/predict       - Predict journey times for a routing suggestion");
    info!("  GET  /stops/by-line         - Resolve the stops a leg passes through");
    info!("  POST /admin/catalog/refresh - Reload the line catalog");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
