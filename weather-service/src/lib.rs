//! Weather service: current conditions, forecasts and air quality for a
//! user-managed list of cities, with a short-lived per-location cache.

pub mod api_client;
pub mod cache;
pub mod city_store;
pub mod config;
pub mod connectivity;
pub mod db;
pub mod handlers;
pub mod openapi;
pub mod provider;
pub mod repository;
pub mod viewmodel;

#[cfg(test)]
mod test_support;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use common::errors::AppError;
use common::http_client::HttpClient;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api_client::QWeatherClient;
use crate::cache::WeatherCache;
use crate::city_store::CityStore;
use crate::config::Config;
use crate::connectivity::{Connectivity, TcpProbe};
use crate::handlers::AppState;
use crate::provider::WeatherProvider;
use crate::repository::{WeatherListRepository, WeatherRepository};
use crate::viewmodel::{CityListViewModel, WeatherListViewModel, WeatherViewModel};

const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(2);

/// Wires the database, provider client and view models from `config`
pub async fn build_state(
    config: &Config,
    cancellation_token: CancellationToken,
) -> Result<AppState, AppError> {
    let pool = db::create_pool(&config.database_url).await?;
    let cities = Arc::new(CityStore::new(pool).await?);
    info!(count = cities.cities().len(), "City list loaded");

    let http_client = HttpClient::new(config.http_timeout_secs, config.http_max_retries)?;
    let provider: Arc<dyn WeatherProvider> = Arc::new(
        QWeatherClient::new(
            http_client,
            config.qweather_api_url.clone(),
            config.qweather_geo_url.clone(),
            config.qweather_key.clone(),
        )
        .with_top_cities(config.top_city_number, config.top_city_range.clone()),
    );
    let connectivity: Arc<dyn Connectivity> = Arc::new(TcpProbe::new(
        config.connectivity_probe.clone(),
        CONNECTIVITY_TIMEOUT,
    ));
    let cache = Arc::new(WeatherCache::with_ttl(config.cache_ttl_seconds));

    let weather = WeatherViewModel::new(
        Arc::new(WeatherRepository::new(provider.clone(), cities.clone())),
        cache,
        connectivity.clone(),
        config.lang.clone(),
        cancellation_token,
    );
    let weather_list = WeatherListViewModel::new(
        Arc::new(WeatherListRepository::new(provider, cities.clone())),
        connectivity,
        config.lang.clone(),
    );
    let city_list = CityListViewModel::new(cities);

    Ok(AppState {
        weather: Arc::new(weather),
        weather_list: Arc::new(weather_list),
        city_list: Arc::new(city_list),
    })
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/weather", get(handlers::current_weather))
        .route("/api/weather/{location}", get(handlers::get_weather))
        .route("/api/location", post(handlers::update_location))
        .route(
            "/api/cities",
            get(handlers::list_cities).post(handlers::add_city),
        )
        .route("/api/cities/selected", get(handlers::selected_city))
        .route("/api/cities/{uid}", delete(handlers::delete_city))
        .route("/api/cities/{uid}/select", put(handlers::select_city))
        .route("/api/geo/lookup", get(handlers::geo_lookup))
        .route("/api/geo/top", get(handlers::geo_top))
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
