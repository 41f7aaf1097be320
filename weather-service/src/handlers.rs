use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use common::errors::AppError;
use common::models::{CityInfo, LocationBean, LocationUpdate, NewCity, SelectedCity, WeatherModel};
use common::state::PlayState;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::viewmodel::{CityListViewModel, WeatherListViewModel, WeatherViewModel};

#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<WeatherViewModel>,
    pub weather_list: Arc<WeatherListViewModel>,
    pub city_list: Arc<CityListViewModel>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check")
    )
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "weather-service" }))
}

#[utoipa::path(
    get,
    path = "/api/weather/{location}",
    params(
        ("location" = String, Path, description = "Location id or `lon,lat` pair")
    ),
    responses(
        (status = 200, description = "Settled weather state: loading, success or error")
    ),
    tag = "weather"
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> Json<PlayState<WeatherModel>> {
    info!(location = %location, "Weather request received");

    let weather = state.weather.get_weather(&location).await.settle().await;

    Json(weather)
}

#[utoipa::path(
    get,
    path = "/api/weather",
    responses(
        (status = 200, description = "Latest published weather state")
    ),
    tag = "weather"
)]
pub async fn current_weather(State(state): State<AppState>) -> Json<PlayState<WeatherModel>> {
    Json(state.weather.current_weather())
}

#[utoipa::path(
    post,
    path = "/api/location",
    request_body = LocationUpdate,
    responses(
        (status = 202, description = "Location city update started")
    ),
    tag = "cities"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Json(payload): Json<LocationUpdate>,
) -> StatusCode {
    info!(addresses = payload.addresses.len(), "Location update received");

    state
        .weather
        .update_city_info(payload.location, payload.addresses)
        .await;

    StatusCode::ACCEPTED
}

#[utoipa::path(
    get,
    path = "/api/cities",
    responses(
        (status = 200, description = "Saved cities, current location first", body = Vec<CityInfo>)
    ),
    tag = "cities"
)]
pub async fn list_cities(State(state): State<AppState>) -> Json<Vec<CityInfo>> {
    let cities = state.city_list.city_info_list().borrow().clone();
    Json(cities)
}

#[utoipa::path(
    get,
    path = "/api/cities/selected",
    responses(
        (status = 200, description = "Selected city and its list position", body = SelectedCity)
    ),
    tag = "cities"
)]
pub async fn selected_city(State(state): State<AppState>) -> Json<SelectedCity> {
    Json(state.city_list.selected())
}

#[utoipa::path(
    post,
    path = "/api/cities",
    request_body = NewCity,
    responses(
        (status = 201, description = "City saved and selected", body = CityInfo),
        (status = 400, description = "Validation error")
    ),
    tag = "cities"
)]
pub async fn add_city(
    State(state): State<AppState>,
    Json(payload): Json<NewCity>,
) -> Result<(StatusCode, Json<CityInfo>), AppError> {
    let city = state.weather_list.insert_city_info(&payload).await?;

    Ok((StatusCode::CREATED, Json(city)))
}

#[utoipa::path(
    put,
    path = "/api/cities/{uid}/select",
    params(
        ("uid" = i64, Path, description = "City id")
    ),
    responses(
        (status = 200, description = "City selected", body = CityInfo),
        (status = 404, description = "City not found")
    ),
    tag = "cities"
)]
pub async fn select_city(
    State(state): State<AppState>,
    Path(uid): Path<i64>,
) -> Result<Json<CityInfo>, AppError> {
    let city = state.city_list.update_city_info_index(uid).await?;

    Ok(Json(city))
}

#[utoipa::path(
    delete,
    path = "/api/cities/{uid}",
    params(
        ("uid" = i64, Path, description = "City id")
    ),
    responses(
        (status = 204, description = "City deleted"),
        (status = 400, description = "The current location cannot be deleted"),
        (status = 404, description = "City not found")
    ),
    tag = "cities"
)]
pub async fn delete_city(
    State(state): State<AppState>,
    Path(uid): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.city_list.delete_city_info(uid).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/api/geo/lookup",
    params(
        ("name" = Option<String>, Query, description = "City name; blank searches the default city")
    ),
    responses(
        (status = 200, description = "Search result state")
    ),
    tag = "geo"
)]
pub async fn geo_lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupQuery>,
) -> Json<PlayState<Vec<LocationBean>>> {
    Json(state.weather_list.get_geo_city_lookup(&params.name).await)
}

#[utoipa::path(
    get,
    path = "/api/geo/top",
    responses(
        (status = 200, description = "Top city list state")
    ),
    tag = "geo"
)]
pub async fn geo_top(State(state): State<AppState>) -> Json<PlayState<Vec<LocationBean>>> {
    Json(state.weather_list.get_geo_top_city().await)
}
