//! Weather data provider seam.

use async_trait::async_trait;
use common::errors::AppError;
use common::models::{AirNow, DailyForecast, HourlyForecast, LocationBean, WeatherNow};

/// Queries the weather data source. `location` is a provider location id or
/// a `lon,lat` pair; `lang` selects the language of text fields.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn weather_now(&self, location: &str, lang: &str) -> Result<WeatherNow, AppError>;

    async fn weather_24h(&self, location: &str, lang: &str)
    -> Result<Vec<HourlyForecast>, AppError>;

    async fn weather_7d(&self, location: &str, lang: &str) -> Result<Vec<DailyForecast>, AppError>;

    async fn air_now(&self, location: &str, lang: &str) -> Result<AirNow, AppError>;

    /// Fuzzy city search by name
    async fn city_lookup(&self, name: &str, lang: &str) -> Result<Vec<LocationBean>, AppError>;

    async fn top_cities(&self, lang: &str) -> Result<Vec<LocationBean>, AppError>;
}
