use async_trait::async_trait;
use common::errors::AppError;
use common::http_client::HttpClient;
use common::models::{AirNow, DailyForecast, HourlyForecast, LocationBean, WeatherNow};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::provider::WeatherProvider;

const OK_CODE: &str = "200";
const NOT_FOUND_CODE: &str = "404";

#[derive(Debug, Deserialize)]
struct NowResponse {
    code: String,
    now: Option<WeatherNow>,
}

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    code: String,
    #[serde(default)]
    hourly: Vec<HourlyForecast>,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    code: String,
    #[serde(default)]
    daily: Vec<DailyForecast>,
}

#[derive(Debug, Deserialize)]
struct AirResponse {
    code: String,
    now: Option<AirNow>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    code: String,
    #[serde(default)]
    location: Vec<LocationBean>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopCityResponse {
    code: String,
    #[serde(default)]
    top_city_list: Vec<LocationBean>,
}

fn check_code(code: &str) -> Result<(), AppError> {
    if code == OK_CODE {
        Ok(())
    } else {
        Err(AppError::provider(code))
    }
}

/// QWeather REST client (weather v7 and geo v2 APIs)
pub struct QWeatherClient {
    http_client: HttpClient,
    api_url: String,
    geo_url: String,
    key: String,
    top_city_number: u32,
    top_city_range: String,
}

impl QWeatherClient {
    pub fn new(http_client: HttpClient, api_url: String, geo_url: String, key: String) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            geo_url: geo_url.trim_end_matches('/').to_string(),
            key,
            top_city_number: 20,
            top_city_range: "cn".to_string(),
        }
    }

    pub fn with_top_cities(mut self, number: u32, range: impl Into<String>) -> Self {
        self.top_city_number = number;
        self.top_city_range = range.into();
        self
    }

    async fn weather_get<T>(&self, path: &str, location: &str, lang: &str) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.api_url, path);
        self.http_client
            .get_json(
                &url,
                &[("location", location), ("lang", lang), ("key", self.key.as_str())],
            )
            .await
    }
}

#[async_trait]
impl WeatherProvider for QWeatherClient {
    #[instrument(skip(self))]
    async fn weather_now(&self, location: &str, lang: &str) -> Result<WeatherNow, AppError> {
        let response: NowResponse = self.weather_get("/v7/weather/now", location, lang).await?;
        check_code(&response.code)?;
        response
            .now
            .ok_or_else(|| AppError::internal("Provider returned no current conditions"))
    }

    #[instrument(skip(self))]
    async fn weather_24h(
        &self,
        location: &str,
        lang: &str,
    ) -> Result<Vec<HourlyForecast>, AppError> {
        let response: HourlyResponse = self.weather_get("/v7/weather/24h", location, lang).await?;
        check_code(&response.code)?;
        Ok(response.hourly)
    }

    #[instrument(skip(self))]
    async fn weather_7d(&self, location: &str, lang: &str) -> Result<Vec<DailyForecast>, AppError> {
        let response: DailyResponse = self.weather_get("/v7/weather/7d", location, lang).await?;
        check_code(&response.code)?;
        Ok(response.daily)
    }

    #[instrument(skip(self))]
    async fn air_now(&self, location: &str, lang: &str) -> Result<AirNow, AppError> {
        let response: AirResponse = self.weather_get("/v7/air/now", location, lang).await?;
        check_code(&response.code)?;
        response
            .now
            .ok_or_else(|| AppError::internal("Provider returned no air quality data"))
    }

    #[instrument(skip(self))]
    async fn city_lookup(&self, name: &str, lang: &str) -> Result<Vec<LocationBean>, AppError> {
        let url = format!("{}/v2/city/lookup", self.geo_url);
        let response: LookupResponse = self
            .http_client
            .get_json(&url, &[("location", name), ("lang", lang), ("key", self.key.as_str())])
            .await?;

        // No match is an empty result, not a failure
        if response.code == NOT_FOUND_CODE {
            return Ok(Vec::new());
        }
        check_code(&response.code)?;
        info!(name = %name, found = response.location.len(), "City lookup completed");
        Ok(response.location)
    }

    #[instrument(skip(self))]
    async fn top_cities(&self, lang: &str) -> Result<Vec<LocationBean>, AppError> {
        let url = format!("{}/v2/city/top", self.geo_url);
        let number = self.top_city_number.to_string();
        let response: TopCityResponse = self
            .http_client
            .get_json(
                &url,
                &[
                    ("number", number.as_str()),
                    ("range", self.top_city_range.as_str()),
                    ("lang", lang),
                    ("key", self.key.as_str()),
                ],
            )
            .await?;
        check_code(&response.code)?;
        Ok(response.top_city_list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> QWeatherClient {
        QWeatherClient::new(
            HttpClient::new(2, 0).unwrap(),
            server.uri(),
            server.uri(),
            "test-key".to_string(),
        )
    }

    #[tokio::test]
    async fn test_weather_now_decodes_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/weather/now"))
            .and(query_param("location", "101010100"))
            .and(query_param("lang", "en"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "200",
                "updateTime": "2024-05-01T10:00+08:00",
                "now": { "obsTime": "2024-05-01T09:50+08:00", "temp": "24", "text": "Sunny", "humidity": "30" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let now = client(&server).weather_now("101010100", "en").await.unwrap();
        assert_eq!(now.temp, "24");
        assert_eq!(now.text, "Sunny");
        assert_eq!(now.feels_like, "");
    }

    #[tokio::test]
    async fn test_non_ok_code_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/weather/7d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "401" })))
            .mount(&server)
            .await;

        let err = client(&server).weather_7d("101010100", "zh").await.unwrap_err();
        assert!(matches!(err, AppError::ProviderError { ref code, .. } if code == "401"));
    }

    #[tokio::test]
    async fn test_http_failure_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/air/now"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).air_now("101010100", "zh").await.unwrap_err();
        assert!(matches!(err, AppError::HttpError { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/city/lookup"))
            .and(query_param("location", "Atlantis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "404" })))
            .mount(&server)
            .await;

        let found = client(&server).city_lookup("Atlantis", "en").await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_top_cities_sends_range_and_number() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/city/top"))
            .and(query_param("number", "5"))
            .and(query_param("range", "world"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "200",
                "topCityList": [
                    { "name": "Paris", "id": "2988507", "adm1": "Paris", "country": "France" }
                ]
            })))
            .mount(&server)
            .await;

        let cities = client(&server)
            .with_top_cities(5, "world")
            .top_cities("en")
            .await
            .unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "Paris");
    }
}
