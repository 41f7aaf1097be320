//! In-process fakes shared by unit tests.

use async_trait::async_trait;
use common::errors::AppError;
use common::models::{AirNow, DailyForecast, HourlyForecast, LocationBean, WeatherNow};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::city_store::CityStore;
use crate::db::create_pool;
use crate::provider::WeatherProvider;

/// Provider returning canned data and counting calls
#[derive(Default)]
pub struct FakeProvider {
    pub now_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    pub top_calls: AtomicUsize,
    pub fail: AtomicBool,
    pub temp: Mutex<String>,
}

/// Location whose current-conditions query takes half a second
pub const SLOW_LOCATION: &str = "slow";

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        let provider = Self::default();
        *provider.temp.lock().unwrap() = "20".to_string();
        Arc::new(provider)
    }

    pub fn set_temp(&self, temp: &str) {
        *self.temp.lock().unwrap() = temp.to_string();
    }

    pub fn now_calls(&self) -> usize {
        self.now_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(AppError::provider("500"))
        } else {
            Ok(())
        }
    }

    fn city(name: &str, id: &str) -> LocationBean {
        LocationBean {
            name: name.to_string(),
            id: id.to_string(),
            adm1: format!("{name} Province"),
            adm2: name.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn weather_now(&self, location: &str, _lang: &str) -> Result<WeatherNow, AppError> {
        self.now_calls.fetch_add(1, Ordering::SeqCst);
        if location == SLOW_LOCATION {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        self.check()?;
        Ok(WeatherNow {
            temp: self.temp.lock().unwrap().clone(),
            text: format!("Sunny in {location}"),
            ..Default::default()
        })
    }

    async fn weather_24h(
        &self,
        _location: &str,
        _lang: &str,
    ) -> Result<Vec<HourlyForecast>, AppError> {
        self.check()?;
        Ok(vec![HourlyForecast {
            temp: "18".to_string(),
            ..Default::default()
        }])
    }

    async fn weather_7d(&self, _location: &str, _lang: &str) -> Result<Vec<DailyForecast>, AppError> {
        self.check()?;
        Ok(vec![
            DailyForecast {
                fx_date: "2024-05-01".to_string(),
                ..Default::default()
            },
            DailyForecast {
                fx_date: "2024-05-02".to_string(),
                ..Default::default()
            },
        ])
    }

    async fn air_now(&self, _location: &str, _lang: &str) -> Result<AirNow, AppError> {
        self.check()?;
        Ok(AirNow {
            aqi: "42".to_string(),
            ..Default::default()
        })
    }

    async fn city_lookup(&self, name: &str, _lang: &str) -> Result<Vec<LocationBean>, AppError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(vec![Self::city(name, "101010100")])
    }

    async fn top_cities(&self, _lang: &str) -> Result<Vec<LocationBean>, AppError> {
        self.top_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(vec![
            Self::city("Beijing", "101010100"),
            Self::city("Shanghai", "101020100"),
        ])
    }
}

pub async fn memory_store() -> Arc<CityStore> {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    Arc::new(CityStore::new(pool).await.unwrap())
}
