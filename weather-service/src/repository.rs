use common::errors::AppError;
use common::models::{
    Address, AirNow, CityInfo, DailyForecast, DeviceLocation, GeoCache, HourlyForecast,
    LocationBean, NewCity, WeatherModel, WeatherNow,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::city_store::CityStore;
use crate::db::settings;
use crate::provider::WeatherProvider;

/// Settings key of the cached top city list
pub const CACHE_CITY_LIST: &str = "cache_city_list";

/// Weather queries plus the city bookkeeping of the weather screen
pub struct WeatherRepository {
    provider: Arc<dyn WeatherProvider>,
    cities: Arc<CityStore>,
}

impl WeatherRepository {
    pub fn new(provider: Arc<dyn WeatherProvider>, cities: Arc<CityStore>) -> Self {
        Self { provider, cities }
    }

    pub async fn get_weather_now(&self, location: &str, lang: &str) -> Result<WeatherNow, AppError> {
        self.provider.weather_now(location, lang).await
    }

    pub async fn get_weather_24_hour(
        &self,
        location: &str,
        lang: &str,
    ) -> Result<Vec<HourlyForecast>, AppError> {
        self.provider.weather_24h(location, lang).await
    }

    /// Today's forecast and the whole 7-day list
    pub async fn get_weather_7_day(
        &self,
        location: &str,
        lang: &str,
    ) -> Result<(Option<DailyForecast>, Vec<DailyForecast>), AppError> {
        let days = self.provider.weather_7d(location, lang).await?;
        Ok((days.first().cloned(), days))
    }

    pub async fn get_air_now(&self, location: &str, lang: &str) -> Result<AirNow, AppError> {
        self.provider.air_now(location, lang).await
    }

    /// Runs the four weather queries concurrently and assembles the model.
    /// The first failure fails the whole fetch.
    #[instrument(skip(self))]
    pub async fn get_weather(&self, location: &str, lang: &str) -> Result<WeatherModel, AppError> {
        let (now, hourly, (daily, daily_list), air_now) = tokio::try_join!(
            self.get_weather_now(location, lang),
            self.get_weather_24_hour(location, lang),
            self.get_weather_7_day(location, lang),
            self.get_air_now(location, lang),
        )?;

        Ok(WeatherModel {
            now,
            hourly,
            daily,
            daily_list,
            air_now,
        })
    }

    /// Persists the GPS city derived from a location fix. Returns `None` when
    /// the address list is empty.
    #[instrument(skip(self, addresses), fields(addresses = addresses.len()))]
    pub async fn update_city_info(
        &self,
        location: DeviceLocation,
        addresses: &[Address],
    ) -> Result<Option<CityInfo>, AppError> {
        let Some(city) = addresses.first().and_then(|a| city_from_address(location, a)) else {
            warn!("No usable address for location update");
            return Ok(None);
        };

        let saved = self.cities.upsert_location_city(&city).await?;
        info!(uid = saved.uid, name = %saved.name, "Location city updated");
        Ok(Some(saved))
    }

    pub fn refresh_city_list(&self) -> watch::Receiver<Vec<CityInfo>> {
        self.cities.subscribe()
    }
}

/// Builds the GPS city record from the first reverse-geocoded address
pub fn city_from_address(location: DeviceLocation, address: &Address) -> Option<NewCity> {
    let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

    let name = non_empty(&address.sub_locality)
        .or_else(|| non_empty(&address.locality))
        .or_else(|| non_empty(&address.admin_area))
        .or_else(|| non_empty(&address.feature_name))?;

    Some(NewCity {
        location_id: location.location_id(),
        name,
        province: non_empty(&address.admin_area).unwrap_or_default(),
        city: non_empty(&address.locality).unwrap_or_default(),
    })
}

/// City search and the list of saved cities
pub struct WeatherListRepository {
    provider: Arc<dyn WeatherProvider>,
    cities: Arc<CityStore>,
}

impl WeatherListRepository {
    pub fn new(provider: Arc<dyn WeatherProvider>, cities: Arc<CityStore>) -> Self {
        Self { provider, cities }
    }

    pub async fn get_geo_city_lookup(
        &self,
        name: &str,
        lang: &str,
    ) -> Result<Vec<LocationBean>, AppError> {
        self.provider.city_lookup(name, lang).await
    }

    /// Top cities from the settings cache; `None` when nothing usable is stored
    pub async fn cached_top_cities(&self) -> Result<Option<Vec<LocationBean>>, AppError> {
        let Some(blob) = settings::get(self.cities.pool(), CACHE_CITY_LIST).await? else {
            return Ok(None);
        };
        if blob.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<GeoCache>(&blob) {
            Ok(cache) if !cache.list.is_empty() => Ok(Some(cache.list)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable top city cache");
                Ok(None)
            }
        }
    }

    /// Fetches top cities from the provider and caches the non-empty result
    #[instrument(skip(self))]
    pub async fn get_geo_top_city(&self, lang: &str) -> Result<Vec<LocationBean>, AppError> {
        let list = self.provider.top_cities(lang).await?;
        if !list.is_empty() {
            let blob = serde_json::to_string(&GeoCache { list: list.clone() })?;
            settings::put(self.cities.pool(), CACHE_CITY_LIST, &blob).await?;
            info!(count = list.len(), "Top city list cached");
        }
        Ok(list)
    }

    pub async fn insert_city_info(&self, city: &NewCity) -> Result<CityInfo, AppError> {
        self.cities.insert_city(city).await
    }
}
