use common::errors::AppError;
use common::models::{CityInfo, LocationBean, NewCity};
use common::state::{PlayState, StateHolder};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::connectivity::Connectivity;
use crate::repository::WeatherListRepository;

/// City searched when the query is blank
pub const DEFAULT_CITY: &str = "北京";

/// State holder of the city search screen
pub struct WeatherListViewModel {
    repository: Arc<WeatherListRepository>,
    connectivity: Arc<dyn Connectivity>,
    lang: String,
    location_bean_list: StateHolder<Vec<LocationBean>>,
}

impl WeatherListViewModel {
    pub fn new(
        repository: Arc<WeatherListRepository>,
        connectivity: Arc<dyn Connectivity>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            connectivity,
            lang: lang.into(),
            location_bean_list: StateHolder::new("location_bean_list"),
        }
    }

    pub fn location_bean_list(&self) -> watch::Receiver<PlayState<Vec<LocationBean>>> {
        self.location_bean_list.subscribe()
    }

    fn publish(&self, state: PlayState<Vec<LocationBean>>) -> PlayState<Vec<LocationBean>> {
        self.location_bean_list.publish(state.clone());
        state
    }

    /// Fuzzy search by city name
    #[instrument(skip(self))]
    pub async fn get_geo_city_lookup(&self, city_name: &str) -> PlayState<Vec<LocationBean>> {
        let city_name = match city_name.trim() {
            "" => DEFAULT_CITY,
            name => name,
        };

        if !self.connectivity.is_connected().await {
            warn!("No network, skipping city lookup");
            return self.publish(PlayState::error(AppError::NoNetwork));
        }

        let result = self
            .repository
            .get_geo_city_lookup(city_name, &self.lang)
            .await;
        self.publish(result.into())
    }

    /// Popular cities, served from the settings cache when available
    #[instrument(skip(self))]
    pub async fn get_geo_top_city(&self) -> PlayState<Vec<LocationBean>> {
        match self.repository.cached_top_cities().await {
            Ok(Some(list)) => {
                info!(count = list.len(), "Serving cached top cities");
                return self.publish(PlayState::Success(list));
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read top city cache"),
        }

        if !self.connectivity.is_connected().await {
            warn!("No network, skipping top city fetch");
            return self.publish(PlayState::error(AppError::NoNetwork));
        }

        let result = self.repository.get_geo_top_city(&self.lang).await;
        self.publish(result.into())
    }

    /// Saves a picked search result and selects it
    pub async fn insert_city_info(&self, city: &NewCity) -> Result<CityInfo, AppError> {
        self.repository.insert_city_info(city).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::StaticConnectivity;
    use crate::test_support::{FakeProvider, memory_store};
    use std::sync::atomic::Ordering;

    struct Fixture {
        provider: Arc<FakeProvider>,
        connectivity: Arc<StaticConnectivity>,
        view_model: WeatherListViewModel,
    }

    async fn fixture() -> Fixture {
        let provider = FakeProvider::new();
        let connectivity = Arc::new(StaticConnectivity::new(true));
        let store = memory_store().await;
        let repository = Arc::new(WeatherListRepository::new(provider.clone(), store));
        let view_model = WeatherListViewModel::new(repository, connectivity.clone(), "zh");
        Fixture {
            provider,
            connectivity,
            view_model,
        }
    }

    #[tokio::test]
    async fn test_blank_lookup_uses_default_city() {
        let f = fixture().await;
        let state = f.view_model.get_geo_city_lookup("  ").await;
        assert_eq!(state.success().unwrap()[0].name, DEFAULT_CITY);
    }

    #[tokio::test]
    async fn test_lookup_offline_is_error() {
        let f = fixture().await;
        f.connectivity.set(false);

        let state = f.view_model.get_geo_city_lookup("Paris").await;
        assert!(matches!(state, PlayState::Error(_)));
        assert_eq!(f.provider.lookup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeated_lookup_notifies_once() {
        let f = fixture().await;
        let mut rx = f.view_model.location_bean_list();

        f.view_model.get_geo_city_lookup("Paris").await;
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        f.view_model.get_geo_city_lookup("Paris").await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(f.provider.lookup_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_top_cities_cached_after_first_fetch() {
        let f = fixture().await;
        let first = f.view_model.get_geo_top_city().await;
        assert_eq!(first.success().unwrap().len(), 2);

        f.connectivity.set(false);
        let second = f.view_model.get_geo_top_city().await;
        assert_eq!(second, first);
        assert_eq!(f.provider.top_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_top_cities_offline_without_cache() {
        let f = fixture().await;
        f.connectivity.set(false);
        let state = f.view_model.get_geo_top_city().await;
        assert_eq!(state, PlayState::Error("No network connection".to_string()));
    }

    #[tokio::test]
    async fn test_insert_from_search_result() {
        let f = fixture().await;
        let found = f.view_model.get_geo_city_lookup("Paris").await;
        let bean = &found.success().unwrap()[0];

        let city = f
            .view_model
            .insert_city_info(&NewCity::from(bean))
            .await
            .unwrap();
        assert_eq!(city.location_id, "101010100");
        assert_eq!(city.province, "Paris Province");
        assert!(city.is_index);
    }
}
