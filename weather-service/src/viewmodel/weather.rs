use common::errors::AppError;
use common::models::{Address, CityInfo, DeviceLocation, WeatherModel};
use common::state::{PlayState, StateHolder};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, instrument, warn};

use crate::cache::WeatherCache;
use crate::city_store::selected_index;
use crate::connectivity::Connectivity;
use crate::repository::WeatherRepository;
use crate::viewmodel::job::JobSlot;

/// How a weather request was served
pub enum WeatherRequest {
    /// Answered without a fetch (offline or cache hit)
    Resolved(PlayState<WeatherModel>),
    /// A background fetch was launched
    Launched(JoinHandle<PlayState<WeatherModel>>),
}

impl WeatherRequest {
    /// Waits for the state this request produced
    pub async fn settle(self) -> PlayState<WeatherModel> {
        match self {
            Self::Resolved(state) => state,
            Self::Launched(handle) => match handle.await {
                Ok(state) => state,
                Err(e) if e.is_cancelled() => PlayState::error("Weather request was superseded"),
                Err(e) => PlayState::error(AppError::internal(e.to_string())),
            },
        }
    }
}

/// State holder of the weather detail screen
pub struct WeatherViewModel {
    repository: Arc<WeatherRepository>,
    cache: Arc<WeatherCache>,
    connectivity: Arc<dyn Connectivity>,
    lang: String,
    weather_state: Arc<StateHolder<WeatherModel>>,
    weather_job: JobSlot,
    update_city_job: JobSlot,
    cancellation_token: CancellationToken,
}

impl WeatherViewModel {
    pub fn new(
        repository: Arc<WeatherRepository>,
        cache: Arc<WeatherCache>,
        connectivity: Arc<dyn Connectivity>,
        lang: impl Into<String>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            repository,
            cache,
            connectivity,
            lang: lang.into(),
            weather_state: Arc::new(StateHolder::new("weather")),
            weather_job: JobSlot::new("weather"),
            update_city_job: JobSlot::new("update_city"),
            cancellation_token,
        }
    }

    pub fn weather_model(&self) -> watch::Receiver<PlayState<WeatherModel>> {
        self.weather_state.subscribe()
    }

    pub fn current_weather(&self) -> PlayState<WeatherModel> {
        self.weather_state.current()
    }

    pub fn city_info_list(&self) -> watch::Receiver<Vec<CityInfo>> {
        self.repository.refresh_city_list()
    }

    /// Position of the selected city in the city list
    pub fn search_city_index(&self) -> usize {
        selected_index(&self.city_info_list().borrow())
    }

    /// Serves weather for `location`: offline and fresh-cache requests are
    /// answered immediately, anything else launches a fetch that replaces
    /// the previous one.
    #[instrument(skip(self))]
    pub async fn get_weather(&self, location: &str) -> WeatherRequest {
        if !self.connectivity.is_connected().await {
            warn!("No network, skipping weather fetch");
            let state = PlayState::error(AppError::NoNetwork);
            self.weather_state.publish(state.clone());
            return WeatherRequest::Resolved(state);
        }

        if let Some(cached) = self.cache.get(location).await {
            debug!("Cache hit");
            let state = PlayState::Success(cached);
            self.weather_state.publish(state.clone());
            return WeatherRequest::Resolved(state);
        }

        let repository = self.repository.clone();
        let cache = self.cache.clone();
        let weather_state = self.weather_state.clone();
        let cancel = self.cancellation_token.clone();
        let location = location.to_string();
        let lang = self.lang.clone();

        let handle = self
            .weather_job
            .launch(
                async move {
                    let result = tokio::select! {
                        result = repository.get_weather(&location, &lang) => result,
                        _ = cancel.cancelled() => {
                            return PlayState::error("Weather request cancelled");
                        }
                    };

                    let state = match result {
                        Ok(model) => {
                            cache.set(location.clone(), model.clone()).await;
                            info!(location = %location, "Weather fetched");
                            PlayState::Success(model)
                        }
                        Err(e) => {
                            warn!(location = %location, error = %e, "Weather fetch failed");
                            PlayState::error(e)
                        }
                    };
                    weather_state.publish(state.clone());
                    state
                }
                .in_current_span(),
            )
            .await;
        WeatherRequest::Launched(handle)
    }

    /// Records the city for a new location fix in the background. Observers
    /// see the result through [`WeatherViewModel::city_info_list`].
    #[instrument(skip(self, addresses))]
    pub async fn update_city_info(&self, location: DeviceLocation, addresses: Vec<Address>) {
        let repository = self.repository.clone();
        let cancel = self.cancellation_token.clone();

        self.update_city_job
            .launch(
                async move {
                    tokio::select! {
                        result = repository.update_city_info(location, &addresses) => {
                            if let Err(e) = result {
                                error!(error = %e, "Failed to update location city");
                            }
                        }
                        _ = cancel.cancelled() => {}
                    }
                }
                .in_current_span(),
            )
            .await;
    }

    /// Aborts any running jobs
    pub async fn shutdown(&self) {
        self.weather_job.cancel().await;
        self.update_city_job.cancel().await;
    }
}
