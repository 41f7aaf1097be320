use common::errors::AppError;
use common::models::{CityInfo, SelectedCity};
use std::sync::Arc;
use tokio::sync::watch;

use crate::city_store::{CityStore, selected_index};

/// State holder of the saved city list screen
pub struct CityListViewModel {
    cities: Arc<CityStore>,
}

impl CityListViewModel {
    pub fn new(cities: Arc<CityStore>) -> Self {
        Self { cities }
    }

    pub fn city_info_list(&self) -> watch::Receiver<Vec<CityInfo>> {
        self.cities.subscribe()
    }

    pub fn selected(&self) -> SelectedCity {
        let cities = self.cities.cities();
        let index = selected_index(&cities);
        SelectedCity {
            index,
            city: cities.into_iter().nth(index),
        }
    }

    pub async fn update_city_info_index(&self, uid: i64) -> Result<CityInfo, AppError> {
        self.cities.select(uid).await
    }

    pub async fn delete_city_info(&self, uid: i64) -> Result<(), AppError> {
        self.cities.delete(uid).await
    }
}
