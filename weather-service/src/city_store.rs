use common::errors::AppError;
use common::models::{CityInfo, NewCity};
use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::db::queries::CityRow;

/// Persisted city list with a live view.
///
/// Every mutation re-queries the table and republishes the list when it
/// changed, so observers of [`CityStore::subscribe`] always see the stored
/// order: GPS entry first, then insertion order.
pub struct CityStore {
    pool: SqlitePool,
    list: watch::Sender<Vec<CityInfo>>,
}

impl CityStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, AppError> {
        let initial = load(&pool).await?;
        let (list, _rx) = watch::channel(initial);
        Ok(Self { pool, list })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<CityInfo>> {
        self.list.subscribe()
    }

    pub fn cities(&self) -> Vec<CityInfo> {
        self.list.borrow().clone()
    }

    async fn refresh(&self) -> Result<(), AppError> {
        let cities = load(&self.pool).await?;
        self.list.send_if_modified(|current| {
            if *current == cities {
                false
            } else {
                *current = cities;
                true
            }
        });
        Ok(())
    }

    /// Saves a searched city (an existing entry with the same location id is
    /// reused) and makes it the selected one.
    #[instrument(skip(self, city), fields(location_id = %city.location_id))]
    pub async fn insert_city(&self, city: &NewCity) -> Result<CityInfo, AppError> {
        validate(city)?;

        let row = match CityRow::insert(&self.pool, city, false).await? {
            Some(row) => {
                info!(uid = row.uid, name = %row.name, "City added");
                row
            }
            None => {
                debug!("City already saved");
                CityRow::find_by_location_id(&self.pool, &city.location_id)
                    .await?
                    .ok_or_else(|| AppError::internal("City vanished after insert"))?
            }
        };

        CityRow::select_index(&self.pool, row.uid).await?;
        self.refresh().await?;
        self.find(row.uid).await
    }

    /// Records the GPS-derived city, updating the existing GPS entry in place.
    /// The entry becomes the selection when nothing is selected yet.
    #[instrument(skip(self, city), fields(location_id = %city.location_id))]
    pub async fn upsert_location_city(&self, city: &NewCity) -> Result<CityInfo, AppError> {
        validate(city)?;

        let uid = match CityRow::find_location_city(&self.pool).await? {
            Some(row) => {
                CityRow::update_details(&self.pool, row.uid, city)
                    .await
                    .map_err(unique_violation_as_validation)?;
                debug!(uid = row.uid, "Location city updated");
                row.uid
            }
            None => {
                let row = CityRow::insert(&self.pool, city, true)
                    .await?
                    .ok_or_else(|| {
                        AppError::validation("Current location is already saved as a city")
                    })?;
                info!(uid = row.uid, name = %row.name, "Location city recorded");
                row.uid
            }
        };

        if !CityRow::has_index(&self.pool).await? {
            CityRow::select_index(&self.pool, uid).await?;
        }

        self.refresh().await?;
        self.find(uid).await
    }

    #[instrument(skip(self))]
    pub async fn select(&self, uid: i64) -> Result<CityInfo, AppError> {
        if !CityRow::select_index(&self.pool, uid).await? {
            return Err(AppError::not_found(format!("City {} not found", uid)));
        }
        self.refresh().await?;
        self.find(uid).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, uid: i64) -> Result<(), AppError> {
        let row = CityRow::find_by_uid(&self.pool, uid)
            .await?
            .ok_or_else(|| AppError::not_found(format!("City {} not found", uid)))?;

        if row.is_location {
            return Err(AppError::validation("The current location cannot be deleted"));
        }

        CityRow::delete(&self.pool, uid).await?;
        info!(uid, name = %row.name, "City deleted");
        self.refresh().await
    }

    async fn find(&self, uid: i64) -> Result<CityInfo, AppError> {
        CityRow::find_by_uid(&self.pool, uid)
            .await?
            .map(CityInfo::from)
            .ok_or_else(|| AppError::not_found(format!("City {} not found", uid)))
    }
}

/// Position of the selected city in `cities`, or 0 when none is selected
pub fn selected_index(cities: &[CityInfo]) -> usize {
    cities.iter().position(|c| c.is_index).unwrap_or(0)
}

async fn load(pool: &SqlitePool) -> Result<Vec<CityInfo>, AppError> {
    Ok(CityRow::list_all(pool)
        .await?
        .into_iter()
        .map(CityInfo::from)
        .collect())
}

fn validate(city: &NewCity) -> Result<(), AppError> {
    if city.location_id.trim().is_empty() || city.name.trim().is_empty() {
        return Err(AppError::validation("City location id and name are required"));
    }
    Ok(())
}

fn unique_violation_as_validation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        return AppError::validation("Current location is already saved as a city");
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    async fn store() -> CityStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        CityStore::new(pool).await.unwrap()
    }

    fn city(id: &str, name: &str) -> NewCity {
        NewCity {
            location_id: id.to_string(),
            name: name.to_string(),
            province: String::new(),
            city: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_selects_and_notifies() {
        let store = store().await;
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        store.insert_city(&city("a", "A")).await.unwrap();
        let b = store.insert_city(&city("b", "B")).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let cities = rx.borrow_and_update().clone();
        assert_eq!(cities.len(), 2);
        assert!(b.is_index);
        assert_eq!(selected_index(&cities), 1);
    }

    #[tokio::test]
    async fn test_insert_duplicate_reuses_row() {
        let store = store().await;
        let first = store.insert_city(&city("a", "A")).await.unwrap();
        store.insert_city(&city("b", "B")).await.unwrap();

        let again = store.insert_city(&city("a", "A")).await.unwrap();
        assert_eq!(again.uid, first.uid);
        assert!(again.is_index);
        assert_eq!(store.cities().len(), 2);
    }

    #[tokio::test]
    async fn test_location_city_is_upserted() {
        let store = store().await;
        let first = store
            .upsert_location_city(&city("116.40,39.90", "Dongcheng"))
            .await
            .unwrap();
        assert!(first.is_location);
        assert!(first.is_index);

        let moved = store
            .upsert_location_city(&city("121.47,31.23", "Huangpu"))
            .await
            .unwrap();
        assert_eq!(moved.uid, first.uid);
        assert_eq!(moved.name, "Huangpu");
        assert_eq!(store.cities().len(), 1);
    }

    #[tokio::test]
    async fn test_location_city_keeps_existing_selection() {
        let store = store().await;
        let picked = store.insert_city(&city("a", "A")).await.unwrap();

        let gps = store
            .upsert_location_city(&city("116.40,39.90", "Here"))
            .await
            .unwrap();
        assert!(!gps.is_index);

        let cities = store.cities();
        assert_eq!(cities[0].uid, gps.uid);
        assert_eq!(cities[selected_index(&cities)].uid, picked.uid);
    }

    #[tokio::test]
    async fn test_location_city_cannot_be_deleted() {
        let store = store().await;
        let gps = store
            .upsert_location_city(&city("116.40,39.90", "Here"))
            .await
            .unwrap();

        let err = store.delete(gps.uid).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(store.cities().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_select_unknown() {
        let store = store().await;
        let a = store.insert_city(&city("a", "A")).await.unwrap();

        store.delete(a.uid).await.unwrap();
        assert!(store.cities().is_empty());

        assert!(matches!(
            store.delete(a.uid).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            store.select(a.uid).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_rejects_blank_city() {
        let store = store().await;
        let err = store.insert_city(&city(" ", "A")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_selected_index_defaults_to_zero() {
        assert_eq!(selected_index(&[]), 0);
    }
}
