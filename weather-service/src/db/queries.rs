use chrono::{DateTime, Utc};
use common::models::{CityInfo, NewCity};
use sqlx::SqlitePool;

#[derive(sqlx::FromRow)]
pub struct CityRow {
    pub uid: i64,
    pub location_id: String,
    pub name: String,
    pub province: String,
    pub city: String,
    pub is_location: bool,
    pub is_index: bool,
    pub created_at: DateTime<Utc>,
}

impl From<CityRow> for CityInfo {
    fn from(row: CityRow) -> Self {
        Self {
            uid: row.uid,
            location_id: row.location_id,
            name: row.name,
            province: row.province,
            city: row.city,
            is_location: row.is_location,
            is_index: row.is_index,
            created_at: row.created_at,
        }
    }
}

impl CityRow {
    /// Inserts a city unless one with the same `location_id` exists.
    /// Returns `None` when the insert was skipped.
    pub async fn insert(
        pool: &SqlitePool,
        city: &NewCity,
        is_location: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, CityRow>(
            r#"
            INSERT INTO city_info (location_id, name, province, city, is_location, is_index, created_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            ON CONFLICT (location_id) DO NOTHING
            RETURNING uid, location_id, name, province, city, is_location, is_index, created_at
            "#,
        )
        .bind(&city.location_id)
        .bind(&city.name)
        .bind(&city.province)
        .bind(&city.city)
        .bind(is_location)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    pub async fn find_by_uid(pool: &SqlitePool, uid: i64) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT uid, location_id, name, province, city, is_location, is_index, created_at
            FROM city_info
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    pub async fn find_by_location_id(
        pool: &SqlitePool,
        location_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT uid, location_id, name, province, city, is_location, is_index, created_at
            FROM city_info
            WHERE location_id = $1
            "#,
        )
        .bind(location_id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// The GPS-derived entry, if one was recorded
    pub async fn find_location_city(pool: &SqlitePool) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT uid, location_id, name, province, city, is_location, is_index, created_at
            FROM city_info
            WHERE is_location = 1
            LIMIT 1
            "#,
        )
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// GPS entry first, then insertion order
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT uid, location_id, name, province, city, is_location, is_index, created_at
            FROM city_info
            ORDER BY is_location DESC, uid ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_details(
        pool: &SqlitePool,
        uid: i64,
        city: &NewCity,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE city_info
            SET location_id = $1, name = $2, province = $3, city = $4
            WHERE uid = $5
            "#,
        )
        .bind(&city.location_id)
        .bind(&city.name)
        .bind(&city.province)
        .bind(&city.city)
        .bind(uid)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, uid: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM city_info WHERE uid = $1")
            .bind(uid)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Makes `uid` the only selected city. Leaves the selection untouched
    /// and returns `false` when `uid` does not exist.
    pub async fn select_index(pool: &SqlitePool, uid: i64) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE city_info SET is_index = 0 WHERE is_index = 1 AND uid != $1")
            .bind(uid)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("UPDATE city_info SET is_index = 1 WHERE uid = $1")
            .bind(uid)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn has_index(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM city_info WHERE is_index = 1",
        )
        .fetch_one(pool)
        .await?;

        Ok(count > 0)
    }
}
