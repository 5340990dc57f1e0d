mod seed;

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::info;
use volo_core::{CoreError, Hotel, Review};

pub use seed::{demo_hotels, demo_reviews};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("hotel not found: {0}")]
    HotelNotFound(String),

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

pub trait CatalogRepository: Send + Sync {
    async fn list_hotels(&self) -> Result<Vec<Hotel>>;
    async fn get_hotel(&self, hotel_id: &str) -> Result<Option<Hotel>>;
    async fn upsert_hotel(&self, hotel: Hotel) -> Result<()>;
    async fn list_reviews(&self, hotel_id: &str) -> Result<Vec<Review>>;
    async fn add_review(&self, review: Review) -> Result<()>;
    async fn mark_review_helpful(&self, review_id: &str, helpful: bool) -> Result<Option<Review>>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    hotels: Arc<RwLock<Vec<Hotel>>>,
    reviews: Arc<RwLock<Vec<Review>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory store preloaded with the demo catalog.
    pub fn seeded() -> Self {
        Self {
            hotels: Arc::new(RwLock::new(demo_hotels())),
            reviews: Arc::new(RwLock::new(demo_reviews())),
        }
    }
}

impl CatalogRepository for MemoryStore {
    async fn list_hotels(&self) -> Result<Vec<Hotel>> {
        Ok(self.hotels.read().clone())
    }

    async fn get_hotel(&self, hotel_id: &str) -> Result<Option<Hotel>> {
        Ok(self
            .hotels
            .read()
            .iter()
            .find(|hotel| hotel.id == hotel_id)
            .cloned())
    }

    async fn upsert_hotel(&self, hotel: Hotel) -> Result<()> {
        hotel.validate().map_err(StorageError::from)?;

        let mut hotels = self.hotels.write();
        match hotels.iter_mut().find(|existing| existing.id == hotel.id) {
            Some(existing) => *existing = hotel,
            None => hotels.push(hotel),
        }
        Ok(())
    }

    async fn list_reviews(&self, hotel_id: &str) -> Result<Vec<Review>> {
        Ok(self
            .reviews
            .read()
            .iter()
            .filter(|review| review.hotel_id == hotel_id)
            .cloned()
            .collect())
    }

    async fn add_review(&self, review: Review) -> Result<()> {
        let mut hotels = self.hotels.write();
        let hotel = hotels
            .iter_mut()
            .find(|hotel| hotel.id == review.hotel_id)
            .ok_or_else(|| StorageError::HotelNotFound(review.hotel_id.clone()))?;
        hotel.review_count = hotel.review_count.saturating_add(1);
        self.reviews.write().push(review);
        Ok(())
    }

    async fn mark_review_helpful(&self, review_id: &str, helpful: bool) -> Result<Option<Review>> {
        let mut reviews = self.reviews.write();
        let Some(review) = reviews.iter_mut().find(|review| review.id == review_id) else {
            return Ok(None);
        };
        review.mark_helpful(helpful);
        Ok(Some(review.clone()))
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Loads the demo catalog when the hotel table is empty.
    pub async fn seed_if_empty(&self) -> Result<bool> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS total FROM hotels")
            .fetch_one(&self.pool)
            .await?
            .get("total");
        if count > 0 {
            return Ok(false);
        }

        for hotel in demo_hotels() {
            self.upsert_hotel(hotel).await?;
        }
        for review in demo_reviews() {
            self.insert_review_row(&review).await?;
        }
        info!("seeded sqlite catalog with demo hotels");
        Ok(true)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hotels (
              hotel_id TEXT PRIMARY KEY,
              body_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
              review_id TEXT PRIMARY KEY,
              hotel_id TEXT NOT NULL,
              created_at TEXT NOT NULL,
              body_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_review_row(&self, review: &Review) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (review_id, hotel_id, created_at, body_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(review_id) DO UPDATE SET body_json=excluded.body_json
            "#,
        )
        .bind(&review.id)
        .bind(&review.hotel_id)
        .bind(review.created_at.to_rfc3339())
        .bind(serde_json::to_string(review)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl CatalogRepository for SqliteStore {
    async fn list_hotels(&self) -> Result<Vec<Hotel>> {
        let rows = sqlx::query("SELECT body_json FROM hotels ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let body: String = row.get("body_json");
                serde_json::from_str(&body).context("invalid hotel row")
            })
            .collect()
    }

    async fn get_hotel(&self, hotel_id: &str) -> Result<Option<Hotel>> {
        let row = sqlx::query("SELECT body_json FROM hotels WHERE hotel_id = ?1")
            .bind(hotel_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let body: String = row.get("body_json");
        Ok(Some(
            serde_json::from_str(&body).context("invalid hotel row")?,
        ))
    }

    async fn upsert_hotel(&self, hotel: Hotel) -> Result<()> {
        hotel.validate().map_err(StorageError::from)?;

        sqlx::query(
            r#"
            INSERT INTO hotels (hotel_id, body_json)
            VALUES (?1, ?2)
            ON CONFLICT(hotel_id) DO UPDATE SET body_json=excluded.body_json
            "#,
        )
        .bind(&hotel.id)
        .bind(serde_json::to_string(&hotel)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_reviews(&self, hotel_id: &str) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT body_json
            FROM reviews
            WHERE hotel_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let body: String = row.get("body_json");
                serde_json::from_str(&body).context("invalid review row")
            })
            .collect()
    }

    async fn add_review(&self, review: Review) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction takes the write lock up front.
        let bumped = sqlx::query(
            r#"
            UPDATE hotels
            SET body_json = json_set(
              body_json,
              '$.reviewCount',
              json_extract(body_json, '$.reviewCount') + 1
            )
            WHERE hotel_id = ?1
            "#,
        )
        .bind(&review.hotel_id)
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StorageError::HotelNotFound(review.hotel_id.clone()).into());
        }

        sqlx::query(
            r#"
            INSERT INTO reviews (review_id, hotel_id, created_at, body_json)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&review.id)
        .bind(&review.hotel_id)
        .bind(review.created_at.to_rfc3339())
        .bind(serde_json::to_string(&review)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn mark_review_helpful(&self, review_id: &str, helpful: bool) -> Result<Option<Review>> {
        let row = sqlx::query("SELECT body_json FROM reviews WHERE review_id = ?1")
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let body: String = row.get("body_json");
        let mut review: Review = serde_json::from_str(&body).context("invalid review row")?;
        review.mark_helpful(helpful);

        sqlx::query("UPDATE reviews SET body_json = ?1 WHERE review_id = ?2")
            .bind(serde_json::to_string(&review)?)
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        Ok(Some(review))
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::seeded())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        sqlite.seed_if_empty().await?;
        Ok(Self::Sqlite(sqlite))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl CatalogRepository for Store {
    async fn list_hotels(&self) -> Result<Vec<Hotel>> {
        match self {
            Store::Memory(store) => store.list_hotels().await,
            Store::Sqlite(store) => store.list_hotels().await,
        }
    }

    async fn get_hotel(&self, hotel_id: &str) -> Result<Option<Hotel>> {
        match self {
            Store::Memory(store) => store.get_hotel(hotel_id).await,
            Store::Sqlite(store) => store.get_hotel(hotel_id).await,
        }
    }

    async fn upsert_hotel(&self, hotel: Hotel) -> Result<()> {
        match self {
            Store::Memory(store) => store.upsert_hotel(hotel).await,
            Store::Sqlite(store) => store.upsert_hotel(hotel).await,
        }
    }

    async fn list_reviews(&self, hotel_id: &str) -> Result<Vec<Review>> {
        match self {
            Store::Memory(store) => store.list_reviews(hotel_id).await,
            Store::Sqlite(store) => store.list_reviews(hotel_id).await,
        }
    }

    async fn add_review(&self, review: Review) -> Result<()> {
        match self {
            Store::Memory(store) => store.add_review(review).await,
            Store::Sqlite(store) => store.add_review(review).await,
        }
    }

    async fn mark_review_helpful(&self, review_id: &str, helpful: bool) -> Result<Option<Review>> {
        match self {
            Store::Memory(store) => store.mark_review_helpful(review_id, helpful).await,
            Store::Sqlite(store) => store.mark_review_helpful(review_id, helpful).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use volo_core::{ReviewAuthor, Rating};

    use super::*;

    fn review(id: &str, hotel_id: &str) -> Review {
        Review {
            id: id.to_string(),
            hotel_id: hotel_id.to_string(),
            rating: Rating::new(4).unwrap(),
            title: None,
            comment: "Lovely terrace".to_string(),
            images: Vec::new(),
            created_at: Utc::now(),
            verified: false,
            author: ReviewAuthor {
                name: "Sara".to_string(),
                avatar: None,
            },
            helpful: 0,
            not_helpful: 0,
        }
    }

    #[tokio::test]
    async fn memory_store_bumps_review_count() {
        let store = MemoryStore::seeded();
        let before = store.get_hotel("sheraton-alger").await.unwrap().unwrap();

        store.add_review(review("r-new", "sheraton-alger")).await.unwrap();

        let after = store.get_hotel("sheraton-alger").await.unwrap().unwrap();
        assert_eq!(after.review_count, before.review_count + 1);
        assert_eq!(store.list_reviews("sheraton-alger").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn review_for_unknown_hotel_is_rejected() {
        let store = MemoryStore::new();
        let error = store.add_review(review("r", "nowhere")).await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StorageError>(),
            Some(StorageError::HotelNotFound(_))
        ));
    }

    #[tokio::test]
    async fn helpful_votes_are_counted() {
        let store = MemoryStore::seeded();
        let updated = store
            .mark_review_helpful("hotel-aurassi-review-1", false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.not_helpful, 2);
        assert!(store.mark_review_helpful("missing", true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_hotel_is_not_stored() {
        let store = MemoryStore::new();
        let mut hotel = demo_hotels().remove(0);
        hotel.rating = 7.0;
        assert!(store.upsert_hotel(hotel).await.is_err());
        assert!(store.list_hotels().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sqlite_store_round_trips_catalog() {
        let store = Store::sqlite("sqlite::memory:").await.unwrap();
        assert_eq!(store.backend_name(), "sqlite");

        let hotels = store.list_hotels().await.unwrap();
        assert_eq!(hotels.len(), demo_hotels().len());
        assert_eq!(hotels[0].id, "hotel-aurassi");

        store.add_review(review("r-sql", "hotel-aurassi")).await.unwrap();
        let reviews = store.list_reviews("hotel-aurassi").await.unwrap();
        assert_eq!(reviews.len(), 6);

        let hotel = store.get_hotel("hotel-aurassi").await.unwrap().unwrap();
        assert_eq!(hotel.review_count, 125);

        let voted = store.mark_review_helpful("r-sql", true).await.unwrap().unwrap();
        assert_eq!(voted.helpful, 1);

        let error = store.add_review(review("r-lost", "nowhere")).await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StorageError>(),
            Some(StorageError::HotelNotFound(_))
        ));
        assert!(store.list_reviews("nowhere").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sqlite_reviews_keep_every_count_bump() {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let path = std::env::temp_dir().join(format!(
            "volo-reviews-{}-{nanos}.db",
            std::process::id()
        ));
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let store = Arc::new(Store::sqlite(&url).await.unwrap());

        let mut handles = Vec::new();
        for index in 0..40 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .add_review(review(&format!("r-burst-{index}"), "hotel-aurassi"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let hotel = store.get_hotel("hotel-aurassi").await.unwrap().unwrap();
        assert_eq!(hotel.review_count, 124 + 40);
        assert_eq!(store.list_reviews("hotel-aurassi").await.unwrap().len(), 45);

        drop(store);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
