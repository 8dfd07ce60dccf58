/// Repository collaborator
///
/// Operations persist typed records through `get`, `find_all`, `add` and
/// `save`. The SQLite implementation keeps each record as a JSON document
/// keyed by `(kind, id)`.

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqlitePool};
use std::marker::PhantomData;
use uuid::Uuid;

/// A persisted record type
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Storage discriminator, unique per record type
    const KIND: &'static str;

    fn id(&self) -> Uuid;
}

#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<T>>;

    /// All records of this type, oldest first
    async fn find_all(&self) -> AppResult<Vec<T>>;

    /// Insert a new record; `Conflict` if the id exists
    async fn add(&self, record: &T) -> AppResult<()>;

    /// Update an existing record; `NotFound` if it does not exist
    async fn save(&self, record: &T) -> AppResult<()>;
}

/// JSON-document repository over the `records` table
pub struct SqliteRepository<T> {
    db: SqlitePool,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for SqliteRepository<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> SqliteRepository<T> {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    fn decode(body: &str) -> AppResult<T> {
        serde_json::from_str(body).map_err(|e| {
            AppError::Internal(format!("Corrupt {} record: {}", T::KIND, e))
        })
    }
}

#[async_trait]
impl<T: Record> Repository<T> for SqliteRepository<T> {
    async fn get(&self, id: Uuid) -> AppResult<Option<T>> {
        let row = sqlx::query("SELECT body FROM records WHERE kind = ?1 AND id = ?2")
            .bind(T::KIND)
            .bind(id.to_string())
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.try_get("body")?;
                Ok(Some(Self::decode(&body)?))
            }
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> AppResult<Vec<T>> {
        let rows = sqlx::query("SELECT body FROM records WHERE kind = ?1 ORDER BY rowid")
            .bind(T::KIND)
            .fetch_all(&self.db)
            .await?;

        rows.iter()
            .map(|row| {
                let body: String = row.try_get("body")?;
                Self::decode(&body)
            })
            .collect()
    }

    async fn add(&self, record: &T) -> AppResult<()> {
        let body = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO records (kind, id, body, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(kind, id) DO NOTHING
            "#,
        )
        .bind(T::KIND)
        .bind(record.id().to_string())
        .bind(&body)
        .bind(&now)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "{} {} already exists",
                T::KIND,
                record.id()
            )));
        }

        Ok(())
    }

    async fn save(&self, record: &T) -> AppResult<()> {
        let body = serde_json::to_string(record)?;

        let result = sqlx::query(
            "UPDATE records SET body = ?1, updated_at = ?2 WHERE kind = ?3 AND id = ?4",
        )
        .bind(&body)
        .bind(Utc::now().to_rfc3339())
        .bind(T::KIND)
        .bind(record.id().to_string())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} {} does not exist",
                T::KIND,
                record.id()
            )));
        }

        Ok(())
    }
}
