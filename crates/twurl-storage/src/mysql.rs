use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use tracing::debug;
use twurl_core::error::StorageError;
use twurl_core::repository::{Result, UrlStore};
use twurl_core::{
    InsertOutcome, NewShortUrl, OwnerId, RecordId, ShortCode, ShortUrlRecord, Slice,
};

const SCHEMA: &str = include_str!("../ddl/mysql/short_urls.sql");

const SELECT_COLUMNS: &str =
    "SELECT id, short_code, original_url, owner_id, created_at, clicks, note FROM short_urls";

/// MySQL implementation of the store contract.
///
/// Short code uniqueness is enforced by the `uk_short_urls_short_code` key;
/// a duplicate-key error on insert is reported as a collision. Operations
/// that need more than one statement run inside a transaction, which is
/// rolled back if the future is dropped before commit.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `short_urls` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("short_urls schema is in place");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, MySql>> {
        self.pool.begin().await.map_err(map_sqlx_error)
    }
}

fn to_micros(ts: Timestamp) -> i64 {
    ts.as_microsecond()
}

fn parse_created_at(micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{}': {e}", micros))
    })
}

fn record_from_row(row: &MySqlRow) -> Result<ShortUrlRecord> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let owner_id: i64 = row.try_get("owner_id").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let clicks: u64 = row.try_get("clicks").map_err(map_sqlx_error)?;
    let note: Option<String> = row.try_get("note").map_err(map_sqlx_error)?;

    let short_code = ShortCode::parse(&short_code)
        .map_err(|e| StorageError::InvalidData(format!("stored {e}")))?;

    Ok(ShortUrlRecord {
        id: RecordId::new(id),
        original_url,
        short_code,
        owner_id: OwnerId::new(owner_id),
        created_at: parse_created_at(created_at)?,
        clicks,
        note,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn i64_from(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| StorageError::Operation(format!("{what} {value} is out of range")))
}

#[async_trait]
impl UrlStore for MySqlRepository {
    async fn insert(&self, new: NewShortUrl) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short_code, original_url, owner_id, created_at, clicks, note)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(new.short_code.as_str())
        .bind(new.original_url.as_str())
        .bind(new.owner_id.get())
        .bind(to_micros(new.created_at))
        .bind(new.note.as_deref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = i64_from(done.last_insert_id(), "insert id")?;
                Ok(InsertOutcome::Inserted(new.into_record(RecordId::new(id))))
            }
            Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Collision),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<ShortUrlRecord>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE short_code = ? LIMIT 1"))
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<ShortUrlRecord>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ? LIMIT 1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn increment_clicks(&self, code: &ShortCode) -> Result<Option<ShortUrlRecord>> {
        let mut tx = self.begin().await?;

        let updated = sqlx::query("UPDATE short_urls SET clicks = clicks + 1 WHERE short_code = ?")
            .bind(code.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        // the row lock taken by the UPDATE is held until commit
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE short_code = ? LIMIT 1"))
            .bind(code.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let record = row.as_ref().map(record_from_row).transpose()?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(record)
    }

    async fn list_by_owner(
        &self,
        owner: OwnerId,
        offset: u64,
        limit: u64,
    ) -> Result<Slice<ShortUrlRecord>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_urls WHERE owner_id = ?")
            .bind(owner.get())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if total == 0 {
            return Ok(Slice::empty());
        }

        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE owner_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(owner.get())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let items = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(Slice {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn update_note(
        &self,
        id: RecordId,
        owner: OwnerId,
        note: Option<String>,
    ) -> Result<Option<ShortUrlRecord>> {
        let mut tx = self.begin().await?;

        // MySQL reports zero affected rows when the value is unchanged, so
        // ownership is checked with a locking read instead.
        let owned = sqlx::query("SELECT id FROM short_urls WHERE id = ? AND owner_id = ? FOR UPDATE")
            .bind(id.get())
            .bind(owner.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if owned.is_none() {
            return Ok(None);
        }

        sqlx::query("UPDATE short_urls SET note = ? WHERE id = ?")
            .bind(note.as_deref())
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ? LIMIT 1"))
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let record = row.as_ref().map(record_from_row).transpose()?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(record)
    }

    async fn delete_by_id(&self, id: RecordId, owner: OwnerId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM short_urls WHERE id = ? AND owner_id = ?")
            .bind(id.get())
            .bind(owner.get())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_owner(&self, owner: OwnerId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM short_urls WHERE owner_id = ?")
            .bind(owner.get())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
