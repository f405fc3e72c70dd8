use std::str::FromStr;

use board::{default_items, first_duplicate_id, PriceSnapshot, PricedItem, MAX_PRICE};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::OnceCell;
use tracing::{debug, info};

pub mod sqlite_url;

pub use sqlite_url::{ensure_parent_dir, validate_sqlite_url};

pub const INIT_SQL: &str = include_str!("../../../scripts/init_db.sql");

const REQUIRED_TABLES: &[&str] = &["prices"];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The write payload was rejected; correctable by the caller.
    #[error("invalid price data: {0}")]
    Validation(String),
    #[error("store unavailable: {0}")]
    Transport(#[from] sqlx::Error),
    #[error("stored row is unreadable: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

type PriceRow = (i64, String, i64, i64, i64);

/// Canonical price list backed by sqlite.
///
/// The pool is opened on the first call and reused afterwards. Writes are
/// whole-list replacements; two concurrent writers race and the later commit
/// wins in full.
pub struct Store {
    url: String,
    pool: OnceCell<SqlitePool>,
}

impl Store {
    /// Builds a store without touching the database.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool: OnceCell::new(),
        }
    }

    /// Builds a store and opens the pool right away.
    pub async fn connect(url: &str) -> Result<Self> {
        let store = Self::new(url);
        store.pool().await?;
        Ok(store)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn pool(&self) -> Result<&SqlitePool> {
        self.pool.get_or_try_init(|| open_pool(&self.url)).await
    }

    /// Returns the current list in insertion order, seeding the defaults into an empty table.
    pub async fn read_all(&self) -> Result<PriceSnapshot> {
        let pool = self.pool().await?;
        let rows = fetch_rows(pool).await?;
        if !rows.is_empty() {
            return snapshot_from_rows(rows);
        }

        seed_defaults(pool).await?;
        snapshot_from_rows(fetch_rows(pool).await?)
    }

    /// Atomically discards every row and stores `items` verbatim.
    pub async fn replace_all(&self, items: Vec<PricedItem>) -> Result<PriceSnapshot> {
        validate_items(&items)?;
        let pool = self.pool().await?;
        let updated_at = now_millis();
        let ts_ms = updated_at.timestamp_millis();

        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM prices").execute(&mut *tx).await?;
        for (position, item) in items.iter().enumerate() {
            insert_row(&mut tx, position as i64, item, ts_ms).await?;
        }
        tx.commit().await?;

        debug!(rows = items.len(), ts_ms, "price list replaced");
        Ok(PriceSnapshot::new(items, updated_at))
    }

    pub async fn validate_required_tables(&self) -> Result<Vec<String>> {
        let pool = self.pool().await?;
        let present: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(pool)
                .await?;
        Ok(REQUIRED_TABLES
            .iter()
            .filter(|table| !present.iter().any(|name| name == *table))
            .map(|table| table.to_string())
            .collect())
    }
}

pub async fn init_sqlite(url: &str) -> Result<Store> {
    let store = Store::connect(url).await?;
    info!(path = url, "sqlite initialized");
    Ok(store)
}

async fn open_pool(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let in_memory = url.starts_with(sqlite_url::MEMORY_PREFIX);
    // Every in-memory connection is its own database, so pin a single one.
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    let pool = pool_options.connect_with(options).await?;
    run_init_sql(&pool).await?;
    debug!(url, in_memory, "sqlite pool opened");
    Ok(pool)
}

async fn run_init_sql(pool: &SqlitePool) -> Result<()> {
    for statement in INIT_SQL.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            continue;
        }
        sqlx::query(trimmed).execute(pool).await?;
    }
    Ok(())
}

async fn fetch_rows(pool: &SqlitePool) -> Result<Vec<PriceRow>> {
    let rows = sqlx::query_as::<_, PriceRow>(
        "SELECT id, name, buy, sell, updated_at_ms FROM prices ORDER BY position ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn seed_defaults(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prices")
        .fetch_one(&mut *tx)
        .await?;
    if count > 0 {
        // Another reader or a writer got there first.
        tx.rollback().await?;
        return Ok(());
    }

    let ts_ms = now_millis().timestamp_millis();
    let defaults = default_items();
    for (position, item) in defaults.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO prices (id, position, name, buy, sell, updated_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(item.id)
        .bind(position as i64)
        .bind(&item.name)
        .bind(item.buy as i64)
        .bind(item.sell as i64)
        .bind(ts_ms)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    info!(rows = defaults.len(), "seeded default prices into empty store");
    Ok(())
}

async fn insert_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    position: i64,
    item: &PricedItem,
    ts_ms: i64,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO prices (id, position, name, buy, sell, updated_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(item.id)
    .bind(position)
    .bind(&item.name)
    .bind(item.buy as i64)
    .bind(item.sell as i64)
    .bind(ts_ms)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn validate_items(items: &[PricedItem]) -> Result<()> {
    if items.is_empty() {
        return Err(StoreError::Validation(
            "price list must contain at least one item".into(),
        ));
    }
    if let Some(id) = first_duplicate_id(items) {
        return Err(StoreError::Validation(format!("duplicate item id {id}")));
    }
    if let Some(item) = items
        .iter()
        .find(|item| item.buy > MAX_PRICE || item.sell > MAX_PRICE)
    {
        return Err(StoreError::Validation(format!(
            "price out of range for item {}",
            item.id
        )));
    }
    Ok(())
}

fn snapshot_from_rows(rows: Vec<PriceRow>) -> Result<PriceSnapshot> {
    let mut latest_ms = i64::MIN;
    let mut items = Vec::with_capacity(rows.len());
    for (id, name, buy, sell, updated_at_ms) in rows {
        let buy = u64::try_from(buy)
            .map_err(|_| StoreError::Corrupt(format!("negative buy price for item {id}")))?;
        let sell = u64::try_from(sell)
            .map_err(|_| StoreError::Corrupt(format!("negative sell price for item {id}")))?;
        latest_ms = latest_ms.max(updated_at_ms);
        items.push(PricedItem {
            id,
            name,
            buy,
            sell,
        });
    }
    let updated_at = Utc
        .timestamp_millis_opt(latest_ms)
        .single()
        .ok_or_else(|| StoreError::Corrupt(format!("bad timestamp {latest_ms}")))?;
    Ok(PriceSnapshot::new(items, updated_at))
}

/// Current time truncated to what the `updated_at_ms` column can hold.
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_millis_opt(now.timestamp_millis())
        .single()
        .unwrap_or(now)
}
