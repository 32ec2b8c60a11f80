use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

use crate::domain::{Address, Category, ItemId, TravelItem, next_created_at};

use super::MIGRATION_001_INITIAL;

const ITEM_COLUMNS: &str = "t.id, t.owner, t.category, t.origin, t.destination, \
     t.event_timestamp, t.created_at_timestamp";

/// A submission that passed validation and is ready to be stored.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub owner: Address,
    pub category: Category,
    pub origin: String,
    pub destination: String,
    pub event_timestamp: i64,
}

/// Repository for persisting and querying travel items.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Store a new item, assigning the next id and creation timestamp, and
    /// append it to its owner's index.
    ///
    /// Everything happens in one `BEGIN IMMEDIATE` transaction: the write
    /// lock is taken up front, so a second process waits on the busy
    /// timeout instead of failing on a lock upgrade, and if any statement
    /// fails nothing is written.
    pub async fn insert_item(&self, new_item: NewItem, now: i64) -> Result<TravelItem> {
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("Failed to begin transaction")?;

        // Last row by rowid; created_at is non-decreasing, so it is also the max.
        let head = sqlx::query(
            "SELECT id, created_at_timestamp FROM travel_items ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read ledger head")?;

        let (id, last_created_at) = match head {
            Some(row) => (row.get::<i64, _>("id") + 1, Some(row.get("created_at_timestamp"))),
            None => (0, None),
        };

        let position: i64 = sqlx::query(
            "SELECT position FROM owner_items WHERE owner = ? ORDER BY position DESC LIMIT 1",
        )
        .bind(new_item.owner.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read owner index")?
        .map_or(0, |row| row.get::<i64, _>("position") + 1);

        let item = TravelItem {
            id: u64::try_from(id).context("Invalid item id")?,
            owner: new_item.owner,
            category: new_item.category,
            origin: new_item.origin,
            destination: new_item.destination,
            event_timestamp: new_item.event_timestamp,
            created_at_timestamp: next_created_at(last_created_at, now),
        };

        sqlx::query(
            r#"
            INSERT INTO travel_items (id, owner, category, origin, destination, event_timestamp, created_at_timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(item.owner.to_string())
        .bind(i64::from(item.category.code()))
        .bind(&item.origin)
        .bind(&item.destination)
        .bind(item.event_timestamp)
        .bind(item.created_at_timestamp)
        .execute(&mut *tx)
        .await
        .context("Failed to save travel item")?;

        sqlx::query("INSERT INTO owner_items (owner, position, item_id) VALUES (?, ?, ?)")
            .bind(item.owner.to_string())
            .bind(position)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to update owner index")?;

        tx.commit().await.context("Failed to commit travel item")?;
        Ok(item)
    }

    /// Get an item by id.
    pub async fn get_item(&self, id: i64) -> Result<Option<TravelItem>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM travel_items t WHERE t.id = ?",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch travel item")?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    /// List all items, ordered by id.
    pub async fn list_items(&self) -> Result<Vec<TravelItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM travel_items t ORDER BY t.id",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list travel items")?;

        rows.iter().map(Self::row_to_item).collect()
    }

    /// List the items owned by `owner`, in submission order, through the owner index.
    pub async fn list_items_for_owner(&self, owner: &Address) -> Result<Vec<TravelItem>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM owner_items o
            JOIN travel_items t ON t.id = o.item_id
            WHERE o.owner = ?
            ORDER BY o.position
            "#,
            ITEM_COLUMNS
        ))
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list travel items for owner")?;

        rows.iter().map(Self::row_to_item).collect()
    }

    pub async fn count_items(&self) -> Result<u64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM travel_items")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count travel items")?
            .get("count");
        u64::try_from(count).context("Invalid item count")
    }

    pub async fn count_items_for_owner(&self, owner: &Address) -> Result<u64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM owner_items WHERE owner = ?")
            .bind(owner.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count travel items for owner")?
            .get("count");
        u64::try_from(count).context("Invalid item count")
    }

    /// The stored owner index: every owner's item ids in index order.
    pub async fn owner_index(&self) -> Result<HashMap<Address, Vec<ItemId>>> {
        let rows = sqlx::query("SELECT owner, item_id FROM owner_items ORDER BY owner, position")
            .fetch_all(&self.pool)
            .await
            .context("Failed to read owner index")?;

        let mut index: HashMap<Address, Vec<ItemId>> = HashMap::new();
        for row in rows {
            let owner_str: String = row.get("owner");
            let item_id: i64 = row.get("item_id");
            let owner = Address::parse(&owner_str)
                .with_context(|| format!("Invalid owner address: {}", owner_str))?;
            index
                .entry(owner)
                .or_default()
                .push(u64::try_from(item_id).context("Invalid item id")?);
        }
        Ok(index)
    }

    fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<TravelItem> {
        let id: i64 = row.get("id");
        let owner_str: String = row.get("owner");
        let category_code: i64 = row.get("category");

        Ok(TravelItem {
            id: u64::try_from(id).context("Invalid item id")?,
            owner: Address::parse(&owner_str)
                .with_context(|| format!("Invalid owner address: {}", owner_str))?,
            category: Category::from_code(category_code)
                .ok_or_else(|| anyhow::anyhow!("Invalid category code: {}", category_code))?,
            origin: row.get("origin"),
            destination: row.get("destination"),
            event_timestamp: row.get("event_timestamp"),
            created_at_timestamp: row.get("created_at_timestamp"),
        })
    }
}
