//! # PostgreSQL Entity Store
//!
//! [`ItemStore`]/[`ListStore`] over a `sqlx::PgPool`. Queries are runtime-checked
//! so the crate builds without a live database; the schema lives in
//! `migrations/`.
//!
//! Every call runs under an optional per-call deadline. A call that exceeds it
//! fails with [`StoreError::Timeout`], which the batch processor records as an
//! element error.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{EntityStore, ItemStore, ListStore, StoreError, StoreResult};
use crate::models::{Item, List};

const ITEM_COLUMNS: &str = "id, list_id, title, description, status, priority, dependencies, \
     position, created_by, completed_at, created_at, updated_at";

const LIST_COLUMNS: &str = "id, title, description, status, priority, parent_list_id, \
     created_by, completed_at, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    list_id: String,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    dependencies: Vec<String>,
    position: i64,
    created_by: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Item {
            status: row.status.parse().map_err(StoreError::Database)?,
            priority: row.priority.parse().map_err(StoreError::Database)?,
            id: row.id,
            list_id: row.list_id,
            title: row.title,
            description: row.description,
            dependencies: row.dependencies.into_iter().collect(),
            position: row.position,
            created_by: row.created_by,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ListRow {
    id: String,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    parent_list_id: Option<String>,
    created_by: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ListRow> for List {
    type Error = StoreError;

    fn try_from(row: ListRow) -> Result<Self, Self::Error> {
        Ok(List {
            status: row.status.parse().map_err(StoreError::Database)?,
            priority: row.priority.parse().map_err(StoreError::Database)?,
            id: row.id,
            title: row.title,
            description: row.description,
            parent_list_id: row.parent_list_id,
            created_by: row.created_by,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL-backed entity store
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
    call_timeout: Option<Duration>,
}

impl std::fmt::Debug for PgEntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgEntityStore")
            .field("pool", &"PgPool")
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            call_timeout: None,
        }
    }

    /// Bound every store call by `timeout`
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))
    }

    async fn timed<T, F>(&self, operation: &str, call: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| StoreError::Timeout {
                    operation: operation.to_string(),
                })?
                .map_err(StoreError::from),
            None => call.await.map_err(StoreError::from),
        }
    }
}

#[async_trait]
impl ItemStore for PgEntityStore {
    async fn get_item(&self, id: &str) -> StoreResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM tasklist_items WHERE id = $1");
        let row = self
            .timed(
                "get_item",
                sqlx::query_as::<_, ItemRow>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;
        row.map(Item::try_from).transpose()
    }

    async fn insert_item(&self, item: Item) -> StoreResult<Item> {
        let sql = format!(
            "INSERT INTO tasklist_items ({ITEM_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {ITEM_COLUMNS}"
        );
        let dependencies: Vec<String> = item.dependencies.iter().cloned().collect();
        let row = self
            .timed(
                "insert_item",
                sqlx::query_as::<_, ItemRow>(&sql)
                    .bind(&item.id)
                    .bind(&item.list_id)
                    .bind(&item.title)
                    .bind(&item.description)
                    .bind(item.status.as_str())
                    .bind(item.priority.as_str())
                    .bind(&dependencies)
                    .bind(item.position)
                    .bind(&item.created_by)
                    .bind(item.completed_at)
                    .bind(item.created_at)
                    .bind(item.updated_at)
                    .fetch_one(&self.pool),
            )
            .await?;
        Item::try_from(row)
    }

    async fn update_item(&self, item: Item) -> StoreResult<Item> {
        let sql = format!(
            "UPDATE tasklist_items SET list_id = $2, title = $3, description = $4, status = $5, \
             priority = $6, dependencies = $7, position = $8, completed_at = $9, updated_at = $10 \
             WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        );
        let dependencies: Vec<String> = item.dependencies.iter().cloned().collect();
        let row = self
            .timed(
                "update_item",
                sqlx::query_as::<_, ItemRow>(&sql)
                    .bind(&item.id)
                    .bind(&item.list_id)
                    .bind(&item.title)
                    .bind(&item.description)
                    .bind(item.status.as_str())
                    .bind(item.priority.as_str())
                    .bind(&dependencies)
                    .bind(item.position)
                    .bind(item.completed_at)
                    .bind(item.updated_at)
                    .fetch_optional(&self.pool),
            )
            .await?;
        row.map(Item::try_from)
            .transpose()?
            .ok_or_else(|| StoreError::Conflict(format!("item {} no longer exists", item.id)))
    }

    async fn delete_item(&self, id: &str) -> StoreResult<bool> {
        let result = self
            .timed(
                "delete_item",
                sqlx::query("DELETE FROM tasklist_items WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn items_in_list(&self, list_id: &str) -> StoreResult<Vec<Item>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM tasklist_items WHERE list_id = $1 ORDER BY position, id"
        );
        let rows = self
            .timed(
                "items_in_list",
                sqlx::query_as::<_, ItemRow>(&sql)
                    .bind(list_id)
                    .fetch_all(&self.pool),
            )
            .await?;
        rows.into_iter().map(Item::try_from).collect()
    }

    async fn count_items_in_list(&self, list_id: &str) -> StoreResult<usize> {
        let count: i64 = self
            .timed(
                "count_items_in_list",
                sqlx::query_scalar("SELECT COUNT(*) FROM tasklist_items WHERE list_id = $1")
                    .bind(list_id)
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn dependents_of(&self, id: &str) -> StoreResult<Vec<Item>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM tasklist_items WHERE $1 = ANY(dependencies) ORDER BY id"
        );
        let rows = self
            .timed(
                "dependents_of",
                sqlx::query_as::<_, ItemRow>(&sql)
                    .bind(id)
                    .fetch_all(&self.pool),
            )
            .await?;
        rows.into_iter().map(Item::try_from).collect()
    }
}

#[async_trait]
impl ListStore for PgEntityStore {
    async fn get_list(&self, id: &str) -> StoreResult<Option<List>> {
        let sql = format!("SELECT {LIST_COLUMNS} FROM tasklist_lists WHERE id = $1");
        let row = self
            .timed(
                "get_list",
                sqlx::query_as::<_, ListRow>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;
        row.map(List::try_from).transpose()
    }

    async fn insert_list(&self, list: List) -> StoreResult<List> {
        let sql = format!(
            "INSERT INTO tasklist_lists ({LIST_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {LIST_COLUMNS}"
        );
        let row = self
            .timed(
                "insert_list",
                sqlx::query_as::<_, ListRow>(&sql)
                    .bind(&list.id)
                    .bind(&list.title)
                    .bind(&list.description)
                    .bind(list.status.as_str())
                    .bind(list.priority.as_str())
                    .bind(&list.parent_list_id)
                    .bind(&list.created_by)
                    .bind(list.completed_at)
                    .bind(list.created_at)
                    .bind(list.updated_at)
                    .fetch_one(&self.pool),
            )
            .await?;
        List::try_from(row)
    }

    async fn update_list(&self, list: List) -> StoreResult<List> {
        let sql = format!(
            "UPDATE tasklist_lists SET title = $2, description = $3, status = $4, priority = $5, \
             parent_list_id = $6, completed_at = $7, updated_at = $8 \
             WHERE id = $1 RETURNING {LIST_COLUMNS}"
        );
        let row = self
            .timed(
                "update_list",
                sqlx::query_as::<_, ListRow>(&sql)
                    .bind(&list.id)
                    .bind(&list.title)
                    .bind(&list.description)
                    .bind(list.status.as_str())
                    .bind(list.priority.as_str())
                    .bind(&list.parent_list_id)
                    .bind(list.completed_at)
                    .bind(list.updated_at)
                    .fetch_optional(&self.pool),
            )
            .await?;
        row.map(List::try_from)
            .transpose()?
            .ok_or_else(|| StoreError::Conflict(format!("list {} no longer exists", list.id)))
    }

    async fn delete_list(&self, id: &str) -> StoreResult<bool> {
        let result = self
            .timed(
                "delete_list",
                sqlx::query("DELETE FROM tasklist_lists WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn child_lists(&self, parent_id: &str) -> StoreResult<Vec<List>> {
        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM tasklist_lists WHERE parent_list_id = $1 ORDER BY id"
        );
        let rows = self
            .timed(
                "child_lists",
                sqlx::query_as::<_, ListRow>(&sql)
                    .bind(parent_id)
                    .fetch_all(&self.pool),
            )
            .await?;
        rows.into_iter().map(List::try_from).collect()
    }
}

impl EntityStore for PgEntityStore {
    fn store_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewItem, NewList};

    #[test]
    fn test_item_row_conversion_rejects_unknown_status() {
        let now = Utc::now();
        let row = ItemRow {
            id: "a".into(),
            list_id: "l".into(),
            title: "t".into(),
            description: None,
            status: "blocked".into(),
            priority: "low".into(),
            dependencies: vec![],
            position: 0,
            created_by: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(Item::try_from(row), Err(StoreError::Database(_))));
    }

    #[test]
    fn test_list_row_conversion() {
        let now = Utc::now();
        let row = ListRow {
            id: "l".into(),
            title: "Inbox".into(),
            description: None,
            status: "archived".into(),
            priority: "urgent".into(),
            parent_list_id: Some("root".into()),
            created_by: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        let list = List::try_from(row).unwrap();
        assert_eq!(list.status.as_str(), "archived");
        assert_eq!(list.parent_list_id.as_deref(), Some("root"));
    }

    // Requires DATABASE_URL pointing at a disposable database
    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL database"]
    async fn test_round_trip_against_postgres(pool: PgPool) -> sqlx::Result<()> {
        let store = PgEntityStore::new(pool).with_call_timeout(Duration::from_secs(5));
        let now = Utc::now();

        let list = NewList::new("Inbox").into_list("inbox".into(), None, now);
        store.insert_list(list).await.expect("insert list");

        let first = NewItem::new("inbox", "First").into_item("first".into(), None, 0, now);
        let second = NewItem::new("inbox", "Second")
            .with_dependencies(["first"])
            .into_item("second".into(), None, 1, now);
        store.insert_item(first).await.expect("insert first");
        store.insert_item(second).await.expect("insert second");

        let dependents = store.dependents_of("first").await.expect("dependents");
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].id, "second");
        assert_eq!(store.count_items_in_list("inbox").await.expect("count"), 2);
        Ok(())
    }
}
