//! Food waste entry repository
//!
//! Every operation checks out one connection, runs one statement and drops
//! the connection before returning, whatever the outcome.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::MySql;

use crate::db::pool::{ConnectionPool, DbError};
use crate::models::{EntryBody, FoodWasteEntry};

// Coercions keep decoding stable whether the columns are INT/DECIMAL/FLOAT.
// `+ 0e0` yields DOUBLE on every MySQL and MariaDB version; CAST AS DOUBLE does not.
const LIST_SQL: &str = r#"
    SELECT CAST(id AS SIGNED) AS id,
           category,
           weight + 0e0 AS weight,
           waste_reason
    FROM food_waste_entries
"#;

const INSERT_SQL: &str =
    "INSERT INTO food_waste_entries (category, weight, waste_reason) VALUES (?, ?, ?)";

const DELETE_SQL: &str = "DELETE FROM food_waste_entries WHERE id = ?";

const UPDATE_SQL: &str =
    "UPDATE food_waste_entries SET category = ?, weight = ?, waste_reason = ? WHERE id = ?";

/// Storage operations behind the HTTP routes (testable)
///
/// `id` is passed through as the caller gave it; matching is left to the store.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// All entries, in whatever order the store returns them.
    async fn list(&self) -> Result<Vec<FoodWasteEntry>, DbError>;

    /// Insert one entry, returning the id the store assigned.
    async fn create(&self, entry: &EntryBody) -> Result<u64, DbError>;

    /// Delete by id, returning the number of rows removed.
    async fn delete(&self, id: &str) -> Result<u64, DbError>;

    /// Replace all three fields by id, returning the number of rows matched.
    async fn update(&self, id: &str, entry: &EntryBody) -> Result<u64, DbError>;
}

type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

/// Bind a body value with the SQL type matching its JSON type.
///
/// Objects and arrays go over as their JSON text.
fn bind_json<'q>(query: MySqlQuery<'q>, value: &'q Value) -> MySqlQuery<'q> {
    match value {
        Value::Null => query.bind(None::<&str>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.to_string()),
    }
}

/// Bind category, weight and waste_reason in column order.
fn bind_entry<'q>(
    query: MySqlQuery<'q>,
    entry: &'q EntryBody,
) -> Result<MySqlQuery<'q>, DbError> {
    let [category, weight, waste_reason] = entry.values()?;
    let query = bind_json(query, category);
    let query = bind_json(query, weight);
    Ok(bind_json(query, waste_reason))
}

/// MySQL-backed entry repository
#[derive(Clone)]
pub struct EntryRepo {
    pool: ConnectionPool,
}

impl EntryRepo {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

#[async_trait]
impl EntryStore for EntryRepo {
    async fn list(&self) -> Result<Vec<FoodWasteEntry>, DbError> {
        let mut conn = self.pool.acquire().await?;

        let entries: Vec<FoodWasteEntry> = sqlx::query_as(LIST_SQL)
            .fetch_all(&mut *conn)
            .await?;

        Ok(entries)
    }

    async fn create(&self, entry: &EntryBody) -> Result<u64, DbError> {
        let query = bind_entry(sqlx::query(INSERT_SQL), entry)?;
        let mut conn = self.pool.acquire().await?;

        let result = query.execute(&mut *conn).await?;

        Ok(result.last_insert_id())
    }

    async fn delete(&self, id: &str) -> Result<u64, DbError> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(DELETE_SQL)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    async fn update(&self, id: &str, entry: &EntryBody) -> Result<u64, DbError> {
        let query = bind_entry(sqlx::query(UPDATE_SQL), entry)?.bind(id);
        let mut conn = self.pool.acquire().await?;

        let result = query.execute(&mut *conn).await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::PoolConfig;
    use serde_json::json;

    // Integration tests require a real database with a food_waste_entries table
    // Run with: DB_HOST=... DB_USER=... DB_PASSWORD=... DB_NAME=... cargo test -- --ignored

    fn repo_from_env() -> EntryRepo {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        let config = PoolConfig {
            host: var("DB_HOST"),
            port: var("DB_PORT").parse().unwrap_or(3306),
            user: var("DB_USER"),
            password: var("DB_PASSWORD"),
            database: var("DB_NAME"),
            max_connections: 4,
            ..PoolConfig::default()
        };
        EntryRepo::new(ConnectionPool::new(&config))
    }

    fn body(category: &str, weight: f64, reason: &str) -> EntryBody {
        EntryBody::new(json!(category), json!(weight), json!(reason))
    }

    #[test]
    fn absent_field_fails_before_any_connection() {
        let entry = EntryBody {
            weight: None,
            ..body("dairy", 1.0, "expired")
        };
        let err = bind_entry(sqlx::query(INSERT_SQL), &entry).err();
        assert!(matches!(
            err,
            Some(DbError::StoreUnavailable(sqlx::Error::Encode(_)))
        ));
    }

    #[test]
    fn list_query_avoids_cast_as_double() {
        assert!(!LIST_SQL.contains("AS DOUBLE"));
        assert!(LIST_SQL.contains("weight + 0e0 AS weight"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn mistyped_values_are_coerced_by_the_store() {
        let repo = repo_from_env();
        let entry = EntryBody::new(json!(5), json!("2.5"), json!("expired"));
        let id = repo.create(&entry).await.unwrap();

        let entries = repo.list().await.unwrap();
        let row = entries.iter().find(|e| e.id as u64 == id).expect("entry listed");
        assert_eq!(row.category.as_deref(), Some("5"));
        assert_eq!(row.weight, Some(2.5));

        repo.delete(&id.to_string()).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_then_list() {
        let repo = repo_from_env();
        let id = repo.create(&body("dairy", 2.5, "expired")).await.unwrap();

        let entries = repo.list().await.unwrap();
        let entry = entries.iter().find(|e| e.id as u64 == id).expect("entry listed");
        assert_eq!(entry.category.as_deref(), Some("dairy"));
        assert_eq!(entry.weight, Some(2.5));
        assert_eq!(entry.waste_reason.as_deref(), Some("expired"));

        repo.delete(&id.to_string()).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_replaces_all_fields() {
        let repo = repo_from_env();
        let id = repo.create(&body("bread", 0.5, "stale")).await.unwrap();

        let changed = repo
            .update(&id.to_string(), &body("produce", 1.1, "spoiled"))
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let entries = repo.list().await.unwrap();
        let entry = entries.iter().find(|e| e.id as u64 == id).unwrap();
        assert_eq!(entry.category.as_deref(), Some("produce"));
        assert_eq!(entry.weight, Some(1.1));

        repo.delete(&id.to_string()).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn delete_twice_reports_zero_rows() {
        let repo = repo_from_env();
        let id = repo.create(&body("meat", 3.0, "freezer burn")).await.unwrap();

        assert_eq!(repo.delete(&id.to_string()).await.unwrap(), 1);
        assert_eq!(repo.delete(&id.to_string()).await.unwrap(), 0);
        assert_eq!(repo.pool().available(), 4);
    }
}
