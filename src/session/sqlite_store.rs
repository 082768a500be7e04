// src/session/sqlite_store.rs
// Durable sqlite-backed realization of the Session Store contract, grounded
// in the teacher's `session::manager::SessionManager` (an `SqlitePool`
// wrapped by a small async API) but storing the session as a single JSON
// column, since the session shape here is an open, nested document rather
// than a handful of scalar columns.

use super::store::SessionStore;
use super::types::Session;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Session>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM sessions WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((data,)) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> anyhow::Result<()> {
        let data = serde_json::to_string(session)?;
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO sessions (key, data, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(&session.key)
        .bind(data)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        SqliteSessionStore::migrate(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn round_trips_a_session() {
        let pool = pool().await;
        let store = SqliteSessionStore::new(pool);
        let mut session = Session::new("whatsapp-919876543210");
        session.authenticated = true;
        session.user_id = Some(42);

        store.save(&session).await.unwrap();
        let loaded = store.get("whatsapp-919876543210").await.unwrap().unwrap();
        assert_eq!(loaded.user_id, Some(42));
        assert!(loaded.authenticated);
    }

    #[tokio::test]
    async fn missing_session_returns_none() {
        let pool = pool().await;
        let store = SqliteSessionStore::new(pool);
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn last_write_wins_on_whole_object_save() {
        let pool = pool().await;
        let store = SqliteSessionStore::new(pool);
        let mut session = Session::new("k");
        session.module = Some("food".to_string());
        store.save(&session).await.unwrap();

        session.module = Some("ecom".to_string());
        store.save(&session).await.unwrap();

        let loaded = store.get("k").await.unwrap().unwrap();
        assert_eq!(loaded.module, Some("ecom".to_string()));
    }
}
