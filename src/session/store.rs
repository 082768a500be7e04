// src/session/store.rs
// C6: Session Store contract (spec §4.6). Writes are last-writer-wins on a
// whole-object basis; there are no cross-session transactions.

use super::types::Session;
use async_trait::async_trait;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Session>>;

    /// Whole-object upsert. Last writer wins.
    async fn save(&self, session: &Session) -> anyhow::Result<()>;
}

/// Loads the session for `key`, creating an empty one if absent — the
/// "create empty test session if absent" behavior of spec §4.8 gate 2.
pub async fn get_or_create(store: &dyn SessionStore, key: &str) -> anyhow::Result<Session> {
    match store.get(key).await? {
        Some(s) => Ok(s),
        None => Ok(Session::new(key)),
    }
}
