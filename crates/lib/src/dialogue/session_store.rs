//! # Session Store
//!
//! Keyed persistence for dialogue sessions. A missing session reads as a fresh
//! default one.

use super::state::Session;
use crate::providers::db::{
    sqlite::{sql, text_column, SqliteProvider},
    storage::StoreError,
};
use async_trait::async_trait;
use chrono::Utc;
use std::{collections::HashMap, fmt::Debug, sync::Arc};
use tokio::sync::RwLock;
use turso::Value as TursoValue;

#[async_trait]
pub trait SessionStore: Send + Sync + Debug {
    /// Returns the stored session, or a fresh one if the user is unknown.
    async fn get(&self, user_id: &str) -> Result<Session, StoreError>;
    async fn put(&self, user_id: &str, session: &Session) -> Result<(), StoreError>;
}

/// Sessions kept in process memory. Lost on restart.
#[derive(Clone, Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> Result<Session, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn put(&self, user_id: &str, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(user_id.to_string(), session.clone());
        Ok(())
    }
}

/// Sessions stored as JSON in the `sessions` table, surviving restarts.
#[derive(Clone, Debug)]
pub struct SqliteSessionStore {
    provider: SqliteProvider,
}

impl SqliteSessionStore {
    /// Expects the schema to have been initialized on `provider`.
    pub fn new(provider: SqliteProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, user_id: &str) -> Result<Session, StoreError> {
        let conn = self.provider.connect()?;
        let mut rows = conn
            .query(
                sql::SELECT_SESSION,
                vec![TursoValue::Text(user_id.to_string())],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(Session::default());
        };
        match text_column(row.get_value(0)?) {
            Some(state) => Ok(serde_json::from_str(&state)?),
            None => Ok(Session::default()),
        }
    }

    async fn put(&self, user_id: &str, session: &Session) -> Result<(), StoreError> {
        let state = serde_json::to_string(session)?;
        let conn = self.provider.connect()?;
        // A single upsert, so a failed write leaves the previous state in place.
        conn.execute(
            sql::UPSERT_SESSION,
            vec![
                TursoValue::Text(user_id.to_string()),
                TursoValue::Text(state),
                TursoValue::Text(Utc::now().to_rfc3339()),
            ],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::{Field, Stage};

    #[tokio::test]
    async fn test_unknown_session_is_fresh() {
        let store = InMemorySessionStore::new();
        let session = store.get("nobody").await.unwrap();
        assert_eq!(session, Session::default());
    }

    #[tokio::test]
    async fn test_in_memory_put_then_get() {
        let store = InMemorySessionStore::new();
        let mut session = Session::default();
        session.advance_to(Stage::GatheringInfo);
        session.collected.set_if_absent(Field::Name, "Иван");
        store.put("42", &session).await.unwrap();

        assert_eq!(store.get("42").await.unwrap(), session);
        assert_eq!(store.get("43").await.unwrap(), Session::default());
    }
}
