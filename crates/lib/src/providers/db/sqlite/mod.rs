use crate::{
    leads::Lead,
    providers::db::storage::{vec_to_blob, DocumentStore, LeadStore, StoreError},
    types::{ChunkRecord, RetrievedDoc},
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::fmt::{self, Debug};
use tracing::{debug, warn};
use turso::{Connection, Database, Value as TursoValue};
use uuid::Uuid;

pub mod sql;

/// A provider for a local SQLite database using Turso.
///
/// Cloning shares the same underlying database, so one in-memory instance can
/// serve several components at once.
#[derive(Clone)]
pub struct SqliteProvider {
    pub db: Database,
}

impl SqliteProvider {
    /// Opens (or creates) the database at `db_path`. Use `":memory:"` for an
    /// isolated in-memory database.
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        // WAL has no effect on in-memory databases but is harmless there.
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { db })
    }

    /// Ensures that all required tables and indexes exist. Idempotent.
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ()).await?;
        }
        Ok(())
    }

    pub(crate) fn connect(&self) -> Result<Connection, StoreError> {
        self.db
            .connect()
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

fn optional_text(value: &Option<String>) -> TursoValue {
    match value {
        Some(text) => TursoValue::Text(text.clone()),
        None => TursoValue::Null,
    }
}

pub(crate) fn text_column(value: TursoValue) -> Option<String> {
    match value {
        TursoValue::Text(text) => Some(text),
        _ => None,
    }
}

#[async_trait]
impl DocumentStore for SqliteProvider {
    async fn insert_chunk(&self, record: &ChunkRecord) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let conn = self.connect()?;
        let params = vec![
            TursoValue::Text(id.clone()),
            TursoValue::Text(record.owner_id.clone()),
            TursoValue::Text(record.filename.clone()),
            TursoValue::Integer(record.chunk_index as i64),
            TursoValue::Text(record.content.clone()),
            TursoValue::Text(serde_json::to_string(&record.metadata)?),
            TursoValue::Blob(vec_to_blob(&record.embedding)),
            TursoValue::Text(Utc::now().to_rfc3339()),
        ];
        conn.execute(sql::INSERT_CHUNK, params).await?;
        debug!(chunk_id = %id, filename = %record.filename, index = record.chunk_index, "Stored chunk");
        Ok(id)
    }

    async fn nearest(
        &self,
        query: &[f32],
        owner_filter: Option<&str>,
        top_k: usize,
        threshold: f64,
    ) -> Result<Vec<RetrievedDoc>, StoreError> {
        if query.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let conn = self.connect()?;

        // Turso's vector functions take the query vector as a literal.
        let vector = format!(
            "vector32('[{}]')",
            query
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let limit = TursoValue::Integer(i64::try_from(top_k).unwrap_or(i64::MAX));
        let (template, params) = match owner_filter {
            Some(owner) => (
                sql::SELECT_NEAREST_CHUNKS_BY_OWNER,
                vec![
                    TursoValue::Text(owner.to_string()),
                    TursoValue::Real(threshold),
                    limit,
                ],
            ),
            None => (
                sql::SELECT_NEAREST_CHUNKS,
                vec![TursoValue::Real(threshold), limit],
            ),
        };
        let statement = template.replace("{vector}", &vector);
        let mut rows = conn.query(&statement, params).await?;

        let mut found = Vec::new();
        while let Some(row) = rows.next().await? {
            let content = text_column(row.get_value(0)?).unwrap_or_default();
            let metadata: Map<String, Value> = match text_column(row.get_value(1)?) {
                Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!("Ignoring unreadable chunk metadata: {e}");
                    Map::new()
                }),
                None => Map::new(),
            };
            let similarity = match row.get_value(2)? {
                TursoValue::Real(similarity) => similarity,
                TursoValue::Integer(similarity) => similarity as f64,
                _ => continue,
            };
            found.push(RetrievedDoc {
                content,
                metadata,
                similarity,
            });
        }
        debug!(found = found.len(), ?owner_filter, "Vector search finished");
        Ok(found)
    }
}

#[async_trait]
impl LeadStore for SqliteProvider {
    async fn insert_lead(&self, lead: &Lead) -> Result<String, StoreError> {
        let conn = self.connect()?;
        let params = vec![
            TursoValue::Text(lead.id.clone()),
            TursoValue::Text(lead.contact_id.clone()),
            TursoValue::Text(lead.phone.clone()),
            optional_text(&lead.name),
            optional_text(&lead.company),
            optional_text(&lead.industry),
            optional_text(&lead.pain_description),
            optional_text(&lead.preferred_date),
            TursoValue::Text(serde_json::to_string(&lead.collected_data)?),
            TursoValue::Text(lead.created_at.to_rfc3339()),
        ];
        conn.execute(sql::INSERT_LEAD, params).await?;
        Ok(lead.id.clone())
    }
}
