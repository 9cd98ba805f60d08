//! # SQLite Specific SQL Queries
//!
//! This module centralizes SQL query strings for the SQLite provider.

pub const CREATE_DOCUMENT_CHUNKS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS document_chunks (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    filename TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL
);";

pub const CREATE_DOCUMENT_CHUNKS_OWNER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_document_chunks_owner ON document_chunks (owner_id);";

pub const CREATE_LEADS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS leads (
    id TEXT PRIMARY KEY,
    contact_id TEXT NOT NULL,
    phone TEXT NOT NULL,
    name TEXT,
    company TEXT,
    industry TEXT,
    pain_description TEXT,
    preferred_date TEXT,
    collected_data TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
);";

pub const CREATE_SESSIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    user_id TEXT PRIMARY KEY,
    state TEXT NOT NULL,
    updated_at TEXT NOT NULL
);";

/// Every statement needed to bring an empty database up to the current schema.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_DOCUMENT_CHUNKS_TABLE,
    CREATE_DOCUMENT_CHUNKS_OWNER_INDEX,
    CREATE_LEADS_TABLE,
    CREATE_SESSIONS_TABLE,
];

pub const INSERT_CHUNK: &str = "INSERT INTO document_chunks (id, owner_id, filename, chunk_index, content, metadata, embedding, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";

/// Nearest chunks by cosine similarity. `{vector}` is replaced with a
/// `vector32('[...]')` literal; the parameters are the threshold and the limit,
/// preceded by the owner for the `_BY_OWNER` variant.
pub const SELECT_NEAREST_CHUNKS: &str = "
SELECT content, metadata, 1.0 - vector_distance_cos(embedding, {vector}) AS similarity
FROM document_chunks
WHERE 1.0 - vector_distance_cos(embedding, {vector}) >= ?
ORDER BY similarity DESC
LIMIT ?";

pub const SELECT_NEAREST_CHUNKS_BY_OWNER: &str = "
SELECT content, metadata, 1.0 - vector_distance_cos(embedding, {vector}) AS similarity
FROM document_chunks
WHERE owner_id = ? AND 1.0 - vector_distance_cos(embedding, {vector}) >= ?
ORDER BY similarity DESC
LIMIT ?";

pub const INSERT_LEAD: &str = "INSERT INTO leads (id, contact_id, phone, name, company, industry, pain_description, preferred_date, collected_data, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

pub const SELECT_SESSION: &str = "SELECT state FROM sessions WHERE user_id = ?";

pub const UPSERT_SESSION: &str = "INSERT INTO sessions (user_id, state, updated_at) VALUES (?, ?, ?)
ON CONFLICT(user_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at";
