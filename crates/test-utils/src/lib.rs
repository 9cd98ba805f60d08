//! Shared fakes and fixtures for the `leadrag` workspace tests.

use anyhow::Result;
use async_trait::async_trait;
use leadrag::{
    dialogue::{Session, SessionStore},
    errors::PromptError,
    leads::Lead,
    providers::{
        ai::{AiProvider, Embedder},
        db::{
            sqlite::SqliteProvider,
            storage::{LeadStore, StoreError},
        },
    },
    types::{ChatMessage, Role},
};
use std::{
    collections::{HashMap, VecDeque},
    fmt::Debug,
    sync::{Arc, Mutex, Once},
};

static TRACING: Once = Once::new();

/// Installs a compact tracing subscriber once per test binary.
pub fn setup_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .compact()
            .try_init();
    });
}

// --- Test Setup ---

/// An in-memory SQLite database with the full schema applied.
pub struct TestSetup {
    pub provider: SqliteProvider,
}

impl TestSetup {
    pub async fn new() -> Result<Self> {
        let provider = SqliteProvider::new(":memory:").await?;
        provider.initialize_schema().await?;
        Ok(Self { provider })
    }
}

// --- Mock AI Provider ---

/// One recorded completion call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub user_message: String,
}

/// A scripted completion provider.
///
/// Replies are served from a FIFO queue; when the queue is empty the default
/// reply is used. `fail_next` makes the next call return an API error.
#[derive(Clone, Debug)]
pub struct MockAiProvider {
    replies: Arc<Mutex<VecDeque<String>>>,
    default_reply: Arc<Mutex<String>>,
    failures: Arc<Mutex<usize>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            default_reply: Arc::new(Mutex::new("OK".to_string())),
            failures: Arc::new(Mutex::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_default_reply(self, reply: &str) -> Self {
        *self.default_reply.lock().unwrap() = reply.to_string();
        self
    }

    /// Queues a reply for the next unanswered call.
    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(reply.to_string());
    }

    /// Makes the next call fail with a 503.
    pub fn fail_next(&self) {
        *self.failures.lock().unwrap() += 1;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_system_prompt(&self) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|c| c.system_prompt.clone())
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, PromptError> {
        let content_of = |role: Role| {
            messages
                .iter()
                .find(|m| m.role == role)
                .map(|m| m.content.clone())
                .unwrap_or_default()
        };
        self.calls.lock().unwrap().push(RecordedCall {
            system_prompt: content_of(Role::System),
            user_message: content_of(Role::User),
        });

        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(PromptError::AiApi {
                    status: 503,
                    body: "MockAiProvider: scripted failure".to_string(),
                });
            }
        }

        let queued = self.replies.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| self.default_reply.lock().unwrap().clone()))
    }
}

// --- Mock Embedder ---

/// Returns fixed vectors for known texts and a default vector otherwise.
///
/// Texts containing a registered failure key produce an API error.
#[derive(Clone, Debug)]
pub struct MockEmbedder {
    vectors: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    failing: Arc<Mutex<Vec<String>>>,
    default_vector: Vec<f32>,
    calls: Arc<Mutex<usize>>,
}

impl MockEmbedder {
    pub fn new(default_vector: Vec<f32>) -> Self {
        Self {
            vectors: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(Mutex::new(Vec::new())),
            default_vector,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Maps every text containing `key` to `vector`.
    pub fn set_vector(&self, key: &str, vector: Vec<f32>) {
        self.vectors.lock().unwrap().insert(key.to_string(), vector);
    }

    /// Makes every text containing `key` fail to embed.
    pub fn fail_on(&self, key: &str) {
        self.failing.lock().unwrap().push(key.to_string());
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PromptError> {
        *self.calls.lock().unwrap() += 1;
        if self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|key| text.contains(key.as_str()))
        {
            return Err(PromptError::AiApi {
                status: 400,
                body: "MockEmbedder: scripted failure".to_string(),
            });
        }
        let vectors = self.vectors.lock().unwrap();
        let vector = vectors
            .iter()
            .find(|(key, _)| text.contains(key.as_str()))
            .map(|(_, vector)| vector.clone())
            .unwrap_or_else(|| self.default_vector.clone());
        Ok(vector)
    }
}

// --- Failing Stores ---

/// A lead store whose every insert fails.
#[derive(Clone, Debug, Default)]
pub struct FailingLeadStore;

#[async_trait]
impl LeadStore for FailingLeadStore {
    async fn insert_lead(&self, _lead: &Lead) -> Result<String, StoreError> {
        Err(StoreError::Operation(
            "FailingLeadStore: database is locked".to_string(),
        ))
    }
}

/// A session store that reads every user as new and fails every write.
#[derive(Clone, Debug, Default)]
pub struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn get(&self, _user_id: &str) -> Result<Session, StoreError> {
        Ok(Session::default())
    }

    async fn put(&self, _user_id: &str, _session: &Session) -> Result<(), StoreError> {
        Err(StoreError::Operation(
            "FailingSessionStore: disk I/O error".to_string(),
        ))
    }
}
