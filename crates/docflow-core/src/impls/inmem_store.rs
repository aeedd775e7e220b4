//! InMemoryDocumentStore - 開発用・テスト用の版管理ストア
//!
//! # 学習ポイント
//! - tokio::sync::Mutex による async 排他制御
//! - 楽観的並行性（expected_version と現在の版の比較）
//! - テスト用のフック（他者の割り込み編集、保存拒否、遅延）

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{ContentKind, Document, DocumentId, Version};
use crate::ports::{Clock, CreateOption, DocumentStore, SaveOptions, StoreError, SystemClock};

/// Seed data for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub text: String,
    #[serde(default)]
    pub kind: ContentKind,
    #[serde(default)]
    pub protected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

impl StoredDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn created_by(mut self, user: impl Into<String>) -> Self {
        self.creator = Some(user.into());
        self
    }
}

/// A store operation, as recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Load(DocumentId),
    Save {
        id: DocumentId,
        expected: Option<Version>,
        summary: String,
    },
    Creator(DocumentId),
}

/// A successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEdit {
    pub id: DocumentId,
    pub text: String,
    pub summary: String,
    pub options: SaveOptions,
    pub version: Version,
}

struct Entry {
    doc: StoredDocument,
    version: Version,
}

#[derive(Default)]
struct State {
    docs: HashMap<DocumentId, Entry>,
    /// Edits by "someone else" applied right after the next load of a document.
    interference: HashMap<DocumentId, VecDeque<String>>,
    denied: HashSet<DocumentId>,
    latency: HashMap<DocumentId, Duration>,
    calls: Vec<StoreCall>,
    saves: Vec<SavedEdit>,
}

impl State {
    fn write(&mut self, id: &DocumentId, text: String) -> Version {
        match self.docs.get_mut(id) {
            Some(entry) => {
                entry.doc.text = text;
                entry.version = entry.version.next();
                entry.version
            }
            None => {
                let version = Version(1);
                self.docs.insert(
                    id.clone(),
                    Entry {
                        doc: StoredDocument::new(text),
                        version,
                    },
                );
                version
            }
        }
    }
}

/// InMemoryDocumentStore は開発用の文書ストア
///
/// # 使用例
/// ```ignore
/// let store = InMemoryDocumentStore::new()
///     .with_document("Rust", StoredDocument::new("Body"));
/// store.interfere_after_load("Rust", "Edited by someone else").await;
/// ```
pub struct InMemoryDocumentStore {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seed a document at version 1.
    pub fn with_document(mut self, id: impl Into<DocumentId>, doc: StoredDocument) -> Self {
        self.state.get_mut().docs.insert(
            id.into(),
            Entry {
                doc,
                version: Version(1),
            },
        );
        self
    }

    pub fn with_documents<I, K>(self, docs: I) -> Self
    where
        I: IntoIterator<Item = (K, StoredDocument)>,
        K: Into<DocumentId>,
    {
        docs.into_iter()
            .fold(self, |store, (id, doc)| store.with_document(id, doc))
    }

    /// Move a document to a given version (seeding helper).
    pub async fn set_version(&self, id: impl Into<DocumentId>, version: Version) {
        let id = id.into();
        if let Some(entry) = self.state.lock().await.docs.get_mut(&id) {
            entry.version = version;
        }
    }

    /// After the next load of `id`, another editor saves `text`.
    pub async fn interfere_after_load(&self, id: impl Into<DocumentId>, text: impl Into<String>) {
        self.state
            .lock()
            .await
            .interference
            .entry(id.into())
            .or_default()
            .push_back(text.into());
    }

    /// Reject every save to `id` with `PermissionDenied`.
    pub async fn deny_saves(&self, id: impl Into<DocumentId>) {
        self.state.lock().await.denied.insert(id.into());
    }

    /// Delay every load and save of `id`.
    pub async fn set_latency(&self, id: impl Into<DocumentId>, latency: Duration) {
        self.state.lock().await.latency.insert(id.into(), latency);
    }

    pub async fn text(&self, id: impl Into<DocumentId>) -> Option<String> {
        let id = id.into();
        self.state.lock().await.docs.get(&id).map(|e| e.doc.text.clone())
    }

    pub async fn version(&self, id: impl Into<DocumentId>) -> Option<Version> {
        let id = id.into();
        self.state.lock().await.docs.get(&id).map(|e| e.version)
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn saves(&self) -> Vec<SavedEdit> {
        self.state.lock().await.saves.clone()
    }

    pub async fn saves_to(&self, id: impl Into<DocumentId>) -> usize {
        let id = id.into();
        self.state
            .lock()
            .await
            .saves
            .iter()
            .filter(|s| s.id == id)
            .count()
    }

    async fn delay(&self, id: &DocumentId) {
        let latency = self.state.lock().await.latency.get(id).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn load(&self, id: &DocumentId) -> Result<Document, StoreError> {
        self.delay(id).await;
        let loaded_at = self.clock.now();

        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Load(id.clone()));

        let doc = match state.docs.get(id) {
            Some(entry) => Document {
                id: id.clone(),
                text: entry.doc.text.clone(),
                kind: entry.doc.kind,
                protected: entry.doc.protected,
                version: Some(entry.version),
                loaded_at,
            },
            None => Document::missing(id.clone(), loaded_at),
        };

        let interference = state
            .interference
            .get_mut(id)
            .and_then(VecDeque::pop_front);
        if let Some(text) = interference {
            let version = state.write(id, text);
            tracing::debug!(document = %id, %version, "concurrent edit by another editor");
        }

        Ok(doc)
    }

    async fn save(
        &self,
        id: &DocumentId,
        text: &str,
        expected_version: Option<Version>,
        summary: &str,
        options: &SaveOptions,
    ) -> Result<Version, StoreError> {
        self.delay(id).await;

        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Save {
            id: id.clone(),
            expected: expected_version,
            summary: summary.to_string(),
        });

        if state.denied.contains(id) {
            return Err(StoreError::PermissionDenied(format!("{id} is protected")));
        }

        let current = state.docs.get(id).map(|e| e.version);
        if current != expected_version {
            return Err(StoreError::Conflict {
                expected: expected_version,
                current,
            });
        }
        if current.is_none() && options.create == CreateOption::NoCreate {
            return Err(StoreError::Transport(format!("{id} does not exist")));
        }

        let version = state.write(id, text.to_string());
        state.saves.push(SavedEdit {
            id: id.clone(),
            text: text.to_string(),
            summary: summary.to_string(),
            options: options.clone(),
            version,
        });
        Ok(version)
    }

    async fn creator(&self, id: &DocumentId) -> Result<Option<String>, StoreError> {
        self.delay(id).await;
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Creator(id.clone()));
        Ok(state.docs.get(id).and_then(|e| e.doc.creator.clone()))
    }
}
