//! DocumentStore port - 版管理された文書ストア
//!
//! 楽観的並行性制御（optimistic concurrency）:
//! - `load` は現在の版（`Version`）付きで文書を返す（存在しなければ `version = None`）
//! - `save` は `expected_version` が現在の版と一致したときだけ書き込む
//! - `expected_version = None` は「まだ存在しないこと」を期待する

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ActionError, Document, DocumentId, Version};

/// How a save treats a missing (or present) document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreateOption {
    /// The document must already exist.
    #[default]
    NoCreate,
    /// The document must not exist yet.
    CreateOnly,
    /// Create the document when missing, edit it otherwise.
    Recreate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
    pub create: CreateOption,
    /// Add the saved document to the acting user's watch list.
    pub watch: bool,
}

impl SaveOptions {
    pub fn new(create: CreateOption) -> Self {
        Self {
            create,
            watch: false,
        }
    }

    pub fn watched(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("version mismatch (expected {expected:?}, found {current:?})")]
    Conflict {
        expected: Option<Version>,
        current: Option<Version>,
    },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("transport: {0}")]
    Transport(String),
}

impl StoreError {
    pub fn into_action(self, id: &DocumentId) -> ActionError {
        match self {
            StoreError::Conflict { expected, current } => ActionError::Conflict {
                id: id.clone(),
                expected,
                current,
            },
            StoreError::PermissionDenied(reason) => ActionError::PermissionDenied {
                id: id.clone(),
                reason,
            },
            StoreError::Transport(message) => ActionError::Store(format!("{id}: {message}")),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the current version of a document.
    async fn load(&self, id: &DocumentId) -> Result<Document, StoreError>;

    /// Save-if-unchanged. Returns the new version.
    async fn save(
        &self,
        id: &DocumentId,
        text: &str,
        expected_version: Option<Version>,
        summary: &str,
        options: &SaveOptions,
    ) -> Result<Version, StoreError>;

    /// Account that created the document, if the store knows it.
    async fn creator(&self, _id: &DocumentId) -> Result<Option<String>, StoreError> {
        Ok(None)
    }
}
