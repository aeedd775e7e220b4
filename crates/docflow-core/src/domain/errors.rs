//! Errors - エラー型と分類
//!
//! - `ErrorKind`: 報告用の分類（serialize 可能）
//! - `ActionError`: session / task レベルのエラー
//! - `GraphError`: graph の構成エラーと、最初に失敗した task の報告

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::document::{DocumentId, Version};
use super::state::TaskState;

/// ErrorKind は失敗の分類
///
/// `Conflict` だけが自動リトライ（1 回）の対象です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    UserAborted,
    NoEditableTarget,
    Conflict,
    PermissionDenied,
    DependencyFailed,
    AlreadyExists,
    InvalidParams,
    Store,
    Panicked,
}

#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("{0} does not exist")]
    NotFound(DocumentId),

    #[error("aborted by user: {0}")]
    UserAborted(String),

    #[error("{0} cannot be edited and has no separate discussion page")]
    NoEditableTarget(DocumentId),

    #[error("{id} changed since it was loaded (expected {expected:?}, found {current:?})")]
    Conflict {
        id: DocumentId,
        expected: Option<Version>,
        current: Option<Version>,
    },

    #[error("permission denied on {id}: {reason}")]
    PermissionDenied { id: DocumentId, reason: String },

    /// A task's own failure signal.
    #[error("{0}")]
    DependencyFailed(String),

    #[error("{0} already exists")]
    AlreadyExists(DocumentId),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("task panicked: {0}")]
    Panicked(String),
}

impl ActionError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ActionError::DependencyFailed(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::NotFound(_) => ErrorKind::NotFound,
            ActionError::UserAborted(_) => ErrorKind::UserAborted,
            ActionError::NoEditableTarget(_) => ErrorKind::NoEditableTarget,
            ActionError::Conflict { .. } => ErrorKind::Conflict,
            ActionError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            ActionError::DependencyFailed(_) => ErrorKind::DependencyFailed,
            ActionError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            ActionError::InvalidParams(_) => ErrorKind::InvalidParams,
            ActionError::Store(_) => ErrorKind::Store,
            ActionError::Panicked(_) => ErrorKind::Panicked,
        }
    }
}

/// GraphError は task graph の実行結果としてのエラー
///
/// `DuplicateTask` / `UnknownDependency` / `Cycle` はプログラムの誤りで、
/// どの task も起動される前に返ります。
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("task '{0}' is registered twice")]
    DuplicateTask(String),

    #[error("task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        source: ActionError,
        /// Tasks that finished successfully before the halt, in completion order.
        completed: Vec<String>,
        /// Tasks that were never started.
        cancelled: Vec<String>,
        /// Final state of every task.
        states: BTreeMap<String, TaskState>,
    },
}

impl GraphError {
    /// Name of the failing task, when the failure came from a task.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            GraphError::TaskFailed { task, .. } => Some(task),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            GraphError::TaskFailed { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
