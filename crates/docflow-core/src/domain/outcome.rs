//! Outcome model: what a mutation session wrote, and the report of one action.
//!
//! These are plain data for logging and explanation; they do not drive any
//! control flow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document::{Document, DocumentId};
use super::errors::{ErrorKind, GraphError};
use super::ids::RunId;
use super::state::TaskState;

/// Which document a session ended up writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteTarget {
    Primary,
    /// The requested document could not be edited; a note was left on its
    /// discussion companion instead.
    Fallback,
}

/// Result of a successful mutation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// The document the caller asked to mutate.
    pub requested: DocumentId,

    pub via: WriteTarget,

    /// Final state of the document that was saved (after the save).
    pub document: Document,

    /// Edit summary used for the save.
    pub summary: String,

    /// Automatic conflict retries that were needed.
    #[serde(default)]
    pub retries: u32,
}

impl SessionOutcome {
    pub fn written(&self) -> &DocumentId {
        &self.document.id
    }
}

/// The first failure of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub task: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Report of one action execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    pub run_id: RunId,
    pub kind: String,

    /// Final state of every task of the graph.
    pub tasks: BTreeMap<String, TaskState>,

    /// Tasks that completed, in completion order.
    pub completed: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cancelled: Vec<String>,

    /// Documents written, in completion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub saves: Vec<SessionOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReport>,
}

impl ActionReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failed_task(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.task.as_str())
    }
}

impl FailureReport {
    /// Report for a task failure; `None` for graph construction errors.
    pub fn from_graph_error(error: &GraphError) -> Option<Self> {
        match error {
            GraphError::TaskFailed { task, source, .. } => Some(Self {
                task: task.clone(),
                kind: source.kind(),
                message: source.to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActionError;
    use ulid::Ulid;

    #[test]
    fn failure_report_comes_from_task_failures_only() {
        let err = GraphError::TaskFailed {
            task: "list-entry".into(),
            source: ActionError::failed("anchor not found"),
            completed: vec!["discussion-page".into()],
            cancelled: vec![],
            states: BTreeMap::new(),
        };
        let report = FailureReport::from_graph_error(&err).unwrap();
        assert_eq!(report.task, "list-entry");
        assert_eq!(report.kind, ErrorKind::DependencyFailed);

        let err = GraphError::DuplicateTask("a".into());
        assert!(FailureReport::from_graph_error(&err).is_none());
    }

    #[test]
    fn report_serializes_without_empty_sections() {
        let report = ActionReport {
            run_id: RunId::from_ulid(Ulid::new()),
            kind: "rfd".into(),
            tasks: BTreeMap::from([("a".to_string(), TaskState::Succeeded)]),
            completed: vec!["a".into()],
            cancelled: vec![],
            saves: vec![],
            failure: None,
        };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["tasks"]["a"], "succeeded");
        assert!(v.get("failure").is_none());
        assert!(v.get("cancelled").is_none());
        assert!(report.succeeded());
    }
}
