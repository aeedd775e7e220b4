//! ActionPolicy - action の種類ごとの宣言的な task 一覧
//!
//! policy は「どの task を、どの依存で、何をするか」をデータとして返すだけです。
//! 実行は汎用の `ActionDriver` が行います。

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::domain::{ActionError, ActionParams, DocumentId, SessionOutcome};
use crate::ports::{Clock, Notifier};
use crate::session::{MutationRequest, MutationSession};

/// Result of one task, forwarded to its dependents.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Done,
    /// The task had nothing to do with these parameters.
    Skipped(String),
    /// Where the discussion for this action takes place.
    Discussion { page: DocumentId, numbering: String },
    /// First author of the target, if known.
    Creator(Option<String>),
    Saved(Box<SessionOutcome>),
}

impl StepOutput {
    pub fn discussion(&self) -> Option<(&DocumentId, &str)> {
        match self {
            StepOutput::Discussion { page, numbering } => Some((page, numbering)),
            _ => None,
        }
    }

    pub fn creator(&self) -> Option<&str> {
        match self {
            StepOutput::Creator(creator) => creator.as_deref(),
            _ => None,
        }
    }
}

/// Everything a custom step may use.
#[derive(Clone)]
pub struct StepContext {
    pub params: Arc<ActionParams>,
    pub session: MutationSession,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// Builds the request of a mutating step from the parameters and the
/// dependency results (in declared order). `None` skips the step.
pub type MutateFn =
    Arc<dyn Fn(&ActionParams, &[StepOutput]) -> Result<Option<MutationRequest>, ActionError> + Send + Sync>;

pub type CustomFn =
    Arc<dyn Fn(StepContext, Vec<StepOutput>) -> BoxFuture<'static, Result<StepOutput, ActionError>> + Send + Sync>;

#[derive(Clone)]
pub enum Step {
    /// One mutation session.
    Mutate(MutateFn),
    /// Anything else: lookups, notifications, computed names.
    Custom(CustomFn),
}

impl Step {
    pub fn mutate<F>(build: F) -> Self
    where
        F: Fn(&ActionParams, &[StepOutput]) -> Result<Option<MutationRequest>, ActionError>
            + Send
            + Sync
            + 'static,
    {
        Step::Mutate(Arc::new(build))
    }

    pub fn custom<F>(run: F) -> Self
    where
        F: Fn(StepContext, Vec<StepOutput>) -> BoxFuture<'static, Result<StepOutput, ActionError>>
            + Send
            + Sync
            + 'static,
    {
        Step::Custom(Arc::new(run))
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Mutate(_) => f.write_str("Step::Mutate"),
            Step::Custom(_) => f.write_str("Step::Custom"),
        }
    }
}

/// One row of a policy's task table.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: &'static str,
    pub deps: Vec<&'static str>,
    pub step: Step,
}

impl TaskSpec {
    pub fn new(name: &'static str, deps: &[&'static str], step: Step) -> Self {
        Self {
            name,
            deps: deps.to_vec(),
            step,
        }
    }
}

pub trait ActionPolicy: Send + Sync {
    /// Registry key, e.g. `"rfd"`.
    fn kind(&self) -> &'static str;

    fn label(&self) -> &str;

    /// Reject parameters before anything runs.
    fn validate(&self, params: &ActionParams) -> Result<(), ActionError>;

    fn plan(&self, params: &ActionParams) -> Vec<TaskSpec>;
}

/// The first `Discussion` among dependency results.
pub(crate) fn discussion_from(inputs: &[StepOutput]) -> Result<(&DocumentId, &str), ActionError> {
    inputs
        .iter()
        .find_map(StepOutput::discussion)
        .ok_or_else(|| ActionError::failed("discussion page was not determined"))
}

/// The first `Creator` among dependency results.
pub(crate) fn creator_from(inputs: &[StepOutput]) -> Option<&str> {
    inputs.iter().find_map(StepOutput::creator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_results_are_looked_up_by_shape() {
        let inputs = vec![
            StepOutput::Creator(Some("Ferris".into())),
            StepOutput::Discussion {
                page: DocumentId::new("RfD/2024/Rust"),
                numbering: String::new(),
            },
        ];
        let (page, numbering) = discussion_from(&inputs).unwrap();
        assert_eq!(page.as_str(), "RfD/2024/Rust");
        assert_eq!(numbering, "");
        assert_eq!(creator_from(&inputs), Some("Ferris"));
    }

    #[test]
    fn missing_discussion_is_a_task_failure() {
        let err = discussion_from(&[StepOutput::Done]).unwrap_err();
        assert_eq!(err.kind(), crate::domain::ErrorKind::DependencyFailed);
    }
}
