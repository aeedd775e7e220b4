//! Decision model: what a mutation session does after a failed save attempt.
//!
//! The Decider is a pure function of (attempts so far, error); the session
//! carries the decision out.

use serde::{Deserialize, Serialize};

use super::errors::ActionError;

/// The next action after a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Reload the document and apply the intent again.
    Retry { reason: String },

    /// Stop and surface the error to the caller.
    Surface { reason: String },
}

/// Retry policy for stale-version conflicts.
///
/// At most one automatic retry is ever performed; a second conflict is
/// surfaced rather than retried silently. Larger budgets are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_conflict_retries: u32,
}

impl RetryPolicy {
    pub const MAX_CONFLICT_RETRIES: u32 = 1;

    /// `retries` clamped to [`Self::MAX_CONFLICT_RETRIES`].
    pub fn up_to(retries: u32) -> Self {
        Self {
            max_conflict_retries: retries.min(Self::MAX_CONFLICT_RETRIES),
        }
    }

    pub fn single_retry() -> Self {
        Self {
            max_conflict_retries: 1,
        }
    }

    pub fn never() -> Self {
        Self {
            max_conflict_retries: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single_retry()
    }
}

/// Trait for deciding what to do after a failed attempt.
pub trait Decider: Send + Sync {
    /// # Arguments
    /// * `retries` - automatic retries already performed for this session
    /// * `error` - the failure of the most recent attempt
    fn decide(&self, retries: u32, error: &ActionError) -> Decision;
}

/// Default decider: only version conflicts are retried, and only while the
/// policy's budget lasts.
#[derive(Debug, Clone, Default)]
pub struct DefaultDecider {
    policy: RetryPolicy,
}

impl DefaultDecider {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: RetryPolicy::up_to(policy.max_conflict_retries),
        }
    }
}

impl Decider for DefaultDecider {
    fn decide(&self, retries: u32, error: &ActionError) -> Decision {
        match error {
            ActionError::Conflict { id, .. } if retries < self.policy.max_conflict_retries => {
                Decision::Retry {
                    reason: format!(
                        "{id} changed while editing, retry {}/{}",
                        retries + 1,
                        self.policy.max_conflict_retries
                    ),
                }
            }
            ActionError::Conflict { id, .. } => Decision::Surface {
                reason: format!(
                    "{id} kept changing, giving up after {retries} automatic retries"
                ),
            },
            other => Decision::Surface {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocumentId, Version};
    use rstest::rstest;

    fn conflict() -> ActionError {
        ActionError::Conflict {
            id: DocumentId::new("Rust"),
            expected: Some(Version(5)),
            current: Some(Version(6)),
        }
    }

    #[test]
    fn first_conflict_is_retried() {
        let decider = DefaultDecider::default();
        assert!(matches!(decider.decide(0, &conflict()), Decision::Retry { .. }));
    }

    #[test]
    fn second_conflict_is_surfaced() {
        let decider = DefaultDecider::default();
        assert!(matches!(decider.decide(1, &conflict()), Decision::Surface { .. }));
    }

    #[rstest]
    #[case::not_found(ActionError::NotFound(DocumentId::new("Rust")))]
    #[case::aborted(ActionError::UserAborted("no".into()))]
    #[case::denied(ActionError::PermissionDenied { id: DocumentId::new("Rust"), reason: "protected".into() })]
    #[case::failed(ActionError::failed("boom"))]
    fn other_errors_are_never_retried(#[case] error: ActionError) {
        let decider = DefaultDecider::default();
        assert!(matches!(decider.decide(0, &error), Decision::Surface { .. }));
    }

    #[test]
    fn oversized_budget_still_retries_only_once() {
        let decider = DefaultDecider::new(RetryPolicy { max_conflict_retries: 3 });
        assert!(matches!(decider.decide(0, &conflict()), Decision::Retry { .. }));
        assert!(matches!(decider.decide(1, &conflict()), Decision::Surface { .. }));
    }

    #[test]
    fn zero_budget_surfaces_immediately() {
        let decider = DefaultDecider::new(RetryPolicy::never());
        assert!(matches!(decider.decide(0, &conflict()), Decision::Surface { .. }));
    }
}
