//! ActionParams: the immutable input bundle of one action execution.
//!
//! Built once when the user confirms the action, then shared read-only (behind
//! an `Arc`) by every task of the graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document::DocumentId;

/// One chosen removal criterion (e.g. `g1`, or `db` for a custom rationale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Normalized short code, lower case.
    pub code: String,

    /// Template parameters (`"1"`, `"url"`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,

    /// Blank the document instead of prepending the tag (attack pages).
    #[serde(default)]
    pub redact: bool,
}

impl Criterion {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into().trim().to_lowercase(),
            parameters: BTreeMap::new(),
            redact: false,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn redacting(mut self) -> Self {
        self.redact = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParams {
    pub target: DocumentId,

    /// Account performing the action.
    pub requested_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<Criterion>,

    /// Wrap the inserted tag so it does not transclude.
    #[serde(default)]
    pub noinclude: bool,

    /// Also ask for creation protection.
    #[serde(default)]
    pub request_salt: bool,

    #[serde(default = "default_true")]
    pub notify_creator: bool,

    #[serde(default)]
    pub watch: bool,
}

fn default_true() -> bool {
    true
}

impl ActionParams {
    pub fn new(target: impl Into<DocumentId>, requested_by: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            requested_by: requested_by.into(),
            rationale: None,
            criteria: Vec::new(),
            noinclude: false,
            request_salt: false,
            notify_creator: true,
            watch: false,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn with_noinclude(mut self, noinclude: bool) -> Self {
        self.noinclude = noinclude;
        self
    }

    pub fn with_salt(mut self, request_salt: bool) -> Self {
        self.request_salt = request_salt;
        self
    }

    pub fn with_notify(mut self, notify_creator: bool) -> Self {
        self.notify_creator = notify_creator;
        self
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Rationale with surrounding whitespace removed; `None` when blank.
    pub fn trimmed_rationale(&self) -> Option<&str> {
        self.rationale
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}
