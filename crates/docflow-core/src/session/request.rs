//! MutationRequest: everything a session needs to mutate one document.

use std::fmt;
use std::sync::Arc;

use super::intent::Intent;
use crate::conflict::ConflictCheck;
use crate::domain::DocumentId;
use crate::ports::{CreateOption, SaveOptions};

/// Reduced intent used on the discussion companion when the target itself
/// cannot be edited.
#[derive(Clone)]
pub struct Fallback {
    pub intent: Arc<dyn Intent>,
    pub summary: String,
    pub watch: bool,
}

impl Fallback {
    pub fn new(intent: impl Intent + 'static, summary: impl Into<String>) -> Self {
        Self {
            intent: Arc::new(intent),
            summary: summary.into(),
            watch: false,
        }
    }

    pub fn watched(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }
}

#[derive(Clone)]
pub struct MutationRequest {
    pub target: DocumentId,
    pub intent: Arc<dyn Intent>,
    pub summary: String,
    pub options: SaveOptions,
    /// Checked in order, before the editability check.
    pub checks: Vec<ConflictCheck>,
    pub fallback: Option<Fallback>,
}

impl MutationRequest {
    pub fn new(target: DocumentId, intent: impl Intent + 'static, summary: impl Into<String>) -> Self {
        Self {
            target,
            intent: Arc::new(intent),
            summary: summary.into(),
            options: SaveOptions::default(),
            checks: Vec::new(),
            fallback: None,
        }
    }

    pub fn create(mut self, create: CreateOption) -> Self {
        self.options.create = create;
        self
    }

    pub fn watched(mut self, watch: bool) -> Self {
        self.options.watch = watch;
        self
    }

    pub fn with_check(mut self, check: ConflictCheck) -> Self {
        self.checks.push(check);
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// The request run against the companion document.
    ///
    /// Creating the companion is allowed; no conflict checks and no further
    /// fallback.
    pub(crate) fn redirect(&self, target: DocumentId, fallback: &Fallback) -> Self {
        Self {
            target,
            intent: fallback.intent.clone(),
            summary: fallback.summary.clone(),
            options: SaveOptions::new(CreateOption::Recreate).watched(fallback.watch),
            checks: Vec::new(),
            fallback: None,
        }
    }
}

impl fmt::Debug for MutationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationRequest")
            .field("target", &self.target)
            .field("summary", &self.summary)
            .field("options", &self.options)
            .field("checks", &self.checks.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
