//! ConflictDetector - 既存の競合マーカーの検出と判断
//!
//! # 設計原則
//! - `scan` / `check` / `resolve` はすべて純粋関数（副作用なし）
//! - ユーザーへの確認（`Confirm`）は呼び出し側（MutationSession）が行う
//! - マーカー集合はデータ（`MarkerSet`）として渡す

use std::sync::Arc;

use super::marker::{MarkerMatch, MarkerSet};

/// What a "yes" and a "no" from the user mean for one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// yes: remove the markers and continue; no: abort.
    StripOrAbort,
    /// yes: continue with the text unchanged; no: abort.
    KeepOrAbort,
    /// yes: remove the markers; no: continue with the text unchanged.
    StripOrKeep,
}

/// The detector's decision for one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Proceed,
    ProceedStripped(String),
    Abort(String),
}

/// One conflict check configured by a call site.
///
/// `prompt` may contain `{marker}`, replaced by the matched marker's name.
#[derive(Debug, Clone)]
pub struct ConflictCheck {
    pub markers: Arc<MarkerSet>,
    pub prompt: String,
    pub on_conflict: OnConflict,
}

impl ConflictCheck {
    pub fn new(markers: Arc<MarkerSet>, prompt: impl Into<String>, on_conflict: OnConflict) -> Self {
        Self {
            markers,
            prompt: prompt.into(),
            on_conflict,
        }
    }
}

/// A detected conflict waiting for the user's answer.
#[derive(Debug, Clone)]
pub struct PendingConfirmation<'a> {
    check: &'a ConflictCheck,
    found: MarkerMatch,
}

impl PendingConfirmation<'_> {
    pub fn found(&self) -> &MarkerMatch {
        &self.found
    }

    /// Human-readable question for the confirmation callback.
    pub fn prompt(&self) -> String {
        self.check.prompt.replace("{marker}", self.found.display_name())
    }

    pub fn resolve(&self, proceed: bool, text: &str) -> Resolution {
        ConflictDetector::resolve(self.check, &self.found, proceed, text)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn scan(text: &str, markers: &MarkerSet) -> Option<MarkerMatch> {
        markers.scan(text)
    }

    /// `Some` when the check's markers are present and the user must be asked.
    pub fn check<'a>(text: &str, check: &'a ConflictCheck) -> Option<PendingConfirmation<'a>> {
        Self::scan(text, &check.markers).map(|found| PendingConfirmation { check, found })
    }

    pub fn resolve(check: &ConflictCheck, found: &MarkerMatch, proceed: bool, text: &str) -> Resolution {
        match (check.on_conflict, proceed) {
            (OnConflict::StripOrAbort, true) | (OnConflict::StripOrKeep, true) => {
                Resolution::ProceedStripped(check.markers.strip(text))
            }
            (OnConflict::KeepOrAbort, true) | (OnConflict::StripOrKeep, false) => Resolution::Proceed,
            (OnConflict::StripOrAbort, false) | (OnConflict::KeepOrAbort, false) => {
                Resolution::Abort(format!("{} already present, and you chose to abort", found.display_name()))
            }
        }
    }
}
