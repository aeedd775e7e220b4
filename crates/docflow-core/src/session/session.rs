//! MutationSession - 1 文書に対する load → check → transform → save
//!
//! # 処理の流れ（1 attempt）
//! 1. load（存在しない文書は CreateOption に従って NotFound / 空として扱う）
//! 2. conflict check（マーカーがあればユーザーに確認。回答は attempt をまたいで再利用）
//! 3. editability（編集できなければ companion 文書への fallback）
//! 4. intent を適用（純粋関数）
//! 5. version 付きで save
//!
//! 失敗した attempt は Decider に渡し、Retry なら reload からやり直します。

use std::sync::Arc;

use tracing::Instrument;

use super::request::MutationRequest;
use crate::conflict::{ConflictDetector, Resolution};
use crate::domain::{ActionError, Decider, Decision, Document, SessionOutcome, WriteTarget};
use crate::ports::{Confirm, CreateOption, DocumentStore, IdGenerator};

enum Attempt {
    Saved(Document),
    /// The target cannot be edited; continue with this request instead.
    Redirect(MutationRequest),
}

#[derive(Clone)]
pub struct MutationSession {
    store: Arc<dyn DocumentStore>,
    confirm: Arc<dyn Confirm>,
    decider: Arc<dyn Decider>,
    ids: Arc<dyn IdGenerator>,
}

impl MutationSession {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        confirm: Arc<dyn Confirm>,
        decider: Arc<dyn Decider>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            confirm,
            decider,
            ids,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Run one request to a saved document or an error.
    pub async fn run(&self, request: MutationRequest) -> Result<SessionOutcome, ActionError> {
        let session_id = self.ids.generate_session_id();
        let span = tracing::info_span!("session", %session_id, document = %request.target);
        self.run_attempts(request).instrument(span).await
    }

    async fn run_attempts(&self, request: MutationRequest) -> Result<SessionOutcome, ActionError> {
        let requested = request.target.clone();
        let mut current = request;
        let mut via = WriteTarget::Primary;
        let mut answers: Vec<Option<bool>> = vec![None; current.checks.len()];
        let mut retries = 0;

        loop {
            match self.attempt(&current, &mut answers).await {
                Ok(Attempt::Saved(document)) => {
                    tracing::info!(document = %document.id, ?via, retries, "saved");
                    return Ok(SessionOutcome {
                        requested,
                        via,
                        document,
                        summary: current.summary,
                        retries,
                    });
                }
                Ok(Attempt::Redirect(next)) => {
                    tracing::warn!(
                        from = %current.target,
                        to = %next.target,
                        "cannot edit the document, writing to its discussion page instead"
                    );
                    answers = vec![None; next.checks.len()];
                    current = next;
                    via = WriteTarget::Fallback;
                    retries = 0;
                }
                Err(error) => match self.decider.decide(retries, &error) {
                    Decision::Retry { reason } => {
                        tracing::warn!(%reason, "version conflict, reloading");
                        retries += 1;
                    }
                    Decision::Surface { reason } => {
                        tracing::warn!(kind = ?error.kind(), %reason, "session failed");
                        return Err(error);
                    }
                },
            }
        }
    }

    async fn attempt(
        &self,
        request: &MutationRequest,
        answers: &mut [Option<bool>],
    ) -> Result<Attempt, ActionError> {
        let id = &request.target;
        let doc = self
            .store
            .load(id)
            .await
            .map_err(|e| e.into_action(id))?;

        match (doc.exists(), request.options.create) {
            (false, CreateOption::NoCreate) => return Err(ActionError::NotFound(id.clone())),
            (true, CreateOption::CreateOnly) => return Err(ActionError::AlreadyExists(id.clone())),
            _ => {}
        }

        let mut text = doc.text.clone();
        for (check, answer) in request.checks.iter().zip(answers.iter_mut()) {
            let Some(pending) = ConflictDetector::check(&text, check) else {
                continue;
            };
            let proceed = match *answer {
                Some(previous) => previous,
                None => {
                    let decided = self.ask(pending.prompt()).await?;
                    *answer = Some(decided);
                    decided
                }
            };
            match pending.resolve(proceed, &text) {
                Resolution::Proceed => {}
                Resolution::ProceedStripped(stripped) => text = stripped,
                Resolution::Abort(reason) => {
                    tracing::warn!(%reason, "aborted by user");
                    return Err(ActionError::UserAborted(reason));
                }
            }
        }

        if !doc.can_edit() {
            let Some(fallback) = &request.fallback else {
                return Err(ActionError::NoEditableTarget(id.clone()));
            };
            let companion = id.companion();
            if &companion == id {
                return Err(ActionError::NoEditableTarget(id.clone()));
            }
            return Ok(Attempt::Redirect(request.redirect(companion, fallback)));
        }

        let new_text = request.intent.apply(&doc, &text)?;
        let version = self
            .store
            .save(id, &new_text, doc.version, &request.summary, &request.options)
            .await
            .map_err(|e| e.into_action(id))?;

        Ok(Attempt::Saved(Document {
            text: new_text,
            version: Some(version),
            ..doc
        }))
    }

    /// Ask on the blocking pool so sibling tasks keep running.
    async fn ask(&self, prompt: String) -> Result<bool, ActionError> {
        let confirm = self.confirm.clone();
        tracing::debug!(%prompt, "asking for confirmation");
        tokio::task::spawn_blocking(move || confirm.confirm(&prompt))
            .await
            .map_err(|e| ActionError::Panicked(format!("confirmation callback: {e}")))
    }
}
