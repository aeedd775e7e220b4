//! Scripted collaborators for tests and demos: confirmations and notifications.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::DocumentId;
use crate::ports::{Confirm, Notifier};

/// Answers confirmation prompts from a script and records every prompt.
///
/// When the script runs out, `default_answer` is used.
#[derive(Debug)]
pub struct ScriptedConfirm {
    answers: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<String>>,
    default_answer: bool,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
            default_answer: true,
        }
    }

    pub fn always(answer: bool) -> Self {
        Self {
            default_answer: answer,
            ..Self::new([])
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        lock(&self.prompts).push(prompt.to_string());
        lock(&self.answers).pop_front().unwrap_or(self.default_answer)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records notifications instead of delivering them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: tokio::sync::Mutex<Vec<(DocumentId, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(DocumentId, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, target: &DocumentId, message: &str) {
        tracing::info!(document = %target, "notification recorded");
        self.sent.lock().await.push((target.clone(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_answers_then_default() {
        let confirm = ScriptedConfirm::new([false]);
        assert!(!confirm.confirm("first?"));
        assert!(confirm.confirm("second?"));
        assert_eq!(confirm.prompts(), vec!["first?".to_string(), "second?".to_string()]);
    }

    #[tokio::test]
    async fn notifications_are_recorded() {
        let notifier = RecordingNotifier::new();
        notifier.notify(&DocumentId::new("User talk:Ferris"), "hello").await;
        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.as_str(), "User talk:Ferris");
    }
}
