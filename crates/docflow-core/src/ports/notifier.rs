//! Notifier port - 関係者への通知（fire-and-forget）
//!
//! 通知の失敗は action の成否に影響しません。実装側でログに残すだけにします。

use async_trait::async_trait;

use crate::domain::DocumentId;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, target: &DocumentId, message: &str);
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, target: &DocumentId, _message: &str) {
        tracing::debug!(document = %target, "notification dropped");
    }
}
