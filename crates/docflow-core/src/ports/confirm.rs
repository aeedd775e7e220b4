//! Confirm port - ユーザーへの確認（同期）
//!
//! 実装はブロックしてよい（stdin を読むなど）。呼び出し側の session は
//! blocking pool 上で呼ぶので、同じ graph の他の task は止まりません。

/// Synchronous yes/no decision from the user.
///
/// `true` means proceed, `false` means abort.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
