//! State - graph 内の task の状態
//!
//! # 状態遷移
//! - pending: 依存待ち（または起動待ち）
//! - running: 実行中
//! - succeeded: 成功（結果は graph が保持）
//! - failed: 失敗（最初の失敗が graph 全体の結果になる）
//! - cancelled: 起動されないまま打ち切り
//! - discarded: 実行中に他の task が失敗し、結果を捨てた

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    Discarded,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Pending | TaskState::Running)
    }
}
