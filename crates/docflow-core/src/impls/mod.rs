//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryDocumentStore**: 版管理付きの文書ストア（割り込み編集・保存拒否・遅延を仕込める）
//! - **ScriptedConfirm**: 台本どおりに答える確認
//! - **RecordingNotifier**: 通知を記録するだけの Notifier
//!
//! # 本番用実装
//! 実際の wiki API クライアントは別クレートに置く想定です。

pub mod inmem_store;
pub mod scripted;

pub use self::inmem_store::{InMemoryDocumentStore, SavedEdit, StoreCall, StoredDocument};
pub use self::scripted::{RecordingNotifier, ScriptedConfirm};
