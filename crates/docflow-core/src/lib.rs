//! docflow-core
//!
//! Multi-step document maintenance actions on a shared wiki-like store.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（document, params, errors, decision, outcome, state, ids）
//! - **ports**: 抽象化レイヤー（DocumentStore, Confirm, Notifier, Clock, IdGenerator）
//! - **graph**: 依存関係つき task の並行実行（TaskGraph）
//! - **conflict**: 既存マーカーの検出と解決（ConflictDetector, catalog）
//! - **session**: 1 文書の load → check → apply → save（MutationSession）
//! - **action**: action kind ごとの policy と汎用 driver
//! - **app**: 構築とワイヤリング（AppBuilder, App）
//! - **config**: TOML 設定
//! - **impls**: 実装（InMemoryDocumentStore など開発・テスト用）

pub mod action;
pub mod app;
pub mod config;
pub mod conflict;
pub mod domain;
pub mod graph;
pub mod impls;
pub mod ports;
pub mod session;
