//! Ports - 抽象化レイヤー
//!
//! 外部システム（文書ストア、ユーザー確認、通知）へのインターフェースです。
//! core はこれらの trait だけに依存し、テストでは `impls` のモックを差し込みます。

pub mod clock;
pub mod confirm;
pub mod document_store;
pub mod id_generator;
pub mod notifier;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::confirm::Confirm;
pub use self::document_store::{CreateOption, DocumentStore, SaveOptions, StoreError};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notifier::{NoopNotifier, Notifier};
