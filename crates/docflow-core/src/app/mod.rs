//! App - アプリケーション層
//!
//! ports と policy を組み合わせて、action を実行できる `App` を作ります。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: ports の差し込み、policy の登録、起動時検証
//! - **App**: kind を指定して action を実行する

pub mod builder;

pub use self::builder::{App, AppBuilder, BuildError};
