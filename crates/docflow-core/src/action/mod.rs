//! Action - action kind ごとの policy と、それを実行する汎用 driver
//!
//! # 主要コンポーネント
//! - **ActionPolicy**: task 一覧（名前・依存・step）を返すだけの宣言
//! - **ActionDriver**: policy から TaskGraph を組み立てて実行する
//! - **PolicyRegistry**: kind → policy の対応表
//! - **DiscussionPolicy** (`rfd`) / **QuickDeletionPolicy** (`qd`)

pub mod discussion;
pub mod driver;
pub mod policy;
pub mod quick;
pub mod registry;
pub mod steps;

pub use self::discussion::DiscussionPolicy;
pub use self::driver::{ActionDriver, DriverError};
pub use self::policy::{ActionPolicy, Step, StepContext, StepOutput, TaskSpec};
pub use self::quick::QuickDeletionPolicy;
pub use self::registry::{PolicyRegistry, RegistryError};
