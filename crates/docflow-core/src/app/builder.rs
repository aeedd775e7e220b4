//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 登録が終わったら registry は読み取り専用

use std::sync::Arc;

use crate::action::{ActionDriver, ActionPolicy, DiscussionPolicy, DriverError, PolicyRegistry, QuickDeletionPolicy, RegistryError};
use crate::config::DocflowConfig;
use crate::domain::{ActionParams, ActionReport, DefaultDecider};
use crate::ports::{Clock, Confirm, DocumentStore, IdGenerator, NoopNotifier, Notifier, SystemClock, UlidGenerator};
use crate::session::MutationSession;

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(store, confirm)
///     .with_config(config)
///     .register_builtin()?
///     .expect_actions(&["rfd", "qd"])
///     .build()?;
/// let report = app.run("rfd", params).await?;
/// ```
///
/// # Fail-fast 設計
/// - expect_actions() で期待される action kind を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
pub struct AppBuilder {
    store: Arc<dyn DocumentStore>,
    confirm: Arc<dyn Confirm>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    config: DocflowConfig,
    registry: PolicyRegistry,
    expected_actions: Option<Vec<String>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing action kinds: {0:?}. These actions were expected but not registered.")]
    MissingActionKinds(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl AppBuilder {
    /// store と confirm 以外は既定値（通知なし・システム時計・ULID）
    pub fn new(store: Arc<dyn DocumentStore>, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            store,
            confirm,
            notifier: Arc::new(NoopNotifier),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UlidGenerator::new(SystemClock)),
            config: DocflowConfig::default(),
            registry: PolicyRegistry::new(),
            expected_actions: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// policy は登録時の config で作られるので、register より前に呼ぶ
    pub fn with_config(mut self, config: DocflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Policy を登録
    pub fn register(mut self, policy: impl ActionPolicy + 'static) -> Result<Self, RegistryError> {
        self.registry.register(policy)?;
        Ok(self)
    }

    /// 組み込みの `rfd` と `qd` を登録
    pub fn register_builtin(self) -> Result<Self, BuildError> {
        let discussion = DiscussionPolicy::new(&self.config)?;
        let quick = QuickDeletionPolicy::new(&self.config)?;
        Ok(self.register(discussion)?.register(quick)?)
    }

    /// 期待される action kind のリストを設定
    pub fn expect_actions(mut self, kinds: &[&str]) -> Self {
        self.expected_actions = Some(kinds.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected) = &self.expected_actions {
            let registered = self.registry.kinds();
            let missing: Vec<String> = expected
                .iter()
                .filter(|kind| !registered.contains(&kind.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingActionKinds(missing));
            }
        }

        let decider = Arc::new(DefaultDecider::new(self.config.execution.retry_policy()));
        let session = MutationSession::new(self.store, self.confirm, decider, self.ids.clone());
        let driver = ActionDriver::new(session, self.notifier, self.clock, self.ids)
            .with_concurrency_limit(self.config.execution.max_concurrent_tasks);

        tracing::debug!(actions = ?self.registry.kinds(), "app built");
        Ok(App {
            registry: self.registry,
            driver,
        })
    }
}

/// App はアプリケーションのランタイム
pub struct App {
    registry: PolicyRegistry,
    driver: ActionDriver,
}

impl App {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.registry.kinds()
    }

    /// `kind` の action を一回実行する
    pub async fn run(&self, kind: &str, params: ActionParams) -> Result<ActionReport, DriverError> {
        let policy = self
            .registry
            .get(kind)
            .ok_or_else(|| DriverError::UnknownAction(kind.to_string()))?;
        self.driver.run(policy.as_ref(), params).await
    }
}
