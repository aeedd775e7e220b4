//! PolicyRegistry - action kind ごとの policy の登録と管理
//!
//! 起動時に一度だけ組み立て、以降は読み取り専用で共有します。

use std::collections::HashMap;
use std::sync::Arc;

use super::policy::ActionPolicy;

#[derive(Default)]
pub struct PolicyRegistry {
    policies: HashMap<&'static str, Arc<dyn ActionPolicy>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a policy for action kind '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, policy: impl ActionPolicy + 'static) -> Result<(), RegistryError> {
        let kind = policy.kind();
        if self.policies.contains_key(kind) {
            return Err(RegistryError::AlreadyRegistered(kind.to_string()));
        }
        self.policies.insert(kind, Arc::new(policy));
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn ActionPolicy>> {
        self.policies.get(kind).cloned()
    }

    /// 登録済みの kind（ソート済み）
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.policies.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}
