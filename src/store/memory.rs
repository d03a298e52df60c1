//! Non-durable store for tests and single-process deployments.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PolicyStore;
use crate::error::{PolicyError, StoreResult};
use crate::loader;
use crate::types::{GroupEdge, PolicyRows};

#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    rows: RwLock<PolicyRows>,
}

impl MemoryPolicyStore {
    pub fn new(rows: PolicyRows) -> Self {
        MemoryPolicyStore {
            rows: RwLock::new(rows),
        }
    }

    pub fn new_from_str(policy_text: &str) -> Result<Self, PolicyError> {
        Ok(Self::new(loader::parse_policy(policy_text)?))
    }

    /// Copy of the rows currently held.
    pub async fn rows(&self) -> PolicyRows {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn load(&self) -> StoreResult<PolicyRows> {
        Ok(self.rows.read().await.clone())
    }

    async fn append_group(&self, edge: &GroupEdge) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        if !rows.groups.contains(edge) {
            rows.groups.push(edge.clone());
        }
        Ok(())
    }
}
