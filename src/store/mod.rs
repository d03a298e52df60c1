//! Persistence seam for policy rows.
//!
//! The core only needs two things from a store: every row at startup (and on
//! reload), and a way to append a group row. Any encoding will do.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{GroupEdge, PolicyRows};

mod file;
mod memory;

pub use file::FilePolicyStore;
pub use memory::MemoryPolicyStore;

#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Load every rule and group row.
    async fn load(&self) -> StoreResult<PolicyRows>;

    /// Persist `edge`. Appending an edge the store already holds must not fail.
    async fn append_group(&self, edge: &GroupEdge) -> StoreResult<()>;
}
