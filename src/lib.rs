// src/lib.rs
pub use client::AccessClient;
pub use config::AuthzConfig;
pub use context::{ANONYMOUS, AUTHENTICATED, Context, UNAUTHENTICATED};
pub use engine::{enforce, evaluate};
pub use error::{AuthzError, ConfigError, ErrorKind, PolicyError, StoreError, StoreResult};
pub use loader::{parse_policy, render_group_edge, render_policy};
pub use middleware::{AuthorizationMiddleware, Operation, Scope};
pub use model::{PolicyModel, PolicySnapshot};
pub use store::{FilePolicyStore, MemoryPolicyStore, PolicyStore};
pub use types::{
    COLLECTION, Decision, GroupEdge, PolicyRows, ResourcePattern, Rule, SubjectPermissions,
    WILDCARD,
};

pub mod config;
pub mod contents;
pub mod metrics;
pub mod middleware;
pub mod reactions;
pub mod store;
pub mod types;

mod client;
mod context;
mod engine;
mod error;
mod loader;
mod model;
