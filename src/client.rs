//! The client services use to check and grant access.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::AuthzConfig;
use crate::context::Context;
use crate::engine;
use crate::error::{AuthzError, PolicyError, StoreError};
use crate::metrics::{EvaluationStats, GroupStats, MetricsSink, NoOpSink, ReloadStats};
use crate::model::PolicyModel;
use crate::store::{FilePolicyStore, PolicyStore};
use crate::types::{Decision, GroupEdge, SubjectPermissions, is_identifier};

/// Checks calls against the loaded policy and records group membership.
///
/// Cloning is cheap; clones share the model, the store and the write gate.
#[derive(Clone)]
pub struct AccessClient {
    model: PolicyModel,
    store: Arc<dyn PolicyStore>,
    // Serializes store writes and reloads so the store and the model apply
    // them in the same order.
    write_gate: Arc<Mutex<()>>,
    metrics: Arc<dyn MetricsSink>,
    write_timeout: Option<Duration>,
}

impl std::fmt::Debug for AccessClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessClient")
            .field("model", &self.model)
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}

impl AccessClient {
    /// Load every row from `store` and build the model.
    pub async fn connect(store: Arc<dyn PolicyStore>) -> Result<Self, AuthzError> {
        let rows = store.load().await.map_err(|e| {
            warn!(event = "Load", phase = "Failed", error = %e);
            AuthzError::PolicyLoad(e)
        })?;
        info!(
            event = "Load",
            phase = "Loaded",
            rules = rows.rules.len(),
            groups = rows.groups.len()
        );

        Ok(AccessClient {
            model: PolicyModel::new(rows),
            store,
            write_gate: Arc::new(Mutex::new(())),
            metrics: Arc::new(NoOpSink),
            write_timeout: None,
        })
    }

    /// Connect to the file store named by `config`, applying its write timeout.
    pub async fn from_config(config: &AuthzConfig) -> Result<Self, AuthzError> {
        let store = Arc::new(FilePolicyStore::new(&config.policy_path));
        let client = Self::connect(store).await?;
        Ok(client.with_write_timeout(config.write_timeout()))
    }

    pub fn with_metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = sink;
        self
    }

    /// Bound writes and reloads whose context carries no deadline.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    pub fn model(&self) -> &PolicyModel {
        &self.model
    }

    /// Check whether the caller in `ctx` may perform `action` of `service` on
    /// `resource`. An empty `resource` or `-` denotes a collection-scope call.
    ///
    /// Never blocks on writers and never awaits.
    pub fn check_access(
        &self,
        ctx: &Context,
        service: &str,
        resource: &str,
        action: &str,
    ) -> Result<(), AuthzError> {
        let start = Instant::now();
        let subject = ctx.subject();
        let snapshot = self.model.current_snapshot();
        let allowed = engine::enforce(&snapshot, subject, service, resource, action);

        self.metrics.on_evaluation(&EvaluationStats {
            duration: start.elapsed(),
            allowed,
            subject,
            service,
            action,
        });

        if allowed {
            return Ok(());
        }

        warn!(
            event = "Access",
            phase = "Denied",
            subject,
            service,
            resource,
            action
        );
        Err(AuthzError::AccessDenied {
            subject: subject.to_string(),
            service: service.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
        })
    }

    /// Like [`check_access`](Self::check_access), but returns the full decision.
    pub fn evaluate(&self, ctx: &Context, service: &str, resource: &str, action: &str) -> Decision {
        let snapshot = self.model.current_snapshot();
        engine::evaluate(&snapshot, ctx.subject(), service, resource, action)
    }

    /// Make `subject` a member of `group`, persisting the edge before it
    /// becomes visible to checks. Adding an existing edge succeeds without a
    /// store write.
    ///
    /// A write that fails on cancellation or deadline may already be durable
    /// in the store while the model does not show it yet. Retrying is safe:
    /// a repeated row collapses on the next load.
    pub async fn add_to_group(
        &self,
        ctx: &Context,
        subject: &str,
        group: &str,
    ) -> Result<(), AuthzError> {
        let write_error = |source: StoreError| AuthzError::StoreWrite {
            member: subject.to_string(),
            group: group.to_string(),
            source,
        };

        if !is_identifier(subject) || !is_identifier(group) {
            return Err(write_error(StoreError::Policy(PolicyError::InvalidFormat(
                format!("group membership needs two identifiers, got '{subject}' -> '{group}'"),
            ))));
        }

        if self.model.current_snapshot().has_group_edge(subject, group) {
            debug!(event = "GroupEdge", phase = "Present", member = subject, group);
            return Ok(());
        }

        let start = Instant::now();
        let ctx = self.bounded(ctx);
        let _gate = ctx.run(self.write_gate.lock()).await.map_err(write_error)?;

        // Another writer may have added the edge while we waited.
        if self.model.current_snapshot().has_group_edge(subject, group) {
            debug!(event = "GroupEdge", phase = "Present", member = subject, group);
            return Ok(());
        }

        let edge = GroupEdge::new(subject, group);
        ctx.run(self.store.append_group(&edge))
            .await
            .and_then(|written| written)
            .map_err(|e| {
                warn!(event = "GroupEdge", phase = "StoreFailed", member = subject, group, error = %e);
                write_error(e)
            })?;

        self.model.add_group_edge(subject, group);
        self.metrics.on_group_added(&GroupStats {
            member: subject.to_string(),
            group: group.to_string(),
            duration: start.elapsed(),
        });
        Ok(())
    }

    /// Re-read the store and swap in a fresh snapshot, returning its
    /// generation. On failure the current snapshot stays active.
    pub async fn reload(&self, ctx: &Context) -> Result<u64, AuthzError> {
        let ctx = self.bounded(ctx);
        let _gate = ctx
            .run(self.write_gate.lock())
            .await
            .map_err(AuthzError::PolicyLoad)?;

        let rows = ctx
            .run(self.store.load())
            .await
            .and_then(|loaded| loaded)
            .map_err(|e| {
                warn!(event = "Reload", phase = "Failed", error = %e);
                AuthzError::PolicyLoad(e)
            })?;

        let generation = self.model.replace(rows);
        self.metrics.on_reload(&ReloadStats {
            reload_time: SystemTime::now(),
            generation,
        });
        Ok(generation)
    }

    /// The groups and rules the caller in `ctx` reaches.
    pub fn permissions(&self, ctx: &Context) -> SubjectPermissions {
        let snapshot = self.model.current_snapshot();
        let subject = ctx.subject();
        let closure = snapshot.groups_of(subject);

        let rules = snapshot
            .rules()
            .filter(|rule| closure.contains(&rule.subject))
            .cloned()
            .collect();
        let groups = closure.into_iter().filter(|g| g != subject).collect();

        SubjectPermissions::new(subject, groups, rules)
    }

    fn bounded(&self, ctx: &Context) -> Context {
        match (ctx.deadline(), self.write_timeout) {
            (None, Some(timeout)) => ctx.clone().with_timeout(timeout),
            _ => ctx.clone(),
        }
    }
}
