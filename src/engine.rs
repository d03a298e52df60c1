//! The decision function.
//!
//! Rules only ever permit, and any single matching rule is enough. A
//! `(service, action)` pair without rules denies every subject.

use tracing::{debug, info};

use crate::model::PolicySnapshot;
use crate::types::Decision;

/// Decide whether `subject` may perform `action` of `service` on `resource`.
///
/// An empty `resource` denotes a collection-scope call and only matches rules
/// with the `-` pattern. A concrete resource matches `*` and its exact id.
pub fn evaluate(
    snapshot: &PolicySnapshot,
    subject: &str,
    service: &str,
    resource: &str,
    action: &str,
) -> Decision {
    let generation = snapshot.generation();

    debug!(
        event = "Request",
        phase = "Evaluation",
        subject,
        service,
        resource,
        action,
        generation
    );

    let rules = snapshot.rules_for(service, action);
    if rules.is_empty() {
        debug!(event = "Request", phase = "NoRules", service, action);
        return Decision::Deny { generation };
    }

    let candidates = snapshot.groups_of(subject);
    debug!(event = "Request", phase = "Candidates", candidates = ?candidates);

    let matched = rules
        .iter()
        .find(|rule| candidates.contains(&rule.subject) && rule.resource.matches(resource));

    match matched {
        Some(rule) => {
            info!(event = "Request", phase = "Policy", rule = %rule);
            Decision::Allow {
                rule: rule.clone(),
                generation,
            }
        }
        None => {
            debug!(event = "Request", phase = "Result", result = "Deny");
            Decision::Deny { generation }
        }
    }
}

/// [`evaluate`] reduced to permit/deny.
pub fn enforce(
    snapshot: &PolicySnapshot,
    subject: &str,
    service: &str,
    resource: &str,
    action: &str,
) -> bool {
    evaluate(snapshot, subject, service, resource, action).is_allow()
}

#[cfg(test)]
mod tests;
