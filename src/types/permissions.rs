//! Effective permissions of a subject.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Rule;

/// The rules a subject reaches, directly or through its groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubjectPermissions {
    subject: String,
    groups: Vec<String>,
    rules: Vec<Rule>,
}

impl SubjectPermissions {
    pub fn new(subject: &str, groups: Vec<String>, rules: Vec<Rule>) -> Self {
        SubjectPermissions {
            subject: subject.to_string(),
            groups: groups.into_iter().sorted().dedup().collect(),
            rules: rules.into_iter().sorted().dedup().collect(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Groups the subject belongs to transitively, itself excluded.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Distinct `service#action` names, sorted.
    pub fn actions_by_name(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|r| format!("{}#{}", r.service, r.action))
            .sorted()
            .dedup()
            .collect()
    }

    /// True when at least one reachable rule grants `action` of `service`,
    /// whatever its resource pattern.
    pub fn grants(&self, service: &str, action: &str) -> bool {
        self.rules
            .iter()
            .any(|r| r.service == service && r.action == action)
    }
}
