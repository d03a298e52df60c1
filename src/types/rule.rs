//! Permission rules, group edges and the resource patterns rules target.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PolicyError;

/// Resource pattern matching only collection-scope calls (no resource id).
pub const COLLECTION: &str = "-";
/// Resource pattern matching any concrete resource id.
pub const WILDCARD: &str = "*";

/// The resource slot of a rule.
///
/// Only three shapes exist: `-` for collection-scope operations, `*` for any
/// concrete identifier, and an exact identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourcePattern {
    Collection,
    Any,
    Exact(String),
}

impl ResourcePattern {
    /// Test a requested resource against this pattern. An empty `resource`
    /// or the `-` sentinel means the call carries no resource identifier.
    pub fn matches(&self, resource: &str) -> bool {
        let collection = is_collection_request(resource);
        match self {
            ResourcePattern::Collection => collection,
            ResourcePattern::Any => !collection,
            ResourcePattern::Exact(id) => !collection && id == resource,
        }
    }
}

impl Display for ResourcePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ResourcePattern::Collection => f.write_str(COLLECTION),
            ResourcePattern::Any => f.write_str(WILDCARD),
            ResourcePattern::Exact(id) => f.write_str(id),
        }
    }
}

impl FromStr for ResourcePattern {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            COLLECTION => Ok(ResourcePattern::Collection),
            WILDCARD => Ok(ResourcePattern::Any),
            _ if is_identifier(s) && !s.contains('*') => Ok(ResourcePattern::Exact(s.to_string())),
            _ => Err(PolicyError::InvalidResourcePattern {
                line: 0,
                pattern: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ResourcePattern {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourcePattern> for String {
    fn from(value: ResourcePattern) -> Self {
        value.to_string()
    }
}

/// A permit grant: `subject` (a subject or a group) may perform `action` of
/// `service` on resources matching `resource`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct Rule {
    pub subject: String,
    pub service: String,
    #[schema(value_type = String, example = "*")]
    pub resource: ResourcePattern,
    pub action: String,
}

impl Rule {
    pub fn new(
        subject: impl Into<String>,
        service: impl Into<String>,
        resource: ResourcePattern,
        action: impl Into<String>,
    ) -> Self {
        Rule {
            subject: subject.into(),
            service: service.into(),
            resource,
            action: action.into(),
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "p, {}, {}, {}, {}",
            self.subject, self.service, self.resource, self.action
        )
    }
}

/// `member` is-a `group`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct GroupEdge {
    pub member: String,
    pub group: String,
}

impl GroupEdge {
    pub fn new(member: impl Into<String>, group: impl Into<String>) -> Self {
        GroupEdge {
            member: member.into(),
            group: group.into(),
        }
    }
}

impl Display for GroupEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "g, {}, {}", self.member, self.group)
    }
}

/// Raw rows as held by a policy store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PolicyRows {
    pub rules: Vec<Rule>,
    pub groups: Vec<GroupEdge>,
}

impl PolicyRows {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.groups.is_empty()
    }
}

/// True for a request without a resource identifier.
pub(crate) fn is_collection_request(resource: &str) -> bool {
    resource.is_empty() || resource == COLLECTION
}

/// Identifiers are non-empty and carry no whitespace or field separators.
pub(crate) fn is_identifier(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == ',')
}
