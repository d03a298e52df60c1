//! Authorization decision types with the permitting rule.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Rule;

/// Allow or deny decision, including the snapshot generation it was made against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum Decision {
    Allow { rule: Rule, generation: u64 },
    Deny { generation: u64 },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }

    /// The rule that permitted the request, if any.
    pub fn rule(&self) -> Option<&Rule> {
        match self {
            Decision::Allow { rule, .. } => Some(rule),
            Decision::Deny { .. } => None,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Decision::Allow { generation, .. } | Decision::Deny { generation } => *generation,
        }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Decision::Allow { rule, generation } => {
                write!(f, "Allow(generation={generation}; {rule})")
            }
            Decision::Deny { generation } => write!(f, "Deny(generation={generation})"),
        }
    }
}
