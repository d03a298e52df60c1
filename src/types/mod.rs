//! Data model types for rules, group edges and decisions.
//!
//! Canonical row forms:
//! - Rule: `p, <subject-or-group>, <service>, <resource>, <action>`
//! - Group edge: `g, <member>, <group>`
//!
//! A rule's resource is `-` (collection scope), `*` (any concrete id) or an
//! exact identifier.

mod decision;
mod permissions;
mod rule;

pub use decision::Decision;
pub use permissions::SubjectPermissions;
pub use rule::{COLLECTION, GroupEdge, PolicyRows, ResourcePattern, Rule, WILDCARD};
pub(crate) use rule::is_identifier;
