//! In-memory policy state.
//!
//! [`PolicySnapshot`] is an immutable view of the rules and the group graph.
//! [`PolicyModel`] is the shared handle: readers take an `Arc` to the current
//! snapshot and evaluate without holding any lock, writers replace the
//! snapshot under a short write lock. A reader therefore sees either the
//! state before a write or the state after it.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::PolicyError;
use crate::loader;
use crate::types::{GroupEdge, PolicyRows, Rule};

/// Rules indexed by service, then action.
type RuleIndex = HashMap<String, HashMap<String, Vec<Rule>>>;

#[derive(Debug, Clone, Default)]
pub struct PolicySnapshot {
    // Rules only change on reload; sharing them keeps group writes cheap.
    rules: Arc<RuleIndex>,
    /// member -> groups it directly belongs to
    groups: HashMap<String, BTreeSet<String>>,
    generation: u64,
}

impl PolicySnapshot {
    pub fn from_rows(rows: PolicyRows) -> Self {
        let mut rules = RuleIndex::new();
        for rule in rows.rules {
            let by_action = rules.entry(rule.service.clone()).or_default();
            let bucket = by_action.entry(rule.action.clone()).or_default();
            if !bucket.contains(&rule) {
                bucket.push(rule);
            }
        }

        let mut groups: HashMap<String, BTreeSet<String>> = HashMap::new();
        for edge in rows.groups {
            groups.entry(edge.member).or_default().insert(edge.group);
        }

        PolicySnapshot {
            rules: Arc::new(rules),
            groups,
            generation: 0,
        }
    }

    /// Reflexive-transitive closure of group membership starting at `subject`.
    ///
    /// The edge graph may contain cycles; every node is expanded at most once.
    pub fn groups_of(&self, subject: &str) -> HashSet<String> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(subject.to_string());
        queue.push_back(subject);

        while let Some(node) = queue.pop_front() {
            let Some(parents) = self.groups.get(node) else {
                continue;
            };
            for parent in parents {
                if visited.insert(parent.clone()) {
                    queue.push_back(parent.as_str());
                }
            }
        }

        visited
    }

    /// All rules granting `action` of `service`, whatever their subject or resource.
    pub fn rules_for(&self, service: &str, action: &str) -> &[Rule] {
        self.rules
            .get(service)
            .and_then(|by_action| by_action.get(action))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All rules in the snapshot, in no particular order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values().flat_map(|by_action| by_action.values().flatten())
    }

    /// All group edges, sorted by member then group.
    pub fn group_edges(&self) -> Vec<GroupEdge> {
        let mut edges: Vec<GroupEdge> = self
            .groups
            .iter()
            .flat_map(|(member, groups)| groups.iter().map(move |g| GroupEdge::new(member, g)))
            .collect();
        edges.sort();
        edges
    }

    pub fn has_group_edge(&self, member: &str, group: &str) -> bool {
        self.groups
            .get(member)
            .is_some_and(|groups| groups.contains(group))
    }

    pub fn rule_count(&self) -> usize {
        self.rules
            .values()
            .flat_map(|by_action| by_action.values())
            .map(Vec::len)
            .sum()
    }

    pub fn edge_count(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }

    /// Incremented by every write applied through [`PolicyModel`].
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The shared model handle. Cloneable and thread-safe.
#[derive(Debug, Clone, Default)]
pub struct PolicyModel {
    inner: Arc<RwLock<Arc<PolicySnapshot>>>,
}

impl PolicyModel {
    pub fn new(rows: PolicyRows) -> Self {
        PolicyModel {
            inner: Arc::new(RwLock::new(Arc::new(PolicySnapshot::from_rows(rows)))),
        }
    }

    pub fn new_from_str(policy_text: &str) -> Result<Self, PolicyError> {
        Ok(Self::new(loader::parse_policy(policy_text)?))
    }

    /// The current snapshot. Later writes do not affect the returned value.
    pub fn current_snapshot(&self) -> Arc<PolicySnapshot> {
        // Snapshots are replaced whole, so a poisoned lock still holds a
        // complete value.
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn groups_of(&self, subject: &str) -> HashSet<String> {
        self.current_snapshot().groups_of(subject)
    }

    pub fn rules_for(&self, service: &str, action: &str) -> Vec<Rule> {
        self.current_snapshot().rules_for(service, action).to_vec()
    }

    /// Insert `member -> group`. Returns `false` when the edge already existed,
    /// in which case nothing changes.
    pub fn add_group_edge(&self, member: &str, group: &str) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.has_group_edge(member, group) {
            debug!(event = "GroupEdge", phase = "Skip", member, group);
            return false;
        }

        // Clones the snapshot only if a reader still holds it.
        let next = Arc::make_mut(&mut guard);
        next.groups
            .entry(member.to_string())
            .or_default()
            .insert(group.to_string());
        next.generation += 1;

        info!(
            event = "GroupEdge",
            phase = "Added",
            member,
            group,
            generation = next.generation
        );
        true
    }

    /// Swap in a snapshot built from `rows`, returning its generation.
    pub fn replace(&self, rows: PolicyRows) -> u64 {
        let mut fresh = PolicySnapshot::from_rows(rows);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        fresh.generation = guard.generation + 1;
        let generation = fresh.generation;
        *guard = Arc::new(fresh);

        info!(
            event = "Reload",
            phase = "Swapped",
            generation,
            rules = guard.rule_count(),
            edges = guard.edge_count()
        );
        generation
    }

    /// Parse `policy_text` and swap it in. On a parse error the current
    /// snapshot stays active.
    pub fn reload_from_str(&self, policy_text: &str) -> Result<u64, PolicyError> {
        let rows = loader::parse_policy(policy_text)?;
        Ok(self.replace(rows))
    }
}
