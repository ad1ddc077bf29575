//! Condition tree: ordered OR-groups joined by AND
//!
//! The tree is stored as a sequence of groups, each holding its conditions in
//! order; the root of a group is always its first condition. Every mutation
//! builds a complete replacement of the group list and bumps `revision`, so a
//! `GroupedView` taken earlier is never modified underneath its holder.

use crate::core::condition::Condition;
use crate::core::types::{ConditionId, GroupJoin};
use std::sync::Arc;
use tracing::debug;

/// One OR-group: a root condition followed by its OR-siblings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionGroup {
    conditions: Vec<Condition>,
}

impl ConditionGroup {
    fn new(root: Condition) -> Self {
        Self { conditions: vec![root] }
    }

    /// Identifier of the group root, used as the group's key
    pub fn id(&self) -> ConditionId {
        self.conditions[0].id
    }

    pub fn root(&self) -> &Condition {
        &self.conditions[0]
    }

    /// All conditions of the group, root first
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Conditions after the root
    pub fn siblings(&self) -> &[Condition] {
        &self.conditions[1..]
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Read-only snapshot of the tree, partitioned into groups
#[derive(Debug, Clone, Default)]
pub struct GroupedView {
    groups: Arc<Vec<ConditionGroup>>,
    revision: u64,
}

impl GroupedView {
    /// Build a view directly from groups of conditions (roots are normalised)
    pub fn from_groups(groups: Vec<Vec<Condition>>) -> Self {
        let groups = groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .map(|conditions| ConditionGroup { conditions })
            .collect();
        Self {
            groups: Arc::new(normalize(groups)),
            revision: 0,
        }
    }

    pub fn groups(&self) -> &[ConditionGroup] {
        &self.groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConditionGroup> {
        self.groups.iter()
    }

    /// Members of the group keyed by `root_id`
    pub fn get(&self, root_id: &ConditionId) -> Option<&[Condition]> {
        self.groups
            .iter()
            .find(|g| g.id() == *root_id)
            .map(|g| g.conditions())
    }

    /// Group keys in order
    pub fn root_ids(&self) -> Vec<ConditionId> {
        self.groups.iter().map(ConditionGroup::id).collect()
    }

    /// Concatenation of all groups in order
    pub fn flatten(&self) -> Vec<Condition> {
        self.groups
            .iter()
            .flat_map(|g| g.conditions.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Revision of the tree this view was taken from
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Condition Tree Manager
#[derive(Debug, Clone, Default)]
pub struct ConditionTree {
    groups: Arc<Vec<ConditionGroup>>,
    revision: u64,
}

impl ConditionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tree from a flat list, starting a new group at every root flag
    ///
    /// A leading run of non-root conditions forms the first group.
    pub fn from_flat(conditions: Vec<Condition>) -> Self {
        let mut groups: Vec<ConditionGroup> = Vec::new();
        for condition in conditions {
            if condition.is_group_root || groups.is_empty() {
                groups.push(ConditionGroup::new(condition));
            } else if let Some(group) = groups.last_mut() {
                group.conditions.push(condition);
            }
        }
        let mut tree = Self::new();
        tree.commit(groups);
        tree
    }

    /// Replace the whole tree with a single inert condition over `columns[0]`
    ///
    /// An empty column set leaves the tree empty.
    pub fn seed(&mut self, columns: &[String]) {
        let groups = match columns.first() {
            Some(first) => vec![ConditionGroup::new(Condition::seed(first.clone()))],
            None => Vec::new(),
        };
        self.commit(groups);
        debug!(columns = columns.len(), "seeded condition tree");
    }

    /// Insert a new condition immediately after `after` in list order
    ///
    /// With `as_group_root` the new condition opens a group; if the anchor has
    /// followers in its group they move into the new group, exactly as a flat
    /// insertion would regroup them. A missing anchor appends at the end.
    pub fn add(
        &mut self,
        after: Option<&ConditionId>,
        join: GroupJoin,
        as_group_root: bool,
        field: &str,
    ) -> ConditionId {
        let condition = Condition::new(field, as_group_root, join);
        let id = condition.id;
        let mut groups: Vec<ConditionGroup> = self.groups.as_ref().clone();

        match after.and_then(|anchor| self.locate(anchor)) {
            Some((g, i)) if as_group_root => {
                let tail = groups[g].conditions.split_off(i + 1);
                let mut group = ConditionGroup::new(condition);
                group.conditions.extend(tail);
                groups.insert(g + 1, group);
            }
            Some((g, i)) => groups[g].conditions.insert(i + 1, condition),
            None => {
                if as_group_root || groups.is_empty() {
                    groups.push(ConditionGroup::new(condition));
                } else if let Some(last) = groups.last_mut() {
                    last.conditions.push(condition);
                }
            }
        }

        self.commit(groups);
        debug!(%id, as_group_root, "added condition");
        id
    }

    /// Append a new AND group after the last condition
    pub fn add_and_group(&mut self, field: &str) -> ConditionId {
        let last = self.last_id();
        self.add(last.as_ref(), GroupJoin::And, true, field)
    }

    /// Insert a new OR sibling right after `anchor` inside its group
    pub fn add_or_sibling(&mut self, anchor: &ConditionId, field: &str) -> ConditionId {
        self.add(Some(anchor), GroupJoin::Or, false, field)
    }

    /// Replace the record stored at `id`, keeping its identity and position
    ///
    /// Returns `false` and changes nothing when `id` is unknown.
    pub fn update(&mut self, id: &ConditionId, updated: Condition) -> bool {
        let Some((g, i)) = self.locate(id) else {
            return false;
        };
        let mut groups: Vec<ConditionGroup> = self.groups.as_ref().clone();
        groups[g].conditions[i] = Condition { id: *id, ..updated };
        self.commit(groups);
        true
    }

    /// Apply `edit` to a copy of the condition at `id` and store the result
    pub fn update_with<F>(&mut self, id: &ConditionId, edit: F) -> bool
    where
        F: FnOnce(&mut Condition),
    {
        let Some(mut condition) = self.find(id).cloned() else {
            return false;
        };
        edit(&mut condition);
        self.update(id, condition)
    }

    /// Remove the condition at `id`
    ///
    /// Removing a group root promotes the next member of the group; removing
    /// the only member drops the group. The last remaining condition of the
    /// tree cannot be removed.
    pub fn delete(&mut self, id: &ConditionId) -> bool {
        let Some((g, i)) = self.locate(id) else {
            return false;
        };
        if self.len() <= 1 {
            debug!(%id, "refusing to delete the only condition");
            return false;
        }
        let mut groups: Vec<ConditionGroup> = self.groups.as_ref().clone();
        groups[g].conditions.remove(i);
        if groups[g].conditions.is_empty() {
            groups.remove(g);
        }
        self.commit(groups);
        debug!(%id, "deleted condition");
        true
    }

    /// Whether `delete` would currently be allowed
    pub fn can_delete(&self) -> bool {
        self.len() > 1
    }

    /// Snapshot of the current groups
    pub fn grouped_view(&self) -> GroupedView {
        GroupedView {
            groups: Arc::clone(&self.groups),
            revision: self.revision,
        }
    }

    /// Ordered flat list of conditions
    pub fn flatten(&self) -> Vec<Condition> {
        self.grouped_view().flatten()
    }

    pub fn find(&self, id: &ConditionId) -> Option<&Condition> {
        self.locate(id).map(|(g, i)| &self.groups[g].conditions[i])
    }

    /// (group index, index within group) of `id`
    pub fn locate(&self, id: &ConditionId) -> Option<(usize, usize)> {
        self.groups.iter().enumerate().find_map(|(g, group)| {
            group
                .conditions
                .iter()
                .position(|c| c.id == *id)
                .map(|i| (g, i))
        })
    }

    pub fn last_id(&self) -> Option<ConditionId> {
        self.groups
            .last()
            .and_then(|g| g.conditions.last())
            .map(|c| c.id)
    }

    /// Total number of conditions
    pub fn len(&self) -> usize {
        self.groups.iter().map(ConditionGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn clear(&mut self) {
        self.commit(Vec::new());
    }

    fn commit(&mut self, groups: Vec<ConditionGroup>) {
        self.groups = Arc::new(normalize(groups));
        self.revision += 1;
    }
}

/// Drop empty groups and rewrite root flags and joins from position
fn normalize(groups: Vec<ConditionGroup>) -> Vec<ConditionGroup> {
    groups
        .into_iter()
        .filter(|g| !g.conditions.is_empty())
        .enumerate()
        .map(|(gi, mut group)| {
            for (ci, condition) in group.conditions.iter_mut().enumerate() {
                condition.is_group_root = ci == 0;
                condition.group_join = if ci == 0 && gi > 0 {
                    GroupJoin::And
                } else {
                    GroupJoin::Or
                };
            }
            group
        })
        .collect()
}
