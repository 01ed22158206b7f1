//! Edge storage.
//!
//! - [`ResourceEdge`]: a belongsTo side, one remote and one local value.
//! - [`CollectionEdge`]: a hasMany side, remote and local ordered membership plus the pending
//!   local diff (additions and removals not yet confirmed remotely).
//! - [`ImplicitEdge`]: the inverse of a field the schema never declared, membership only.
//!
//! Edges hold [Identifier]s, never the related nodes themselves.

use crate::{
    event::{EventOrigin, PayloadData, RelationshipPayload},
    properties::{Identifier, Links, Meta},
};
use std::{
    collections::BTreeSet,
    slice,
    sync::Arc,
};

use super::{definition::EdgeDefinition, state::EdgeState};

/// A membership set and an ordered sequence that always hold exactly the same identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMembers {
    members: BTreeSet<Identifier>,
    order: Vec<Identifier>,
}

impl FromIterator<Identifier> for OrderedMembers {
    /// Duplicates keep their first position.
    fn from_iter<I: IntoIterator<Item = Identifier>>(iter: I) -> Self {
        let mut out = OrderedMembers::default();
        for id in iter {
            out.insert(id, None);
        }
        out
    }
}

impl OrderedMembers {
    pub fn contains(&self, id: &Identifier) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Identifier> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[Identifier] {
        &self.order
    }

    pub fn members(&self) -> &BTreeSet<Identifier> {
        &self.members
    }

    pub fn position(&self, id: &Identifier) -> Option<usize> {
        if !self.contains(id) {
            return None;
        }
        self.order.iter().position(|member| member == id)
    }

    /// Insert at `index` (clamped to the end), or append. No-op if already present.
    pub(crate) fn insert(&mut self, id: Identifier, index: Option<usize>) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        let at = index.map_or(self.order.len(), |i| i.min(self.order.len()));
        self.order.insert(at, id.clone());
        self.members.insert(id);
        true
    }

    pub(crate) fn remove(&mut self, id: &Identifier) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|member| member != id);
        true
    }

    /// Replace `old` by `new` in place. If `new` is already a member, `old` is simply dropped.
    pub(crate) fn rekey(&mut self, old: &Identifier, new: &Identifier) -> bool {
        if !self.contains(old) {
            return false;
        }
        if self.contains(new) {
            return self.remove(old);
        }
        self.members.remove(old);
        self.members.insert(new.clone());
        for member in self.order.iter_mut().filter(|member| *member == old) {
            *member = new.clone();
        }
        true
    }

    pub(crate) fn clear(&mut self) {
        self.members.clear();
        self.order.clear();
    }

    /// True when both hold the same identifiers in the same order.
    pub fn same_order(&self, other: &[Identifier]) -> bool {
        self.order.as_slice() == other
    }
}

#[derive(Debug, Clone)]
pub struct ResourceEdge {
    pub(crate) definition: Arc<EdgeDefinition>,
    pub(crate) identifier: Identifier,
    pub(crate) state: EdgeState,
    pub(crate) local_state: Option<Identifier>,
    pub(crate) remote_state: Option<Identifier>,
    pub(crate) meta: Option<Meta>,
    pub(crate) links: Option<Links>,
    pub(crate) transaction_ref: u32,
}

impl ResourceEdge {
    pub fn new(definition: Arc<EdgeDefinition>, identifier: Identifier) -> Self {
        ResourceEdge {
            definition,
            identifier,
            state: EdgeState::default(),
            local_state: None,
            remote_state: None,
            meta: None,
            links: None,
            transaction_ref: 0,
        }
    }

    pub fn local_state(&self) -> Option<&Identifier> {
        self.local_state.as_ref()
    }

    pub fn remote_state(&self) -> Option<&Identifier> {
        self.remote_state.as_ref()
    }

    pub fn payload(&self) -> RelationshipPayload {
        RelationshipPayload {
            data: self
                .state
                .has_received_data()
                .then(|| PayloadData::One(self.local_state.clone())),
            links: self.links.clone(),
            meta: self.meta.clone(),
        }
    }

    fn absorb(&mut self, other: ResourceEdge) -> Vec<(Identifier, EventOrigin)> {
        let mut dropped = vec![];
        if let Some(lost) = keep_ours(&mut self.remote_state, other.remote_state) {
            dropped.push((lost, EventOrigin::Remote));
        }
        if let Some(lost) = keep_ours(&mut self.local_state, other.local_state) {
            dropped.push((lost, EventOrigin::Local));
        }
        if other.state.has_received_data() {
            self.state.receive();
        }
        self.meta = self.meta.take().or(other.meta);
        self.links = self.links.take().or(other.links);
        self.state.set_empty(self.local_state.is_none());
        dropped
    }
}

#[derive(Debug, Clone)]
pub struct CollectionEdge {
    pub(crate) definition: Arc<EdgeDefinition>,
    pub(crate) identifier: Identifier,
    pub(crate) state: EdgeState,
    pub(crate) remote: OrderedMembers,
    pub(crate) local: OrderedMembers,
    /// Local members the remote side has not confirmed, in insertion order.
    pub(crate) additions: OrderedMembers,
    /// Remote members removed locally and not yet confirmed as removed.
    pub(crate) removals: BTreeSet<Identifier>,
    pub(crate) meta: Option<Meta>,
    pub(crate) links: Option<Links>,
    pub(crate) transaction_ref: u32,
    /// Remote state changed since local state was last reconciled.
    pub(crate) is_dirty: bool,
}

impl CollectionEdge {
    pub fn new(definition: Arc<EdgeDefinition>, identifier: Identifier) -> Self {
        CollectionEdge {
            definition,
            identifier,
            state: EdgeState::default(),
            remote: OrderedMembers::default(),
            local: OrderedMembers::default(),
            additions: OrderedMembers::default(),
            removals: BTreeSet::new(),
            meta: None,
            links: None,
            transaction_ref: 0,
            is_dirty: false,
        }
    }

    pub fn local(&self) -> &OrderedMembers {
        &self.local
    }

    pub fn remote(&self) -> &OrderedMembers {
        &self.remote
    }

    pub fn additions(&self) -> &OrderedMembers {
        &self.additions
    }

    pub fn removals(&self) -> &BTreeSet<Identifier> {
        &self.removals
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn payload(&self) -> RelationshipPayload {
        RelationshipPayload {
            data: self
                .state
                .has_received_data()
                .then(|| PayloadData::Many(self.local.as_slice().to_vec())),
            links: self.links.clone(),
            meta: self.meta.clone(),
        }
    }

    pub(crate) fn add_local(&mut self, value: &Identifier, index: Option<usize>) -> bool {
        if !self.local.insert(value.clone(), index) {
            return false;
        }
        if self.remote.contains(value) {
            self.removals.remove(value);
        } else {
            self.additions.insert(value.clone(), None);
        }
        self.state.set_empty(false);
        true
    }

    pub(crate) fn remove_local(&mut self, value: &Identifier) -> bool {
        if !self.local.remove(value) {
            return false;
        }
        if self.remote.contains(value) {
            self.removals.insert(value.clone());
        } else {
            self.additions.remove(value);
        }
        self.state.set_empty(self.local.is_empty());
        true
    }

    /// A remote add counters any pending local addition of the same value.
    pub(crate) fn add_remote(&mut self, value: &Identifier, index: Option<usize>) -> bool {
        if !self.remote.insert(value.clone(), index) {
            return false;
        }
        self.additions.remove(value);
        self.state.set_empty(false);
        self.is_dirty = true;
        true
    }

    /// A remote removal counters any pending local removal of the same value.
    pub(crate) fn remove_remote(&mut self, value: &Identifier) -> bool {
        if !self.remote.remove(value) {
            return false;
        }
        self.removals.remove(value);
        self.state.set_empty(self.remote.is_empty());
        self.is_dirty = true;
        true
    }

    /// Replace remote membership wholesale. Returns `(added, removed, changed)` where `changed`
    /// also covers a pure reordering.
    pub(crate) fn replace_remote(
        &mut self,
        values: OrderedMembers,
    ) -> (Vec<Identifier>, Vec<Identifier>, bool) {
        let (added, removed) = diff(&self.remote, &values);
        let changed = !self.remote.same_order(values.as_slice());
        self.remote = values;
        let remote = &self.remote;
        self.additions = self
            .additions
            .iter()
            .filter(|id| !remote.contains(id))
            .cloned()
            .collect();
        self.removals.retain(|id| remote.contains(id));
        self.state.set_empty(self.remote.is_empty());
        if changed {
            self.is_dirty = true;
        }
        (added, removed, changed)
    }

    /// Replace local membership wholesale and recompute the pending diff against remote state.
    pub(crate) fn replace_local(
        &mut self,
        values: OrderedMembers,
    ) -> (Vec<Identifier>, Vec<Identifier>, bool) {
        let (added, removed) = diff(&self.local, &values);
        let changed = !self.local.same_order(values.as_slice());
        self.local = values;
        let remote = &self.remote;
        self.additions = self
            .local
            .iter()
            .filter(|id| !remote.contains(id))
            .cloned()
            .collect();
        let local = &self.local;
        self.removals = remote
            .iter()
            .filter(|id| !local.contains(id))
            .cloned()
            .collect();
        self.state.set_empty(self.local.is_empty());
        (added, removed, changed)
    }

    /// Rebuild local state from remote state: remote order minus pending removals, with pending
    /// additions put back at the index they held locally. Returns true if local state changed.
    pub(crate) fn sync_remote_to_local(&mut self) -> bool {
        let previous = self.local.as_slice().to_vec();
        let mut next: Vec<Identifier> = self
            .remote
            .iter()
            .filter(|id| !self.removals.contains(*id))
            .cloned()
            .collect();
        let mut pending: Vec<(usize, Identifier)> = self
            .additions
            .iter()
            .map(|id| (self.local.position(id).unwrap_or(usize::MAX), id.clone()))
            .collect();
        pending.sort_by_key(|(index, _)| *index);
        for (index, id) in pending {
            let at = index.min(next.len());
            next.insert(at, id);
        }
        self.local = next.into_iter().collect();
        self.is_dirty = false;
        self.state.set_empty(self.local.is_empty());
        !self.local.same_order(&previous)
    }

    fn absorb(&mut self, other: CollectionEdge) {
        for id in other.remote.iter() {
            if self.remote.insert(id.clone(), None) {
                self.additions.remove(id);
                self.is_dirty = true;
            }
        }
        for id in other.local.iter() {
            self.add_local(id, None);
        }
        for id in other.removals {
            if self.remote.contains(&id) && !self.local.contains(&id) {
                self.removals.insert(id);
            }
        }
        if other.state.has_received_data() {
            self.state.receive();
        }
        self.meta = self.meta.take().or(other.meta);
        self.links = self.links.take().or(other.links);
        self.state
            .set_empty(self.local.is_empty() && self.remote.is_empty());
    }
}

/// Fill an empty slot from `theirs`; otherwise return `theirs` if it conflicts.
fn keep_ours(ours: &mut Option<Identifier>, theirs: Option<Identifier>) -> Option<Identifier> {
    match ours.as_ref() {
        None => {
            *ours = theirs;
            None
        }
        Some(current) => theirs.filter(|theirs| theirs != current),
    }
}

/// Values present in `to` but not `from`, and in `from` but not `to`, each in sequence order.
fn diff(from: &OrderedMembers, to: &OrderedMembers) -> (Vec<Identifier>, Vec<Identifier>) {
    let added = to.iter().filter(|id| !from.contains(id)).cloned().collect();
    let removed = from.iter().filter(|id| !to.contains(id)).cloned().collect();
    (added, removed)
}

#[derive(Debug, Clone)]
pub struct ImplicitEdge {
    pub(crate) definition: Arc<EdgeDefinition>,
    pub(crate) identifier: Identifier,
    pub(crate) local_members: BTreeSet<Identifier>,
    pub(crate) remote_members: BTreeSet<Identifier>,
}

impl ImplicitEdge {
    pub fn new(definition: Arc<EdgeDefinition>, identifier: Identifier) -> Self {
        ImplicitEdge {
            definition,
            identifier,
            local_members: BTreeSet::new(),
            remote_members: BTreeSet::new(),
        }
    }

    pub fn local_members(&self) -> &BTreeSet<Identifier> {
        &self.local_members
    }

    pub fn remote_members(&self) -> &BTreeSet<Identifier> {
        &self.remote_members
    }

    /// Remote adds are mirrored locally.
    pub(crate) fn add(&mut self, value: &Identifier, origin: EventOrigin) -> bool {
        let remote_added = origin.is_remote() && self.remote_members.insert(value.clone());
        let local_added = self.local_members.insert(value.clone());
        remote_added || local_added
    }

    /// Remote removals are mirrored locally.
    pub(crate) fn remove(&mut self, value: &Identifier, origin: EventOrigin) -> bool {
        let remote_removed = origin.is_remote() && self.remote_members.remove(value);
        let local_removed = self.local_members.remove(value);
        remote_removed || local_removed
    }
}

/// The three edge shapes, matched exhaustively wherever behavior differs.
#[derive(Debug, Clone)]
pub enum Edge {
    Resource(ResourceEdge),
    Collection(CollectionEdge),
    Implicit(ImplicitEdge),
}

impl Edge {
    /// Build an empty edge of the shape `definition` calls for.
    pub fn new(definition: Arc<EdgeDefinition>, identifier: Identifier) -> Self {
        match definition.kind {
            crate::properties::RelationshipKind::BelongsTo => {
                Edge::Resource(ResourceEdge::new(definition, identifier))
            }
            crate::properties::RelationshipKind::HasMany => {
                Edge::Collection(CollectionEdge::new(definition, identifier))
            }
            crate::properties::RelationshipKind::Implicit => {
                Edge::Implicit(ImplicitEdge::new(definition, identifier))
            }
        }
    }

    pub fn definition(&self) -> &Arc<EdgeDefinition> {
        match self {
            Edge::Resource(edge) => &edge.definition,
            Edge::Collection(edge) => &edge.definition,
            Edge::Implicit(edge) => &edge.definition,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        match self {
            Edge::Resource(edge) => &edge.identifier,
            Edge::Collection(edge) => &edge.identifier,
            Edge::Implicit(edge) => &edge.identifier,
        }
    }

    pub fn is_implicit(&self) -> bool {
        matches!(self, Edge::Implicit(_))
    }

    /// `None` for implicit edges, which carry no state flags.
    pub fn state(&self) -> Option<&EdgeState> {
        match self {
            Edge::Resource(edge) => Some(&edge.state),
            Edge::Collection(edge) => Some(&edge.state),
            Edge::Implicit(_) => None,
        }
    }

    pub fn transaction_ref(&self) -> u32 {
        match self {
            Edge::Resource(edge) => edge.transaction_ref,
            Edge::Collection(edge) => edge.transaction_ref,
            Edge::Implicit(_) => 0,
        }
    }

    pub(crate) fn transaction_ref_mut(&mut self) -> Option<&mut u32> {
        match self {
            Edge::Resource(edge) => Some(&mut edge.transaction_ref),
            Edge::Collection(edge) => Some(&mut edge.transaction_ref),
            Edge::Implicit(_) => None,
        }
    }

    /// External payload; `None` for implicit edges.
    pub fn payload(&self) -> Option<RelationshipPayload> {
        match self {
            Edge::Resource(edge) => Some(edge.payload()),
            Edge::Collection(edge) => Some(edge.payload()),
            Edge::Implicit(_) => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceEdge> {
        match self {
            Edge::Resource(edge) => Some(edge),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionEdge> {
        match self {
            Edge::Collection(edge) => Some(edge),
            _ => None,
        }
    }

    pub fn as_implicit(&self) -> Option<&ImplicitEdge> {
        match self {
            Edge::Implicit(edge) => Some(edge),
            _ => None,
        }
    }

    /// Identifiers currently held on the local side.
    pub fn local_related(&self) -> Vec<Identifier> {
        match self {
            Edge::Resource(edge) => edge.local_state.iter().cloned().collect(),
            Edge::Collection(edge) => edge.local.as_slice().to_vec(),
            Edge::Implicit(edge) => edge.local_members.iter().cloned().collect(),
        }
    }

    /// Identifiers currently held on the remote side.
    pub fn remote_related(&self) -> Vec<Identifier> {
        match self {
            Edge::Resource(edge) => edge.remote_state.iter().cloned().collect(),
            Edge::Collection(edge) => edge.remote.as_slice().to_vec(),
            Edge::Implicit(edge) => edge.remote_members.iter().cloned().collect(),
        }
    }

    /// Every identifier this edge refers to on either side, without duplicates.
    pub fn all_related(&self) -> BTreeSet<Identifier> {
        let mut related: BTreeSet<Identifier> = self.local_related().into_iter().collect();
        related.extend(self.remote_related());
        related
    }

    pub fn contains(&self, value: &Identifier, origin: EventOrigin) -> bool {
        match (self, origin) {
            (Edge::Resource(edge), EventOrigin::Local) => edge.local_state.as_ref() == Some(value),
            (Edge::Resource(edge), EventOrigin::Remote) => {
                edge.remote_state.as_ref() == Some(value)
            }
            (Edge::Collection(edge), EventOrigin::Local) => edge.local.contains(value),
            (Edge::Collection(edge), EventOrigin::Remote) => edge.remote.contains(value),
            (Edge::Implicit(edge), EventOrigin::Local) => edge.local_members.contains(value),
            (Edge::Implicit(edge), EventOrigin::Remote) => edge.remote_members.contains(value),
        }
    }

    /// Drop `value` from both sides and from any pending diff. Returns true if anything changed.
    pub(crate) fn remove_completely(&mut self, value: &Identifier) -> bool {
        match self {
            Edge::Resource(edge) => {
                let mut changed = false;
                if edge.remote_state.as_ref() == Some(value) {
                    edge.remote_state = None;
                    changed = true;
                }
                if edge.local_state.as_ref() == Some(value) {
                    edge.local_state = None;
                    changed = true;
                }
                edge.state.set_empty(edge.local_state.is_none());
                changed
            }
            Edge::Collection(edge) => {
                let remote = edge.remote.remove(value);
                let local = edge.local.remove(value);
                edge.additions.remove(value);
                edge.removals.remove(value);
                edge.state.set_empty(edge.local.is_empty());
                remote || local
            }
            Edge::Implicit(edge) => {
                let remote = edge.remote_members.remove(value);
                let local = edge.local_members.remove(value);
                remote || local
            }
        }
    }

    /// Re-key every reference to `old` as `new`. Returns true if anything changed.
    pub(crate) fn rekey(&mut self, old: &Identifier, new: &Identifier) -> bool {
        match self {
            Edge::Resource(edge) => {
                let mut changed = false;
                for slot in [&mut edge.remote_state, &mut edge.local_state] {
                    if slot.as_ref() == Some(old) {
                        *slot = Some(new.clone());
                        changed = true;
                    }
                }
                changed
            }
            Edge::Collection(edge) => {
                let remote = edge.remote.rekey(old, new);
                let local = edge.local.rekey(old, new);
                edge.additions.rekey(old, new);
                if edge.removals.remove(old) {
                    edge.removals.insert(new.clone());
                }
                remote || local
            }
            Edge::Implicit(edge) => {
                let mut changed = false;
                for members in [&mut edge.remote_members, &mut edge.local_members] {
                    if members.remove(old) {
                        members.insert(new.clone());
                        changed = true;
                    }
                }
                changed
            }
        }
    }

    /// Mutable state flags and payload metadata; `None` for implicit edges.
    pub(crate) fn payload_fields_mut(
        &mut self,
    ) -> Option<(&mut EdgeState, &mut Option<Meta>, &mut Option<Links>)> {
        match self {
            Edge::Resource(edge) => Some((&mut edge.state, &mut edge.meta, &mut edge.links)),
            Edge::Collection(edge) => Some((&mut edge.state, &mut edge.meta, &mut edge.links)),
            Edge::Implicit(_) => None,
        }
    }

    pub(crate) fn set_identifier(&mut self, identifier: Identifier) {
        match self {
            Edge::Resource(edge) => edge.identifier = identifier,
            Edge::Collection(edge) => edge.identifier = identifier,
            Edge::Implicit(edge) => edge.identifier = identifier,
        }
    }

    /// Empty both sides, keeping the definition, payload metadata and state flags.
    pub(crate) fn clear(&mut self) {
        match self {
            Edge::Resource(edge) => {
                edge.local_state = None;
                edge.remote_state = None;
                edge.state.set_empty(true);
            }
            Edge::Collection(edge) => {
                edge.local.clear();
                edge.remote.clear();
                edge.additions.clear();
                edge.removals.clear();
                edge.is_dirty = false;
                edge.state.set_empty(true);
            }
            Edge::Implicit(edge) => {
                edge.local_members.clear();
                edge.remote_members.clear();
            }
        }
    }

    /// Merge `other` (an edge of the same field on a retired identifier) into this one.
    ///
    /// Returns single values that lost a conflict, with the side they were held on, so the
    /// caller can sever the inverse they still point from.
    pub(crate) fn absorb(&mut self, other: Edge) -> Vec<(Identifier, EventOrigin)> {
        match (self, other) {
            (Edge::Resource(ours), Edge::Resource(theirs)) => ours.absorb(theirs),
            (Edge::Collection(ours), Edge::Collection(theirs)) => {
                ours.absorb(theirs);
                vec![]
            }
            (Edge::Implicit(ours), Edge::Implicit(theirs)) => {
                ours.remote_members.extend(theirs.remote_members);
                ours.local_members.extend(theirs.local_members);
                vec![]
            }
            (ours, theirs) => {
                tracing::warn!(
                    "[Edge::absorb] {} and {} disagree on the shape of '{}'; keeping {}",
                    ours.identifier(),
                    theirs.identifier(),
                    ours.definition().key,
                    ours.identifier()
                );
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::RelationshipKind;
    use test_log::test;

    fn comments_definition() -> Arc<EdgeDefinition> {
        Arc::new(EdgeDefinition {
            kind: RelationshipKind::HasMany,
            key: "comments".to_string(),
            owner_type: "post".to_string(),
            related_type: "comment".to_string(),
            is_async: false,
            is_polymorphic: false,
            inverse_kind: RelationshipKind::BelongsTo,
            inverse_key: "post".to_string(),
            inverse_is_async: false,
            inverse_is_polymorphic: false,
        })
    }

    fn comment(id: &str) -> Identifier {
        Identifier::new("comment", id)
    }

    #[test]
    fn test_ordered_members_agree() {
        let mut members: OrderedMembers =
            vec![comment("1"), comment("2"), comment("1")].into_iter().collect();
        assert_eq!(members.as_slice(), &[comment("1"), comment("2")]);
        assert!(members.insert(comment("3"), Some(0)));
        assert!(!members.insert(comment("2"), None));
        assert_eq!(members.position(&comment("3")), Some(0));
        assert!(members.rekey(&comment("3"), &comment("2")));
        assert_eq!(members.as_slice(), &[comment("1"), comment("2")]);
        assert_eq!(members.members().len(), members.len());
    }

    #[test]
    fn test_sync_keeps_pending_additions_in_place() {
        let mut edge = CollectionEdge::new(comments_definition(), Identifier::new("post", "1"));
        edge.replace_remote(vec![comment("1"), comment("2")].into_iter().collect());
        assert!(edge.sync_remote_to_local());

        // Local: insert comment:3 at the front, drop comment:2.
        assert!(edge.add_local(&comment("3"), Some(0)));
        assert!(edge.remove_local(&comment("2")));
        assert_eq!(edge.additions.as_slice(), &[comment("3")]);
        assert!(edge.removals.contains(&comment("2")));

        // Remote gains comment:4; local reconciliation keeps the pending diff.
        edge.add_remote(&comment("4"), None);
        assert!(edge.sync_remote_to_local());
        assert_eq!(
            edge.local.as_slice(),
            &[comment("3"), comment("1"), comment("4")]
        );

        // Remote confirms both local changes; the diff is countered.
        edge.replace_remote(vec![comment("3"), comment("1"), comment("4")].into_iter().collect());
        assert!(edge.additions.is_empty());
        assert!(edge.removals.is_empty());
        assert!(!edge.sync_remote_to_local());
    }

    #[test]
    fn test_payload_omits_data_until_received() {
        let mut edge = CollectionEdge::new(comments_definition(), Identifier::new("post", "1"));
        edge.add_local(&comment("1"), None);
        assert_eq!(edge.payload().data, None);

        edge.state.receive();
        assert_eq!(
            edge.payload().data,
            Some(PayloadData::Many(vec![comment("1")]))
        );
    }

    #[test]
    fn test_implicit_remote_mirrors_local() {
        let definition = Arc::new(EdgeDefinition {
            kind: RelationshipKind::Implicit,
            ..(*comments_definition()).clone()
        });
        let mut edge = Edge::new(definition, comment("1"));
        let post = Identifier::new("post", "1");
        let Edge::Implicit(implicit) = &mut edge else {
            panic!("expected an implicit edge");
        };
        assert!(implicit.add(&post, EventOrigin::Remote));
        assert!(edge.contains(&post, EventOrigin::Local));
        assert!(edge.contains(&post, EventOrigin::Remote));
        assert!(edge.remove_completely(&post));
        assert!(edge.all_related().is_empty());
    }
}
