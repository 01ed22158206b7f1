use crate::{
    config::GraphConfig,
    error::GraphError,
    event::{ChangeNotifier, EventOrigin, NullNotifier, Operation, RelationshipPayload},
    properties::{Identifier, RelationshipKind},
    scheduler::{FlushQueue, FlushQueueSet, NullScheduler, Scheduler},
    schema::SchemaCatalog,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    mem::take,
    sync::Arc,
};

use super::{
    definition::{DefinitionCache, EdgeDefinition, PolymorphicTypes},
    edge::Edge,
    operations,
};

/// The edges of one identifier, by field name.
///
/// A `None` slot is an implicit edge vacated by [Graph::unload]; the next [Graph::get] recreates
/// it fresh.
pub type Node = BTreeMap<String, Option<Edge>>;

/// One side of one relationship: `identifier.field`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct EdgeKey {
    pub identifier: Identifier,
    pub field: String,
}

impl EdgeKey {
    pub fn new(identifier: &Identifier, field: &str) -> Self {
        EdgeKey {
            identifier: identifier.clone(),
            field: field.to_string(),
        }
    }
}

/// Remote operations waiting for the next coalesced flush, bucketed by the order they apply in.
#[derive(Debug, Default)]
struct PendingOperations {
    deletions: Vec<Operation>,
    has_many: Vec<Operation>,
    belongs_to: Vec<Operation>,
}

impl PendingOperations {
    fn len(&self) -> usize {
        self.deletions.len() + self.has_many.len() + self.belongs_to.len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The relationship graph of one store.
///
/// Nodes are created lazily on first access and addressed by [Identifier]; edges only ever hold
/// identifiers. All mutation goes through [Graph::update] (applied now) or [Graph::push]
/// (queued remote data, applied in one coalesced transaction by the next flush).
///
/// The graph does not run deferred work on its own. It tells its [Scheduler] which queue needs
/// a run, and the owner answers with [Graph::run_queue] or [Graph::flush] before the next read.
pub struct Graph {
    nodes: BTreeMap<Identifier, Node>,
    definitions: DefinitionCache,
    polymorphic: PolymorphicTypes,
    catalog: Arc<dyn SchemaCatalog>,
    notifier: Arc<dyn ChangeNotifier>,
    scheduler: Arc<dyn Scheduler>,
    config: GraphConfig,
    pending: PendingOperations,
    scheduled: FlushQueueSet,
    /// Collection edges waiting for local reconciliation.
    updated: BTreeSet<EdgeKey>,
    /// Open while a coalesced remote flush is being applied.
    transaction: Option<BTreeSet<EdgeKey>>,
    notifications: BTreeSet<EdgeKey>,
    removing: Option<Identifier>,
    diagnostics: Vec<String>,
    destroyed: bool,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.len())
            .field("definitions", &self.definitions.len())
            .field("pending", &self.pending.len())
            .field("scheduled", &self.scheduled)
            .field("in_transaction", &self.transaction.is_some())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Graph {
    pub fn new<C: SchemaCatalog + 'static>(catalog: C) -> Graph {
        Graph {
            nodes: BTreeMap::new(),
            definitions: DefinitionCache::default(),
            polymorphic: PolymorphicTypes::default(),
            catalog: Arc::new(catalog),
            notifier: Arc::new(NullNotifier),
            scheduler: Arc::new(NullScheduler),
            config: GraphConfig::default(),
            pending: PendingOperations::default(),
            scheduled: FlushQueueSet::empty(),
            updated: BTreeSet::new(),
            transaction: None,
            notifications: BTreeSet::new(),
            removing: None,
            diagnostics: vec![],
            destroyed: false,
        }
    }

    pub fn with_notifier<N: ChangeNotifier + 'static>(mut self, notifier: N) -> Graph {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn with_scheduler<S: Scheduler + 'static>(mut self, scheduler: S) -> Graph {
        self.scheduler = Arc::new(scheduler);
        self
    }

    pub fn with_config(mut self, config: GraphConfig) -> Graph {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn ensure_live(&self) -> Result<(), GraphError> {
        if self.destroyed {
            Err(GraphError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// True iff `identifier` has a node with edge state for `field`. Never resolves anything.
    pub fn has(&self, identifier: &Identifier, field: &str) -> Result<bool, GraphError> {
        self.ensure_live()?;
        Ok(self
            .nodes
            .get(identifier)
            .and_then(|node| node.get(field))
            .is_some_and(Option::is_some))
    }

    /// The edge at `identifier.field`, created empty if this is its first access.
    ///
    /// Pending local reconciliation for the edge is applied first, so the returned local state
    /// is current.
    pub fn get(&mut self, identifier: &Identifier, field: &str) -> Result<&Edge, GraphError> {
        self.ensure_live()?;
        self.edge_mut(identifier, field)?;
        self.reconcile(identifier, field);
        self.edge_mut(identifier, field).map(|edge| &*edge)
    }

    /// The external payload of a belongsTo or hasMany edge. Fails on implicit edges.
    pub fn get_data(
        &mut self,
        identifier: &Identifier,
        field: &str,
    ) -> Result<RelationshipPayload, GraphError> {
        self.get(identifier, field)?
            .payload()
            .ok_or_else(|| GraphError::ImplicitRelationship {
                action: "read the payload of".to_string(),
                kind: identifier.kind.clone(),
                field: field.to_string(),
            })
    }

    /// Resolve (and cache) the definition of `kind.field` without touching any node.
    pub fn definition_for(
        &mut self,
        kind: &str,
        field: &str,
    ) -> Result<Arc<EdgeDefinition>, GraphError> {
        self.ensure_live()?;
        self.definitions
            .resolve(self.catalog.as_ref(), &self.polymorphic, kind, field)
    }

    /// Record that `a` and `b` may stand in for each other in relationships declared against
    /// either. Idempotent.
    pub fn register_polymorphic_type(&mut self, a: &str, b: &str) -> Result<(), GraphError> {
        self.ensure_live()?;
        if self.polymorphic.register(a, b) {
            tracing::debug!("[Graph] registered polymorphic types {a} <-> {b}");
        }
        Ok(())
    }

    pub fn is_polymorphic_equivalent(&self, a: &str, b: &str) -> Result<bool, GraphError> {
        self.ensure_live()?;
        Ok(self.polymorphic.are_equivalent(a, b))
    }

    /// True unless one of the node's edges has an async inverse: the other side may not be loaded
    /// yet and still needs this node to resolve against later.
    pub fn is_releasable(&self, identifier: &Identifier) -> Result<bool, GraphError> {
        self.ensure_live()?;
        Ok(self.nodes.get(identifier).is_none_or(|node| {
            !node
                .values()
                .flatten()
                .any(|edge| edge.definition().inverse_is_async)
        }))
    }

    /// Sever and empty every edge of `identifier` but keep the node. Typed edges stay in place,
    /// empty; implicit slots are vacated.
    pub fn unload(&mut self, identifier: &Identifier) -> Result<(), GraphError> {
        self.ensure_live()?;
        tracing::trace!("[Graph::unload] {identifier}");
        let releasable = self.is_releasable(identifier)?;
        let fields: Vec<String> = match self.nodes.get(identifier) {
            Some(node) => node.keys().cloned().collect(),
            None => return Ok(()),
        };
        for field in fields {
            let Some(edge) = self.loaded_edge_mut(identifier, &field) else {
                continue;
            };
            let definition = edge.definition().clone();
            let related = edge.all_related();
            if edge.is_implicit() {
                if releasable {
                    for value in related.iter() {
                        operations::remove_completely(self, value, &definition.inverse_key, identifier);
                    }
                }
                if let Some(node) = self.nodes.get_mut(identifier) {
                    node.insert(field, None);
                }
                continue;
            }
            for value in related.iter() {
                operations::remove_completely(self, value, &definition.inverse_key, identifier);
            }
            if let Some(edge) = self.loaded_edge_mut(identifier, &field) {
                edge.clear();
            }
            self.updated.remove(&EdgeKey::new(identifier, &field));
            self.notify(identifier, &field);
        }
        if self.transaction.is_none() {
            self.dispatch_notifications();
        }
        Ok(())
    }

    /// Unload `identifier` and delete its node. Fails if a removal is already in progress.
    pub fn remove(&mut self, identifier: &Identifier) -> Result<(), GraphError> {
        self.ensure_live()?;
        if let Some(in_progress) = &self.removing {
            tracing::warn!("[Graph::remove] {identifier} requested while removing {in_progress}");
            return Err(GraphError::ReentrantRemove(identifier.to_string()));
        }
        self.removing = Some(identifier.clone());
        let result = self.unload(identifier);
        self.nodes.remove(identifier);
        self.updated.retain(|key| &key.identifier != identifier);
        self.removing = None;
        result
    }

    /// Queue a remote operation for the next coalesced flush.
    pub fn push(&mut self, op: Operation) -> Result<(), GraphError> {
        self.ensure_live()?;
        let kind = match &op {
            Operation::DeleteRecord { .. } => None,
            Operation::MergeIdentifiers { .. } => {
                return Err(GraphError::InvalidOperation(format!(
                    "{op} cannot be queued; apply it with Graph::update"
                )))
            }
            Operation::ReplaceRelatedRecord { .. }
            | Operation::AddToRelatedRecords { .. }
            | Operation::RemoveFromRelatedRecords { .. }
            | Operation::ReplaceRelatedRecords { .. }
            | Operation::UpdateRelationship { .. } => {
                let field = op.field().unwrap_or_default();
                let kind = self.explicit_definition("push to", op.record(), field)?.kind;
                let expected = match &op {
                    Operation::ReplaceRelatedRecord { .. } => Some(RelationshipKind::BelongsTo),
                    Operation::UpdateRelationship { .. } => None,
                    _ => Some(RelationshipKind::HasMany),
                };
                if expected.is_some_and(|expected| expected != kind) {
                    return Err(GraphError::InvalidOperation(format!(
                        "{op} cannot target {}.{field}, which is a {kind} relationship",
                        op.record()
                    )));
                }
                Some(kind)
            }
        };
        tracing::trace!("[Graph::push] {op}");
        match kind {
            None => self.pending.deletions.push(op),
            Some(RelationshipKind::HasMany) => self.pending.has_many.push(op),
            Some(_) => self.pending.belongs_to.push(op),
        }
        self.schedule(FlushQueue::Coalesce);
        Ok(())
    }

    /// Apply `op` now, to the local or the remote view.
    pub fn update(&mut self, op: Operation, origin: EventOrigin) -> Result<(), GraphError> {
        self.ensure_live()?;
        if op.is_remote_only() && !origin.is_remote() {
            return Err(GraphError::RemoteOnly {
                op: op.name().to_string(),
            });
        }
        if let Some(field) = op.field() {
            self.explicit_definition("update", op.record(), field)?;
        }
        let result = self.apply(op, origin);
        if self.transaction.is_none() {
            self.dispatch_notifications();
        }
        result
    }

    fn explicit_definition(
        &mut self,
        action: &str,
        record: &Identifier,
        field: &str,
    ) -> Result<Arc<EdgeDefinition>, GraphError> {
        let definition = self.definition_for(&record.kind, field)?;
        if definition.is_implicit() {
            return Err(GraphError::ImplicitRelationship {
                action: action.to_string(),
                kind: record.kind.clone(),
                field: field.to_string(),
            });
        }
        Ok(definition)
    }

    fn apply(&mut self, op: Operation, origin: EventOrigin) -> Result<(), GraphError> {
        tracing::trace!("[Graph::apply] {op} ({origin:?})");
        match op {
            Operation::ReplaceRelatedRecord {
                record,
                field,
                value,
            } => operations::replace_related_record(self, &record, &field, value, origin),
            Operation::AddToRelatedRecords {
                record,
                field,
                value,
                index,
            } => operations::add_to_related_records(
                self,
                &record,
                &field,
                value.into_vec(),
                index,
                origin,
            ),
            Operation::RemoveFromRelatedRecords {
                record,
                field,
                value,
                ..
            } => operations::remove_from_related_records(
                self,
                &record,
                &field,
                value.into_vec(),
                origin,
            ),
            Operation::ReplaceRelatedRecords {
                record,
                field,
                value,
            } => operations::replace_related_records(self, &record, &field, value, origin),
            Operation::UpdateRelationship {
                record,
                field,
                value,
            } => operations::update_relationship(self, &record, &field, value),
            Operation::DeleteRecord { record } => operations::delete_record(self, &record),
            Operation::MergeIdentifiers { record, value } => {
                operations::merge_identifiers(self, &record, &value)
            }
        }
    }

    /// Run one deferred queue now.
    pub fn run_queue(&mut self, queue: FlushQueue) -> Result<(), GraphError> {
        self.ensure_live()?;
        match queue {
            FlushQueue::Coalesce => self.flush_remote_queue(),
            FlushQueue::Sync => {
                self.flush_local_queue();
                Ok(())
            }
        }
    }

    /// Run queued work until nothing is pending: coalesce before sync, repeatedly.
    ///
    /// Returns the first error any queued operation raised; later operations are still applied.
    pub fn flush(&mut self) -> Result<(), GraphError> {
        self.ensure_live()?;
        let mut first_error = None;
        loop {
            if self.scheduled.contains(FlushQueue::Coalesce) || !self.pending.is_empty() {
                if let Err(e) = self.flush_remote_queue() {
                    first_error.get_or_insert(e);
                }
            } else if self.scheduled.contains(FlushQueue::Sync) || !self.updated.is_empty() {
                self.flush_local_queue();
            } else {
                break;
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Apply every queued remote operation inside one transaction: deletions, then hasMany
    /// updates, then belongsTo updates, regardless of arrival order.
    fn flush_remote_queue(&mut self) -> Result<(), GraphError> {
        self.scheduled.remove(FlushQueue::Coalesce);
        let PendingOperations {
            deletions,
            has_many,
            belongs_to,
        } = take(&mut self.pending);
        tracing::debug!(
            "[Graph::flush_remote_queue] {} deletions, {} hasMany, {} belongsTo",
            deletions.len(),
            has_many.len(),
            belongs_to.len()
        );

        self.transaction = Some(BTreeSet::new());
        let mut first_error = None;
        for op in deletions.into_iter().chain(has_many).chain(belongs_to) {
            let description = op.to_string();
            if let Err(e) = self.apply(op, EventOrigin::Remote) {
                tracing::warn!("[Graph::flush_remote_queue] {description} failed: {e}");
                first_error.get_or_insert(e);
            }
        }
        self.finalize_transaction();
        first_error.map_or(Ok(()), Err)
    }

    fn finalize_transaction(&mut self) {
        let Some(touched) = self.transaction.take() else {
            return;
        };
        for key in touched.iter() {
            if let Some(transaction_ref) = self
                .loaded_edge_mut(&key.identifier, &key.field)
                .and_then(Edge::transaction_ref_mut)
            {
                *transaction_ref = 0;
            }
        }
        self.dispatch_notifications();
        self.notifier.transaction_settled(touched.len());
    }

    /// Reconcile local state of every collection flagged since the last run.
    fn flush_local_queue(&mut self) {
        self.scheduled.remove(FlushQueue::Sync);
        let updated = take(&mut self.updated);
        tracing::debug!("[Graph::flush_local_queue] {} relationships", updated.len());
        for key in updated.iter() {
            self.sync_edge(key);
        }
        if self.transaction.is_none() {
            self.dispatch_notifications();
        }
    }

    fn sync_edge(&mut self, key: &EdgeKey) {
        let Some(Edge::Collection(edge)) = self.loaded_edge_mut(&key.identifier, &key.field)
        else {
            return;
        };
        if edge.is_dirty && edge.sync_remote_to_local() {
            self.notify(&key.identifier, &key.field);
        }
    }

    /// Reconcile `identifier.field` now if its remote state moved on. Notifications it raises
    /// stay queued for the caller's dispatch.
    pub(crate) fn sync_pending(&mut self, identifier: &Identifier, field: &str) {
        let key = EdgeKey::new(identifier, field);
        self.updated.remove(&key);
        self.sync_edge(&key);
    }

    fn reconcile(&mut self, identifier: &Identifier, field: &str) {
        let key = EdgeKey::new(identifier, field);
        if self.updated.remove(&key) {
            self.sync_edge(&key);
            if self.transaction.is_none() {
                self.dispatch_notifications();
            }
        }
    }

    /// Detach from the owning store: drop every node and queued operation. Any later call fails
    /// with [GraphError::Destroyed], except the inspection accessors below, which report the
    /// emptied graph.
    pub fn destroy(&mut self) {
        tracing::info!(
            "[Graph::destroy] dropping {} nodes and {} queued operations",
            self.nodes.len(),
            self.pending.len()
        );
        self.nodes.clear();
        self.pending = PendingOperations::default();
        self.updated.clear();
        self.notifications.clear();
        self.scheduled = FlushQueueSet::empty();
        self.transaction = None;
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.nodes.keys()
    }

    pub fn node(&self, identifier: &Identifier) -> Option<&Node> {
        self.nodes.get(identifier)
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Queues with a run requested and not yet performed.
    pub fn pending_queues(&self) -> FlushQueueSet {
        self.scheduled
    }

    /// Number of remote operations waiting for the next coalesced flush.
    pub fn pending_operations(&self) -> usize {
        self.pending.len()
    }

    /// Payload consistency warnings recorded so far.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    // Internals shared with the operation set.

    /// Edge at `identifier.field`, created (and its definition resolved) on first access.
    pub(crate) fn edge_mut(
        &mut self,
        identifier: &Identifier,
        field: &str,
    ) -> Result<&mut Edge, GraphError> {
        let existing = self
            .nodes
            .get_mut(identifier)
            .and_then(|node| node.get_mut(field))
            .and_then(Option::take);
        let edge = match existing {
            Some(edge) => edge,
            None => {
                let definition = self.definitions.resolve(
                    self.catalog.as_ref(),
                    &self.polymorphic,
                    &identifier.kind,
                    field,
                )?;
                tracing::trace!("[Graph] materializing {identifier}.{field} ({})", definition.kind);
                Edge::new(definition, identifier.clone())
            }
        };
        Ok(self
            .nodes
            .entry(identifier.clone())
            .or_default()
            .entry(field.to_string())
            .or_default()
            .insert(edge))
    }

    /// Edge at `identifier.field` only if it is already materialized.
    pub(crate) fn loaded_edge_mut(
        &mut self,
        identifier: &Identifier,
        field: &str,
    ) -> Option<&mut Edge> {
        self.nodes
            .get_mut(identifier)
            .and_then(|node| node.get_mut(field))
            .and_then(Option::as_mut)
    }

    pub(crate) fn take_node(&mut self, identifier: &Identifier) -> Option<Node> {
        self.nodes.remove(identifier)
    }

    pub(crate) fn node_mut(&mut self, identifier: &Identifier) -> &mut Node {
        self.nodes.entry(identifier.clone()).or_default()
    }

    /// Fail on a value whose type the field does not accept. Polymorphic fields (and every field
    /// when validation is disabled) register the new type as equivalent instead.
    pub(crate) fn check_value_type(
        &mut self,
        definition: &EdgeDefinition,
        value: &Identifier,
    ) -> Result<(), GraphError> {
        if self
            .polymorphic
            .are_equivalent(&definition.related_type, &value.kind)
        {
            return Ok(());
        }
        if definition.is_polymorphic || !self.config.validation.is_enabled() {
            self.register_polymorphic_type(&definition.related_type, &value.kind)?;
            return Ok(());
        }
        Err(GraphError::TypeMismatch {
            kind: definition.owner_type.clone(),
            field: definition.key.clone(),
            expected: definition.related_type.clone(),
            found: value.kind.clone(),
        })
    }

    /// Flag a collection for local reconciliation and make sure a sync run is requested.
    pub(crate) fn mark_for_sync(&mut self, identifier: &Identifier, field: &str) {
        self.updated.insert(EdgeKey::new(identifier, field));
        self.schedule(FlushQueue::Sync);
    }

    pub(crate) fn rekey_pending(&mut self, old: &Identifier, new: &Identifier) {
        let rekey = |keys: BTreeSet<EdgeKey>| {
            keys.into_iter()
                .map(|key| {
                    if &key.identifier == old {
                        EdgeKey::new(new, &key.field)
                    } else {
                        key
                    }
                })
                .collect::<BTreeSet<_>>()
        };
        self.updated = rekey(take(&mut self.updated));
        self.notifications = rekey(take(&mut self.notifications));
        if let Some(transaction) = self.transaction.take() {
            self.transaction = Some(rekey(transaction));
        }
    }

    pub(crate) fn forget_pending(&mut self, identifier: &Identifier) {
        self.updated.retain(|key| &key.identifier != identifier);
        self.notifications.retain(|key| &key.identifier != identifier);
    }

    /// Count `identifier.field` as touched by the open transaction, if any.
    pub(crate) fn add_to_transaction(&mut self, identifier: &Identifier, field: &str) {
        let Some(transaction) = self.transaction.as_mut() else {
            return;
        };
        transaction.insert(EdgeKey::new(identifier, field));
        if let Some(transaction_ref) = self
            .loaded_edge_mut(identifier, field)
            .and_then(Edge::transaction_ref_mut)
        {
            *transaction_ref = transaction_ref.saturating_add(1);
        }
    }

    /// Queue a change notification. Implicit edges are never observed; repeats collapse until
    /// the next dispatch.
    pub(crate) fn notify(&mut self, identifier: &Identifier, field: &str) {
        let implicit = self
            .nodes
            .get(identifier)
            .and_then(|node| node.get(field))
            .and_then(Option::as_ref)
            .is_none_or(Edge::is_implicit);
        if !implicit {
            self.notifications.insert(EdgeKey::new(identifier, field));
        }
    }

    fn dispatch_notifications(&mut self) {
        for key in take(&mut self.notifications) {
            self.notifier.notify_changed(&key.identifier, &key.field);
        }
    }

    fn schedule(&mut self, queue: FlushQueue) {
        if self.scheduled.insert(queue) {
            tracing::trace!("[Graph] scheduling {queue}");
            self.scheduler.schedule(queue);
        }
    }

    pub(crate) fn record_diagnostic(&mut self, message: String) {
        tracing::warn!("{message}");
        self.diagnostics.push(message);
    }

    /// Check symmetry and membership/order agreement across every loaded edge.
    ///
    /// Local views are only compared where neither side is waiting for reconciliation. Vacated
    /// implicit slots are skipped. Caution: walks the whole graph.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut errors = vec![];
        for (identifier, node) in self.nodes.iter() {
            for (field, edge) in node.iter() {
                let Some(edge) = edge else {
                    continue;
                };
                if edge.identifier() != identifier {
                    errors.push(format!(
                        "[Graph::check_invariants] {identifier}.{field} is owned by {}",
                        edge.identifier()
                    ));
                }
                if let Edge::Collection(collection) = edge {
                    for (side, members) in [("local", &collection.local), ("remote", &collection.remote)]
                    {
                        let ordered: BTreeSet<&Identifier> = members.iter().collect();
                        if ordered.len() != members.len()
                            || members.members().len() != members.len()
                            || !members.members().iter().all(|id| ordered.contains(id))
                        {
                            errors.push(format!(
                                "[Graph::check_invariants] {identifier}.{field} {side} membership \
                                 and order disagree"
                            ));
                        }
                    }
                }
                let inverse_key = &edge.definition().inverse_key;
                for origin in [EventOrigin::Remote, EventOrigin::Local] {
                    let related = match origin {
                        EventOrigin::Remote => edge.remote_related(),
                        EventOrigin::Local => edge.local_related(),
                    };
                    for value in related.iter() {
                        match self.nodes.get(value).and_then(|node| node.get(inverse_key)) {
                            Some(None) => {}
                            Some(Some(inverse)) => {
                                if origin == EventOrigin::Local
                                    && (awaiting_sync(edge) || awaiting_sync(inverse))
                                {
                                    continue;
                                }
                                if !inverse.contains(identifier, origin) {
                                    errors.push(format!(
                                        "[Graph::check_invariants] {identifier}.{field} holds \
                                         {value} ({origin:?}) but {value}.{inverse_key} does not \
                                         hold {identifier}"
                                    ));
                                }
                            }
                            None => errors.push(format!(
                                "[Graph::check_invariants] {identifier}.{field} holds {value} \
                                 ({origin:?}) but {value}.{inverse_key} was never materialized"
                            )),
                        }
                    }
                }
            }
        }
        errors
    }
}

fn awaiting_sync(edge: &Edge) -> bool {
    matches!(edge, Edge::Collection(collection) if collection.is_dirty)
}
