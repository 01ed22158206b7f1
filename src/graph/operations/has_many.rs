use crate::{
    error::GraphError,
    event::EventOrigin,
    graph::{base::Graph, edge::OrderedMembers},
    properties::Identifier,
};

use super::{attach, collection_mut, detach};

/// Add `values` to a hasMany, at `index` (consecutively) or appended. Members already present
/// are skipped, so repeating the call changes nothing.
pub(crate) fn add_to_related_records(
    graph: &mut Graph,
    record: &Identifier,
    field: &str,
    values: Vec<Identifier>,
    index: Option<usize>,
    origin: EventOrigin,
) -> Result<(), GraphError> {
    const OP: &str = "addToRelatedRecords";
    let definition = collection_mut(graph, record, field, OP)?.definition.clone();
    if !origin.is_remote() {
        graph.sync_pending(record, field);
    }
    for value in values.iter() {
        graph.check_value_type(&definition, value)?;
    }

    let mut index = index;
    let mut changed = false;
    for value in values.iter() {
        let edge = collection_mut(graph, record, field, OP)?;
        let added = match origin {
            EventOrigin::Remote => edge.add_remote(value, index),
            EventOrigin::Local => edge.add_local(value, index),
        };
        if !added {
            continue;
        }
        changed = true;
        index = index.map(|i| i.saturating_add(1));
        attach(graph, value, &definition.inverse_key, record, origin)?;
    }
    finish(graph, record, field, origin, changed, OP)
}

/// Remove `values` from a hasMany. Values that are not members are skipped.
pub(crate) fn remove_from_related_records(
    graph: &mut Graph,
    record: &Identifier,
    field: &str,
    values: Vec<Identifier>,
    origin: EventOrigin,
) -> Result<(), GraphError> {
    const OP: &str = "removeFromRelatedRecords";
    let definition = collection_mut(graph, record, field, OP)?.definition.clone();
    if !origin.is_remote() {
        graph.sync_pending(record, field);
    }

    let mut changed = false;
    for value in values.iter() {
        let edge = collection_mut(graph, record, field, OP)?;
        let removed = match origin {
            EventOrigin::Remote => edge.remove_remote(value),
            EventOrigin::Local => edge.remove_local(value),
        };
        if !removed {
            continue;
        }
        changed = true;
        detach(graph, value, &definition.inverse_key, record, origin);
    }
    finish(graph, record, field, origin, changed, OP)
}

/// Replace the membership of a hasMany with `values`, in the given order. Duplicates keep their
/// first position.
pub(crate) fn replace_related_records(
    graph: &mut Graph,
    record: &Identifier,
    field: &str,
    values: Vec<Identifier>,
    origin: EventOrigin,
) -> Result<(), GraphError> {
    const OP: &str = "replaceRelatedRecords";
    let definition = collection_mut(graph, record, field, OP)?.definition.clone();
    for value in values.iter() {
        graph.check_value_type(&definition, value)?;
    }
    let members: OrderedMembers = values.into_iter().collect();
    if !origin.is_remote() {
        graph.sync_pending(record, field);
    }

    let edge = collection_mut(graph, record, field, OP)?;
    let (added, removed, changed) = match origin {
        EventOrigin::Remote => edge.replace_remote(members),
        EventOrigin::Local => edge.replace_local(members),
    };
    for value in removed.iter() {
        detach(graph, value, &definition.inverse_key, record, origin);
    }
    for value in added.iter() {
        attach(graph, value, &definition.inverse_key, record, origin)?;
    }
    finish(graph, record, field, origin, changed, OP)
}

/// Bookkeeping shared by every hasMany write: remote writes count as received data, and a
/// change flags the edge for reconciliation. Local changes are observable right away.
fn finish(
    graph: &mut Graph,
    record: &Identifier,
    field: &str,
    origin: EventOrigin,
    changed: bool,
    op: &str,
) -> Result<(), GraphError> {
    if origin.is_remote() {
        collection_mut(graph, record, field, op)?.state.receive();
    }
    graph.add_to_transaction(record, field);
    if changed {
        graph.mark_for_sync(record, field);
        if !origin.is_remote() {
            graph.notify(record, field);
        }
    }
    Ok(())
}
