//! The operation set.
//!
//! Each operation updates one edge and mirrors the change onto the inverse edge of every value
//! it touches. Inverse writes go through [attach] and [detach], which never propagate further
//! than the single edge they are given, except that a belongsTo gaining a new value lets go of
//! the value it held before.
//!
//! A local write to a collection whose remote state has not been reconciled yet reconciles it
//! first, so the write applies to current local state.

mod belongs_to;
mod has_many;
mod record;
mod update_relationship;

pub(crate) use belongs_to::replace_related_record;
pub(crate) use has_many::{
    add_to_related_records, remove_from_related_records, replace_related_records,
};
pub(crate) use record::{delete_record, merge_identifiers};
pub(crate) use update_relationship::update_relationship;

use crate::{error::GraphError, event::EventOrigin, properties::Identifier};

use super::{
    base::Graph,
    edge::{CollectionEdge, Edge, ResourceEdge},
};

fn shape_error(edge: &Edge, op: &str) -> GraphError {
    let definition = edge.definition();
    if definition.is_implicit() {
        GraphError::ImplicitRelationship {
            action: op.to_string(),
            kind: edge.identifier().kind.clone(),
            field: definition.key.clone(),
        }
    } else {
        GraphError::InvalidOperation(format!(
            "{op} cannot target {}.{}, which is a {} relationship",
            edge.identifier(),
            definition.key,
            definition.kind
        ))
    }
}

fn resource_mut<'g>(
    graph: &'g mut Graph,
    record: &Identifier,
    field: &str,
    op: &str,
) -> Result<&'g mut ResourceEdge, GraphError> {
    match graph.edge_mut(record, field)? {
        Edge::Resource(edge) => Ok(edge),
        edge => Err(shape_error(edge, op)),
    }
}

fn collection_mut<'g>(
    graph: &'g mut Graph,
    record: &Identifier,
    field: &str,
    op: &str,
) -> Result<&'g mut CollectionEdge, GraphError> {
    match graph.edge_mut(record, field)? {
        Edge::Collection(edge) => Ok(edge),
        edge => Err(shape_error(edge, op)),
    }
}

/// Make `holder.field` hold `target` on the `origin` side.
///
/// A belongsTo that already held something else severs that value's inverse. The edge is
/// materialized if it does not exist yet.
pub(crate) fn attach(
    graph: &mut Graph,
    holder: &Identifier,
    field: &str,
    target: &Identifier,
    origin: EventOrigin,
) -> Result<(), GraphError> {
    if !origin.is_remote() {
        graph.sync_pending(holder, field);
    }
    let edge = graph.edge_mut(holder, field)?;
    let inverse_key = edge.definition().inverse_key.clone();
    match edge {
        Edge::Resource(edge) => match origin {
            EventOrigin::Remote => {
                edge.state.receive();
                let previous = edge
                    .remote_state
                    .replace(target.clone())
                    .filter(|previous| previous != target);
                let old_local = (edge.local_state.as_ref() != Some(target))
                    .then(|| edge.local_state.replace(target.clone()));
                edge.state.set_empty(false);

                if let Some(previous) = &previous {
                    detach(graph, previous, &inverse_key, holder, EventOrigin::Remote);
                }
                if let Some(old_local) = old_local {
                    graph.notify(holder, field);
                    if let Some(old) = old_local.filter(|old| Some(old) != previous.as_ref()) {
                        detach(graph, &old, &inverse_key, holder, EventOrigin::Local);
                    }
                }
            }
            EventOrigin::Local => {
                if edge.local_state.as_ref() == Some(target) {
                    return Ok(());
                }
                let old = edge.local_state.replace(target.clone());
                edge.state.set_empty(false);
                graph.notify(holder, field);
                if let Some(old) = old {
                    detach(graph, &old, &inverse_key, holder, EventOrigin::Local);
                }
            }
        },
        Edge::Collection(edge) => match origin {
            EventOrigin::Remote => {
                if edge.add_remote(target, None) {
                    graph.mark_for_sync(holder, field);
                }
            }
            EventOrigin::Local => {
                if edge.add_local(target, None) {
                    graph.notify(holder, field);
                }
            }
        },
        Edge::Implicit(edge) => {
            edge.add(target, origin);
        }
    }
    graph.add_to_transaction(holder, field);
    Ok(())
}

/// Make `holder.field` let go of `target` on the `origin` side. Edges that were never
/// materialized, or were vacated by an unload, are left alone.
pub(crate) fn detach(
    graph: &mut Graph,
    holder: &Identifier,
    field: &str,
    target: &Identifier,
    origin: EventOrigin,
) {
    if !origin.is_remote() {
        graph.sync_pending(holder, field);
    }
    let Some(edge) = graph.loaded_edge_mut(holder, field) else {
        return;
    };
    match edge {
        Edge::Resource(edge) => {
            let held_remotely = edge.remote_state.as_ref() == Some(target);
            if origin.is_remote() && held_remotely {
                edge.remote_state = None;
                edge.state.receive();
            }
            // A remote removal only clears local state that was mirroring it.
            let clears_local = match origin {
                EventOrigin::Remote => held_remotely,
                EventOrigin::Local => true,
            };
            if clears_local && edge.local_state.as_ref() == Some(target) {
                edge.local_state = None;
                edge.state.set_empty(true);
                graph.notify(holder, field);
            }
        }
        Edge::Collection(edge) => match origin {
            EventOrigin::Remote => {
                if edge.remove_remote(target) {
                    graph.mark_for_sync(holder, field);
                }
            }
            EventOrigin::Local => {
                if edge.remove_local(target) {
                    graph.notify(holder, field);
                }
            }
        },
        Edge::Implicit(edge) => {
            edge.remove(target, origin);
        }
    }
    if origin.is_remote() {
        graph.add_to_transaction(holder, field);
    }
}

/// Drop every trace of `target` from `holder.field`, local and remote alike.
pub(crate) fn remove_completely(
    graph: &mut Graph,
    holder: &Identifier,
    field: &str,
    target: &Identifier,
) {
    let Some(edge) = graph.loaded_edge_mut(holder, field) else {
        return;
    };
    if edge.remove_completely(target) {
        graph.notify(holder, field);
        graph.add_to_transaction(holder, field);
    }
}
