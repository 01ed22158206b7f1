use crate::{error::GraphError, graph::base::Graph, properties::Identifier};

use super::{detach, remove_completely};

/// Sever every relationship `record` takes part in, then drop its node.
pub(crate) fn delete_record(graph: &mut Graph, record: &Identifier) -> Result<(), GraphError> {
    let Some(node) = graph.take_node(record) else {
        tracing::trace!("[deleteRecord] {record} has no node");
        return Ok(());
    };
    for edge in node.values().flatten() {
        let inverse_key = &edge.definition().inverse_key;
        for value in edge.all_related().iter() {
            remove_completely(graph, value, inverse_key, record);
        }
    }
    graph.forget_pending(record);
    Ok(())
}

/// Retire `old` in favor of `new`: every reference to `old` is re-keyed and the node of `old`
/// moves to `new`.
///
/// When `new` already has an edge for a field, memberships are unioned. For a belongsTo the
/// value `new` already held wins, and the losing value's inverse is severed.
pub(crate) fn merge_identifiers(
    graph: &mut Graph,
    old: &Identifier,
    new: &Identifier,
) -> Result<(), GraphError> {
    if old == new {
        return Ok(());
    }
    let Some(old_node) = graph.take_node(old) else {
        tracing::trace!("[mergeIdentifiers] {old} has no node");
        return Ok(());
    };
    tracing::debug!(
        "[mergeIdentifiers] {old} -> {new} ({} relationships)",
        old_node.len()
    );

    for edge in old_node.values().flatten() {
        let inverse_key = &edge.definition().inverse_key;
        for value in edge.all_related().iter().filter(|value| *value != old) {
            let rekeyed = graph
                .loaded_edge_mut(value, inverse_key)
                .is_some_and(|inverse| inverse.rekey(old, new));
            if rekeyed {
                graph.notify(value, inverse_key);
                graph.add_to_transaction(value, inverse_key);
            }
        }
    }

    for (field, slot) in old_node {
        let Some(mut edge) = slot else {
            continue;
        };
        edge.rekey(old, new);
        edge.set_identifier(new.clone());
        let inverse_key = edge.definition().inverse_key.clone();
        let is_collection = edge.as_collection().is_some();
        let node = graph.node_mut(new);
        match node.get_mut(&field) {
            Some(Some(existing)) => {
                for (loser, origin) in existing.absorb(edge) {
                    detach(graph, &loser, &inverse_key, new, origin);
                }
            }
            _ => {
                node.insert(field.clone(), Some(edge));
            }
        }
        if is_collection {
            graph.mark_for_sync(new, &field);
        }
        graph.notify(new, &field);
        graph.add_to_transaction(new, &field);
    }
    graph.rekey_pending(old, new);
    Ok(())
}
