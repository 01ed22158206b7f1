use crate::{
    error::GraphError,
    event::{EventOrigin, PayloadData, RelationshipPayload},
    graph::{base::Graph, definition::EdgeDefinition},
    properties::{related_href, Identifier, RelationshipKind},
};
use std::collections::BTreeSet;

use super::{replace_related_record, replace_related_records};

/// Apply a remote relationship document: `meta` and `links` are stored as given, `data` replaces
/// remote state.
///
/// A hasMany document reconciles local membership right away.
///
/// A document that contradicts itself is dropped and recorded in [Graph::diagnostics] while
/// validation is enabled; otherwise it is coerced to the edge's shape and applied.
pub(crate) fn update_relationship(
    graph: &mut Graph,
    record: &Identifier,
    field: &str,
    payload: RelationshipPayload,
) -> Result<(), GraphError> {
    let edge = graph.edge_mut(record, field)?;
    let definition = edge.definition().clone();
    if definition.is_implicit() {
        return Err(GraphError::ImplicitRelationship {
            action: "update".to_string(),
            kind: record.kind.clone(),
            field: field.to_string(),
        });
    }

    let RelationshipPayload { data, links, meta } = payload;
    if let Some(data) = &data {
        let problems = consistency_problems(&definition, data);
        if !problems.is_empty() {
            if graph.config().validation.is_enabled() {
                graph.record_diagnostic(format!(
                    "[updateRelationship] dropped the payload for {record}.{field}: {}",
                    problems.join("; ")
                ));
                return Ok(());
            }
            tracing::debug!(
                "[updateRelationship] applying inconsistent payload for {record}.{field}: {}",
                problems.join("; ")
            );
        }
    }

    let mut changed = false;
    let mut data = data;
    if let Some((state, edge_meta, edge_links)) = graph.edge_mut(record, field)?.payload_fields_mut()
    {
        if let Some(meta) = meta {
            if edge_meta.as_ref() != Some(&meta) {
                *edge_meta = Some(meta);
                changed = true;
            }
        }
        if let Some(links) = links {
            let previous = edge_links.as_ref().and_then(related_href).map(str::to_string);
            let related = related_href(&links);
            if data.is_none() && related.is_some() && related != previous.as_deref() {
                state.mark_stale();
                changed = true;
            }
            if edge_links.as_ref() != Some(&links) {
                *edge_links = Some(links);
                changed = true;
            }
        }
        // A sync relationship that arrives without data is known to be empty.
        if data.is_none() && !definition.is_async && !state.has_received_data() {
            data = Some(match definition.kind {
                RelationshipKind::HasMany => PayloadData::Many(vec![]),
                _ => PayloadData::One(None),
            });
        }
    }

    if changed {
        graph.notify(record, field);
        graph.add_to_transaction(record, field);
    }
    match (definition.kind, data) {
        (_, None) => Ok(()),
        (RelationshipKind::HasMany, Some(data)) => {
            replace_related_records(graph, record, field, data.into_many(), EventOrigin::Remote)?;
            // Membership and meta/links reach observers in one notification.
            graph.sync_pending(record, field);
            Ok(())
        }
        (_, Some(data)) => {
            replace_related_record(graph, record, field, data.into_one(), EventOrigin::Remote)
        }
    }
}

fn consistency_problems(definition: &EdgeDefinition, data: &PayloadData) -> Vec<String> {
    let mut problems = vec![];
    match (definition.kind, data) {
        (RelationshipKind::HasMany, PayloadData::One(Some(value))) => problems.push(format!(
            "hasMany '{}' was given the single identifier {value}",
            definition.key
        )),
        (RelationshipKind::BelongsTo, PayloadData::Many(values)) => problems.push(format!(
            "belongsTo '{}' was given a list of {} identifiers",
            definition.key,
            values.len()
        )),
        _ => {}
    }
    if let PayloadData::Many(values) = data {
        let mut seen = BTreeSet::new();
        for value in values.iter() {
            if !seen.insert(value) {
                problems.push(format!("{value} is listed more than once"));
            }
        }
    }
    problems
}
