use crate::{error::GraphError, event::EventOrigin, properties::Identifier};
use std::mem::replace;

use super::{attach, detach, resource_mut};
use crate::graph::base::Graph;

const OP: &str = "replaceRelatedRecord";

/// Set one side of a belongsTo to `value` (or clear it).
///
/// A remote write also overwrites local state, except that a local value pointing at an unsaved
/// record survives a remote `null`.
pub(crate) fn replace_related_record(
    graph: &mut Graph,
    record: &Identifier,
    field: &str,
    value: Option<Identifier>,
    origin: EventOrigin,
) -> Result<(), GraphError> {
    let definition = resource_mut(graph, record, field, OP)?.definition.clone();
    if let Some(value) = &value {
        graph.check_value_type(&definition, value)?;
    }
    let inverse_key = definition.inverse_key.as_str();
    graph.add_to_transaction(record, field);

    match origin {
        EventOrigin::Remote => {
            let edge = resource_mut(graph, record, field, OP)?;
            edge.state.receive();
            let previous = edge.remote_state.clone();
            let remote_changed = previous != value;
            if remote_changed {
                edge.remote_state = value.clone();
            }
            let keep_local =
                value.is_none() && edge.local_state.as_ref().is_some_and(Identifier::is_new);
            let old_local = (!keep_local && edge.local_state != value)
                .then(|| replace(&mut edge.local_state, value.clone()));
            edge.state.set_empty(edge.local_state.is_none());

            if remote_changed {
                if let Some(previous) = &previous {
                    detach(graph, previous, inverse_key, record, EventOrigin::Remote);
                }
                if let Some(value) = &value {
                    attach(graph, value, inverse_key, record, EventOrigin::Remote)?;
                }
            }
            if let Some(old_local) = old_local {
                graph.notify(record, field);
                let severed = remote_changed && previous == old_local;
                if let Some(old) = old_local.filter(|_| !severed) {
                    detach(graph, &old, inverse_key, record, EventOrigin::Local);
                }
                if !remote_changed {
                    if let Some(value) = &value {
                        attach(graph, value, inverse_key, record, EventOrigin::Local)?;
                    }
                }
            }
        }
        EventOrigin::Local => {
            let edge = resource_mut(graph, record, field, OP)?;
            if edge.local_state == value {
                return Ok(());
            }
            let old = replace(&mut edge.local_state, value.clone());
            edge.state.set_empty(value.is_none());
            graph.notify(record, field);
            if let Some(old) = &old {
                detach(graph, old, inverse_key, record, EventOrigin::Local);
            }
            if let Some(value) = &value {
                attach(graph, value, inverse_key, record, EventOrigin::Local)?;
            }
        }
    }
    Ok(())
}
