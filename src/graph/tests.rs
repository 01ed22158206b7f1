//! Tests for Graph functionality

use super::*;
use crate::{
    config::GraphConfig,
    error::GraphError,
    event::{EventOrigin, GraphEvent, Operation, PayloadData, RelationshipPayload},
    graph::definition::implicit_key_for,
    properties::Identifier,
    scheduler::FlushQueue,
    tests::helpers::{blog_graph, blog_schema, comment, post, tag, user},
};
use test_log::test;

fn replace_one(record: &Identifier, field: &str, value: Option<Identifier>) -> Operation {
    Operation::ReplaceRelatedRecord {
        record: record.clone(),
        field: field.to_string(),
        value,
    }
}

fn replace_many(record: &Identifier, field: &str, value: Vec<Identifier>) -> Operation {
    Operation::ReplaceRelatedRecords {
        record: record.clone(),
        field: field.to_string(),
        value,
    }
}

fn add(record: &Identifier, field: &str, value: Identifier, index: Option<usize>) -> Operation {
    Operation::AddToRelatedRecords {
        record: record.clone(),
        field: field.to_string(),
        value: value.into(),
        index,
    }
}

fn remove(record: &Identifier, field: &str, value: Identifier) -> Operation {
    Operation::RemoveFromRelatedRecords {
        record: record.clone(),
        field: field.to_string(),
        value: value.into(),
        index: None,
    }
}

fn update_relationship(record: &Identifier, field: &str, value: RelationshipPayload) -> Operation {
    Operation::UpdateRelationship {
        record: record.clone(),
        field: field.to_string(),
        value,
    }
}

fn local_of(graph: &mut Graph, record: &Identifier, field: &str) -> Vec<Identifier> {
    graph.get(record, field).unwrap().local_related()
}

#[test]
fn test_get_is_lazy() {
    let (mut graph, ..) = blog_graph();
    let p1 = post("1");
    assert!(!graph.has(&p1, "comments").unwrap());
    assert_eq!(graph.node_count(), 0);

    let edge = graph.get(&p1, "comments").unwrap();
    assert!(edge.as_collection().is_some());
    assert_eq!(edge.identifier(), &p1);
    assert!(graph.has(&p1, "comments").unwrap());
    assert!(!graph.has(&p1, "author").unwrap());
    assert_eq!(graph.node_count(), 1);

    let err = graph.get(&post("2"), "nope").unwrap_err();
    assert_eq!(
        err,
        GraphError::UnknownRelationship {
            kind: "post".to_string(),
            field: "nope".to_string()
        }
    );
    assert_eq!(graph.node_count(), 1);
}

#[test]
fn test_local_belongs_to_mirrors_inverse() {
    let (mut graph, notifier, _) = blog_graph();
    let (p1, c1) = (post("1"), comment("1"));

    graph
        .update(replace_one(&c1, "post", Some(p1.clone())), EventOrigin::Local)
        .unwrap();
    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![c1.clone()]);
    assert_eq!(notifier.count_for(&c1, "post"), 1);
    assert_eq!(notifier.count_for(&p1, "comments"), 1);
    assert!(graph.check_invariants().is_empty());

    // Moving the comment severs the previous post.
    let p2 = post("2");
    graph
        .update(replace_one(&c1, "post", Some(p2.clone())), EventOrigin::Local)
        .unwrap();
    assert!(local_of(&mut graph, &p1, "comments").is_empty());
    assert_eq!(local_of(&mut graph, &p2, "comments"), vec![c1.clone()]);

    graph
        .update(replace_one(&c1, "post", None), EventOrigin::Local)
        .unwrap();
    assert!(local_of(&mut graph, &p2, "comments").is_empty());
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_remote_belongs_to_moves_between_collections() {
    let (mut graph, ..) = blog_graph();
    let (p1, p2, c1) = (post("1"), post("2"), comment("1"));

    graph
        .update(replace_one(&c1, "post", Some(p1.clone())), EventOrigin::Remote)
        .unwrap();
    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![c1.clone()]);

    graph
        .update(replace_one(&c1, "post", Some(p2.clone())), EventOrigin::Remote)
        .unwrap();
    assert!(local_of(&mut graph, &p1, "comments").is_empty());
    assert_eq!(local_of(&mut graph, &p2, "comments"), vec![c1.clone()]);
    assert_eq!(
        graph.get_data(&c1, "post").unwrap().data,
        Some(PayloadData::One(Some(p2)))
    );
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_add_and_remove_are_idempotent() {
    let (mut graph, notifier, _) = blog_graph();
    let (p1, c1) = (post("1"), comment("1"));

    graph
        .update(add(&p1, "comments", c1.clone(), None), EventOrigin::Local)
        .unwrap();
    let once = graph.get_data(&p1, "comments").unwrap();
    let once_inverse = local_of(&mut graph, &c1, "post");
    graph
        .update(add(&p1, "comments", c1.clone(), None), EventOrigin::Local)
        .unwrap();
    assert_eq!(graph.get_data(&p1, "comments").unwrap(), once);
    assert_eq!(local_of(&mut graph, &c1, "post"), once_inverse);
    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![c1.clone()]);
    assert_eq!(notifier.count_for(&p1, "comments"), 1);

    graph
        .update(remove(&p1, "comments", c1.clone()), EventOrigin::Local)
        .unwrap();
    graph
        .update(remove(&p1, "comments", c1.clone()), EventOrigin::Local)
        .unwrap();
    assert!(local_of(&mut graph, &p1, "comments").is_empty());
    assert!(local_of(&mut graph, &c1, "post").is_empty());
    assert_eq!(notifier.count_for(&p1, "comments"), 2);
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_add_at_index_inserts_consecutively() {
    let (mut graph, ..) = blog_graph();
    let p1 = post("1");
    graph
        .update(
            replace_many(&p1, "comments", vec![comment("1"), comment("2")]),
            EventOrigin::Local,
        )
        .unwrap();
    graph
        .update(
            Operation::AddToRelatedRecords {
                record: p1.clone(),
                field: "comments".to_string(),
                value: vec![comment("3"), comment("4")].into(),
                index: Some(1),
            },
            EventOrigin::Local,
        )
        .unwrap();
    assert_eq!(
        local_of(&mut graph, &p1, "comments"),
        vec![comment("1"), comment("3"), comment("4"), comment("2")]
    );
}

#[test]
fn test_has_received_data_is_monotonic() {
    let (mut graph, ..) = blog_graph();
    let (p1, c1) = (post("1"), comment("1"));

    graph
        .update(add(&p1, "comments", c1.clone(), None), EventOrigin::Local)
        .unwrap();
    assert_eq!(graph.get_data(&p1, "comments").unwrap().data, None);

    graph
        .update(replace_many(&p1, "comments", vec![]), EventOrigin::Remote)
        .unwrap();
    assert!(graph
        .get(&p1, "comments")
        .unwrap()
        .state()
        .unwrap()
        .has_received_data());
    // The pending local addition survives the empty remote state.
    assert_eq!(
        graph.get_data(&p1, "comments").unwrap().data,
        Some(PayloadData::Many(vec![c1.clone()]))
    );

    graph
        .update(remove(&p1, "comments", c1), EventOrigin::Local)
        .unwrap();
    assert_eq!(
        graph.get_data(&p1, "comments").unwrap().data,
        Some(PayloadData::Many(vec![]))
    );
}

#[test]
fn test_replace_related_records_keeps_given_order() {
    let (mut graph, ..) = blog_graph();
    let p1 = post("1");
    let (c1, c2, c3) = (comment("1"), comment("2"), comment("3"));
    graph
        .update(
            replace_many(&p1, "comments", vec![c1.clone(), c2.clone()]),
            EventOrigin::Remote,
        )
        .unwrap();
    graph
        .update(
            replace_many(
                &p1,
                "comments",
                vec![c3.clone(), c1.clone(), c3.clone()],
            ),
            EventOrigin::Remote,
        )
        .unwrap();
    assert_eq!(
        local_of(&mut graph, &p1, "comments"),
        vec![c3.clone(), c1.clone()]
    );
    assert!(local_of(&mut graph, &c2, "post").is_empty());
    assert_eq!(local_of(&mut graph, &c3, "post"), vec![p1]);
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_local_removal_drops_implicit_inverse() {
    let (mut graph, ..) = blog_graph();
    let (p1, t1) = (post("1"), tag("1"));
    let implicit = implicit_key_for("post", "tags");

    graph
        .update(replace_many(&p1, "tags", vec![t1.clone()]), EventOrigin::Remote)
        .unwrap();
    graph.flush().unwrap();
    let inverse = graph.get(&t1, &implicit).unwrap().as_implicit().unwrap();
    assert!(inverse.local_members().contains(&p1));

    graph
        .update(remove(&p1, "tags", t1.clone()), EventOrigin::Local)
        .unwrap();
    let inverse = graph.get(&t1, &implicit).unwrap().as_implicit().unwrap();
    assert!(!inverse.local_members().contains(&p1));
    assert!(inverse.remote_members().contains(&p1));
    assert_eq!(
        graph.get_data(&p1, "tags").unwrap().data,
        Some(PayloadData::Many(vec![]))
    );
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_implicit_edges_refuse_payload_access() {
    let (mut graph, ..) = blog_graph();
    let (p1, t1) = (post("1"), tag("1"));
    let implicit = implicit_key_for("post", "tags");
    graph
        .update(add(&p1, "tags", t1.clone(), None), EventOrigin::Local)
        .unwrap();

    assert!(matches!(
        graph.get_data(&t1, &implicit),
        Err(GraphError::ImplicitRelationship { .. })
    ));
    assert!(matches!(
        graph.push(update_relationship(&t1, &implicit, RelationshipPayload::default())),
        Err(GraphError::ImplicitRelationship { .. })
    ));
    assert!(matches!(
        graph.update(replace_many(&t1, &implicit, vec![]), EventOrigin::Local),
        Err(GraphError::ImplicitRelationship { .. })
    ));
}

#[test]
fn test_remote_only_operations_reject_local_origin() {
    let (mut graph, ..) = blog_graph();
    let err = graph
        .update(
            Operation::DeleteRecord {
                record: comment("1"),
            },
            EventOrigin::Local,
        )
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::RemoteOnly {
            op: "deleteRecord".to_string()
        }
    );
    assert!(err.is_precondition());
    assert!(graph
        .update(
            update_relationship(&post("1"), "comments", RelationshipPayload::default()),
            EventOrigin::Local
        )
        .is_err());
}

#[test]
fn test_shape_mismatch_is_rejected() {
    let (mut graph, ..) = blog_graph();
    assert!(matches!(
        graph.update(
            add(&comment("1"), "post", post("1"), None),
            EventOrigin::Local
        ),
        Err(GraphError::InvalidOperation(_))
    ));
    assert!(matches!(
        graph.update(
            replace_one(&post("1"), "comments", Some(comment("1"))),
            EventOrigin::Local
        ),
        Err(GraphError::InvalidOperation(_))
    ));
}

#[test]
fn test_push_delete_record_then_flush() {
    let (mut graph, _, scheduler) = blog_graph();
    let (p1, c1) = (post("1"), comment("1"));
    graph
        .update(replace_many(&p1, "comments", vec![c1.clone()]), EventOrigin::Remote)
        .unwrap();
    graph.flush().unwrap();
    scheduler.drain();

    graph
        .push(Operation::DeleteRecord { record: c1.clone() })
        .unwrap();
    assert_eq!(graph.pending_operations(), 1);
    assert_eq!(scheduler.requests(), vec![FlushQueue::Coalesce]);
    for queue in scheduler.drain() {
        graph.run_queue(queue).unwrap();
    }

    assert!(graph.node(&c1).is_none());
    assert!(!graph.has(&c1, "post").unwrap());
    assert_eq!(
        graph.get_data(&p1, "comments").unwrap().data,
        Some(PayloadData::Many(vec![]))
    );
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_flush_applies_deletions_then_has_many_then_belongs_to() {
    let (mut graph, notifier, _) = blog_graph();
    let (p1, p2) = (post("1"), post("2"));
    let (c1, c2, c3) = (comment("1"), comment("2"), comment("3"));
    graph
        .update(
            replace_many(&p1, "comments", vec![c1.clone(), c2.clone()]),
            EventOrigin::Remote,
        )
        .unwrap();
    graph.flush().unwrap();
    notifier.take();

    // Arrival order is the reverse of application order.
    graph
        .push(replace_one(&c3, "post", Some(p2.clone())))
        .unwrap();
    graph
        .push(replace_many(&p1, "comments", vec![c1.clone(), c3.clone()]))
        .unwrap();
    graph
        .push(Operation::DeleteRecord { record: c1.clone() })
        .unwrap();
    graph.flush().unwrap();

    // The deletion ran first, so the hasMany update re-created c1.
    assert!(graph.node(&c1).is_some());
    // The belongsTo update ran last, so c3 ends up on post:2.
    assert_eq!(
        graph.get_data(&c3, "post").unwrap().data,
        Some(PayloadData::One(Some(p2.clone())))
    );
    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![c1.clone()]);
    assert_eq!(local_of(&mut graph, &p2, "comments"), vec![c3.clone()]);
    assert!(local_of(&mut graph, &c2, "post").is_empty());

    assert!(!graph.in_transaction());
    assert_eq!(graph.get(&p1, "comments").unwrap().transaction_ref(), 0);
    assert_eq!(graph.get(&c3, "post").unwrap().transaction_ref(), 0);
    let settled = notifier
        .events()
        .into_iter()
        .filter(|event| matches!(event, GraphEvent::TransactionSettled { .. }))
        .count();
    assert_eq!(settled, 1);
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_flush_notifies_each_relationship_once() {
    let (mut graph, notifier, scheduler) = blog_graph();
    let (p1, c1, c2) = (post("1"), comment("1"), comment("2"));

    graph
        .push(replace_many(&p1, "comments", vec![c1.clone()]))
        .unwrap();
    graph
        .push(add(&p1, "comments", c2.clone(), None))
        .unwrap();
    graph.push(remove(&p1, "comments", c1.clone())).unwrap();
    assert_eq!(scheduler.requests(), vec![FlushQueue::Coalesce]);
    assert!(graph.pending_queues().contains(FlushQueue::Coalesce));

    graph.run_queue(FlushQueue::Coalesce).unwrap();
    assert_eq!(scheduler.requests(), vec![FlushQueue::Coalesce, FlushQueue::Sync]);
    assert!(!graph.pending_queues().contains(FlushQueue::Coalesce));
    graph.run_queue(FlushQueue::Sync).unwrap();
    assert!(graph.pending_queues().is_empty());

    assert_eq!(notifier.count_for(&p1, "comments"), 1);
    assert_eq!(notifier.count_for(&c1, "post"), 1);
    assert_eq!(notifier.count_for(&c2, "post"), 1);
    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![c2]);
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_flush_reports_first_error_and_applies_the_rest() {
    let (mut graph, ..) = blog_graph();
    let (p1, c1, c2) = (post("1"), comment("1"), comment("2"));
    graph
        .push(replace_one(&c1, "post", Some(user("1"))))
        .unwrap();
    graph
        .push(replace_one(&c2, "post", Some(p1.clone())))
        .unwrap();
    assert!(matches!(
        graph.flush(),
        Err(GraphError::TypeMismatch { .. })
    ));
    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![c2]);
    assert!(local_of(&mut graph, &c1, "post").is_empty());
}

#[test]
fn test_local_diff_survives_remote_updates() {
    let (mut graph, ..) = blog_graph();
    let p1 = post("1");
    let (c1, c2, c3, c4) = (comment("1"), comment("2"), comment("3"), comment("4"));
    graph
        .update(
            replace_many(&p1, "comments", vec![c1.clone(), c2.clone()]),
            EventOrigin::Remote,
        )
        .unwrap();
    graph.flush().unwrap();

    graph
        .update(add(&p1, "comments", c3.clone(), Some(0)), EventOrigin::Local)
        .unwrap();
    graph
        .update(add(&p1, "comments", c4.clone(), None), EventOrigin::Remote)
        .unwrap();
    assert_eq!(
        local_of(&mut graph, &p1, "comments"),
        vec![c3.clone(), c1.clone(), c2.clone(), c4.clone()]
    );

    // Remote confirms the local addition; nothing is pending any more.
    graph
        .update(
            replace_many(&p1, "comments", vec![c3.clone(), c1, c2, c4]),
            EventOrigin::Remote,
        )
        .unwrap();
    graph.flush().unwrap();
    let edge = graph.get(&p1, "comments").unwrap().as_collection().unwrap();
    assert!(edge.additions().is_empty());
    assert!(edge.removals().is_empty());
    assert_eq!(edge.local().as_slice(), edge.remote().as_slice());
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_remote_null_keeps_unsaved_local_value() {
    let (mut graph, ..) = blog_graph();
    let c1 = comment("1");
    let draft = Identifier::local("post");
    assert!(draft.is_new());

    graph
        .update(replace_one(&c1, "post", Some(draft.clone())), EventOrigin::Local)
        .unwrap();
    graph
        .update(replace_one(&c1, "post", None), EventOrigin::Remote)
        .unwrap();
    assert_eq!(
        graph.get_data(&c1, "post").unwrap().data,
        Some(PayloadData::One(Some(draft.clone())))
    );
    assert_eq!(local_of(&mut graph, &draft, "comments"), vec![c1]);
}

#[test]
fn test_merge_identifiers_rekeys_references() {
    let (mut graph, ..) = blog_graph();
    let p1 = post("1");
    let temp = Identifier::local("comment");
    let c1 = comment("1");

    graph
        .update(add(&p1, "comments", temp.clone(), None), EventOrigin::Local)
        .unwrap();
    graph
        .update(
            Operation::MergeIdentifiers {
                record: temp.clone(),
                value: c1.clone(),
            },
            EventOrigin::Local,
        )
        .unwrap();

    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![c1.clone()]);
    assert!(graph.node(&temp).is_none());
    let moved = graph.get(&c1, "post").unwrap();
    assert_eq!(moved.identifier(), &c1);
    assert_eq!(moved.as_resource().unwrap().local_state(), Some(&p1));
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_merge_identifiers_prefers_existing_belongs_to() {
    let (mut graph, ..) = blog_graph();
    let (p1, p2) = (post("1"), post("2"));
    let temp = Identifier::local("comment");
    let c1 = comment("1");

    graph
        .update(replace_one(&c1, "post", Some(p1.clone())), EventOrigin::Local)
        .unwrap();
    graph
        .update(replace_one(&temp, "post", Some(p2.clone())), EventOrigin::Local)
        .unwrap();
    graph
        .update(
            Operation::MergeIdentifiers {
                record: temp,
                value: c1.clone(),
            },
            EventOrigin::Local,
        )
        .unwrap();

    assert_eq!(local_of(&mut graph, &c1, "post"), vec![p1.clone()]);
    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![c1]);
    assert!(local_of(&mut graph, &p2, "comments").is_empty());
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_releasability() {
    let (mut graph, ..) = blog_graph();
    let (u1, u2, p1) = (user("1"), user("2"), post("1"));
    graph
        .update(add(&u1, "friends", u2.clone(), None), EventOrigin::Local)
        .unwrap();
    assert!(graph.is_releasable(&u1).unwrap());
    assert!(graph.is_releasable(&user("never-seen")).unwrap());

    // comment.post is async, so post.comments has an async inverse.
    graph.get(&p1, "comments").unwrap();
    assert!(!graph.is_releasable(&p1).unwrap());
}

#[test]
fn test_unload_keeps_node_and_severs_inverses() {
    let (mut graph, ..) = blog_graph();
    let (p1, c1, t1) = (post("1"), comment("1"), tag("1"));
    let implicit = implicit_key_for("post", "tags");
    graph
        .update(replace_many(&p1, "comments", vec![c1.clone()]), EventOrigin::Remote)
        .unwrap();
    graph
        .update(replace_many(&p1, "tags", vec![t1.clone()]), EventOrigin::Remote)
        .unwrap();
    graph.flush().unwrap();

    graph.unload(&c1).unwrap();
    assert!(graph.node(&c1).is_some());
    assert!(graph.has(&c1, "post").unwrap());
    assert!(graph.get(&c1, "post").unwrap().all_related().is_empty());
    assert!(graph.get(&p1, "comments").unwrap().all_related().is_empty());

    graph.unload(&t1).unwrap();
    assert!(graph.node(&t1).is_some());
    assert!(!graph.has(&t1, &implicit).unwrap());
    assert!(graph.get(&p1, "tags").unwrap().all_related().is_empty());
    // A later access recreates the implicit edge fresh.
    assert!(graph
        .get(&t1, &implicit)
        .unwrap()
        .all_related()
        .is_empty());
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_remove_deletes_node() {
    let (mut graph, ..) = blog_graph();
    let (u1, u2) = (user("1"), user("2"));
    graph
        .update(add(&u1, "friends", u2.clone(), None), EventOrigin::Local)
        .unwrap();
    graph.remove(&u2).unwrap();
    assert!(graph.node(&u2).is_none());
    assert!(local_of(&mut graph, &u1, "friends").is_empty());
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_reflexive_and_self_referential_relationships() {
    let (mut graph, ..) = blog_graph();
    let (u1, u2) = (user("1"), user("2"));
    graph
        .update(add(&u1, "friends", u2.clone(), None), EventOrigin::Local)
        .unwrap();
    assert_eq!(local_of(&mut graph, &u2, "friends"), vec![u1.clone()]);

    let (n1, n2, n3) = (
        Identifier::new("node", "1"),
        Identifier::new("node", "2"),
        Identifier::new("node", "3"),
    );
    graph
        .update(
            Operation::AddToRelatedRecords {
                record: n1.clone(),
                field: "children".to_string(),
                value: vec![n2.clone(), n3.clone()].into(),
                index: None,
            },
            EventOrigin::Local,
        )
        .unwrap();
    assert_eq!(local_of(&mut graph, &n2, "parent"), vec![n1.clone()]);

    graph
        .update(replace_one(&n3, "parent", Some(n2.clone())), EventOrigin::Local)
        .unwrap();
    assert_eq!(local_of(&mut graph, &n1, "children"), vec![n2.clone()]);
    assert_eq!(local_of(&mut graph, &n2, "children"), vec![n3]);
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_one_to_one_steals_value() {
    let (mut graph, ..) = blog_graph();
    let (u1, u2) = (user("1"), user("2"));
    let profile = Identifier::new("profile", "1");
    graph
        .update(replace_one(&u1, "profile", Some(profile.clone())), EventOrigin::Local)
        .unwrap();
    graph
        .update(replace_one(&u2, "profile", Some(profile.clone())), EventOrigin::Local)
        .unwrap();
    assert!(local_of(&mut graph, &u1, "profile").is_empty());
    assert_eq!(local_of(&mut graph, &profile, "user"), vec![u2]);
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_polymorphic_field_registers_equivalence() {
    let (mut graph, ..) = blog_graph();
    let c1 = comment("1");
    let image = Identifier::new("image", "1");
    graph
        .update(replace_one(&c1, "attachment", Some(image.clone())), EventOrigin::Local)
        .unwrap();
    assert!(graph.is_polymorphic_equivalent("image", "attachment").unwrap());
    let inverse = graph
        .get(&image, &implicit_key_for("comment", "attachment"))
        .unwrap();
    assert!(inverse.is_implicit());
    assert!(inverse.contains(&c1, EventOrigin::Local));
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_type_mismatch_depends_on_validation() {
    let (mut graph, ..) = blog_graph();
    let c1 = comment("1");
    let err = graph
        .update(replace_one(&c1, "post", Some(user("1"))), EventOrigin::Local)
        .unwrap_err();
    assert!(matches!(err, GraphError::TypeMismatch { .. }));
    assert!(local_of(&mut graph, &c1, "post").is_empty());

    let mut trusting = Graph::new(blog_schema()).with_config(GraphConfig::trusting());
    trusting
        .update(replace_one(&c1, "post", Some(user("1"))), EventOrigin::Local)
        .unwrap();
    assert!(trusting.is_polymorphic_equivalent("user", "post").unwrap());
    assert_eq!(local_of(&mut trusting, &user("1"), "comments"), vec![c1]);
}

#[test]
fn test_inconsistent_payload_handling() {
    let (p1, c1) = (post("1"), comment("1"));
    let payload = RelationshipPayload::with_data(PayloadData::One(Some(c1.clone())));

    let mut validating = Graph::new(blog_schema()).with_config(GraphConfig::validating());
    validating
        .update(
            update_relationship(&p1, "comments", payload.clone()),
            EventOrigin::Remote,
        )
        .unwrap();
    assert_eq!(validating.diagnostics().len(), 1);
    assert_eq!(validating.get_data(&p1, "comments").unwrap().data, None);

    let mut trusting = Graph::new(blog_schema()).with_config(GraphConfig::trusting());
    trusting
        .update(update_relationship(&p1, "comments", payload), EventOrigin::Remote)
        .unwrap();
    assert!(trusting.diagnostics().is_empty());
    assert_eq!(
        trusting.get_data(&p1, "comments").unwrap().data,
        Some(PayloadData::Many(vec![c1]))
    );
}

#[test]
fn test_update_relationship_links_and_meta() {
    let (mut graph, notifier, _) = blog_graph();
    let (p1, c1) = (post("1"), comment("1"));
    let links: crate::properties::Links =
        serde_json::from_str(r#"{"related": "/comments/1/post"}"#).unwrap();
    graph
        .update(
            update_relationship(
                &c1,
                "post",
                RelationshipPayload {
                    links: Some(links.clone()),
                    ..Default::default()
                },
            ),
            EventOrigin::Remote,
        )
        .unwrap();
    let state = *graph.get(&c1, "post").unwrap().state().unwrap();
    assert!(state.is_stale());
    // comment.post is async: no data means nothing is known yet.
    assert!(!state.has_received_data());
    assert_eq!(graph.get_data(&c1, "post").unwrap().links, Some(links));
    assert_eq!(notifier.count_for(&c1, "post"), 1);

    graph
        .update(
            update_relationship(
                &c1,
                "post",
                RelationshipPayload::with_data(PayloadData::One(Some(p1.clone()))),
            ),
            EventOrigin::Remote,
        )
        .unwrap();
    let state = *graph.get(&c1, "post").unwrap().state().unwrap();
    assert!(!state.is_stale());
    assert!(state.has_received_data());

    // post.author is sync, so a document without data means "empty".
    let meta: crate::properties::Meta = serde_json::from_str(r#"{"count": 0}"#).unwrap();
    graph
        .update(
            update_relationship(
                &p1,
                "author",
                RelationshipPayload {
                    meta: Some(meta.clone()),
                    ..Default::default()
                },
            ),
            EventOrigin::Remote,
        )
        .unwrap();
    let payload = graph.get_data(&p1, "author").unwrap();
    assert_eq!(payload.data, Some(PayloadData::One(None)));
    assert_eq!(payload.meta, Some(meta));
}

#[test]
fn test_destroyed_graph_refuses_calls() {
    let (mut graph, ..) = blog_graph();
    graph.get(&post("1"), "comments").unwrap();
    graph.push(replace_many(&post("1"), "comments", vec![])).unwrap();
    graph.destroy();
    assert!(graph.is_destroyed());
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.pending_operations(), 0);
    assert_eq!(
        graph.get(&post("1"), "comments").unwrap_err(),
        GraphError::Destroyed
    );
    assert_eq!(graph.flush().unwrap_err(), GraphError::Destroyed);
    assert_eq!(
        graph.has(&post("1"), "comments").unwrap_err(),
        GraphError::Destroyed
    );
    assert_eq!(graph.is_releasable(&post("1")).unwrap_err(), GraphError::Destroyed);
    assert_eq!(
        graph.register_polymorphic_type("image", "attachment").unwrap_err(),
        GraphError::Destroyed
    );
    assert_eq!(
        graph.is_polymorphic_equivalent("image", "attachment").unwrap_err(),
        GraphError::Destroyed
    );
    assert_eq!(
        graph.definition_for("post", "comments").unwrap_err(),
        GraphError::Destroyed
    );
}

#[test]
fn test_merge_identifiers_cannot_be_pushed() {
    let (mut graph, ..) = blog_graph();
    assert!(matches!(
        graph.push(Operation::MergeIdentifiers {
            record: comment("1"),
            value: comment("2"),
        }),
        Err(GraphError::InvalidOperation(_))
    ));
}

#[test]
fn test_definition_for_resolves_without_nodes() {
    let (mut graph, ..) = blog_graph();
    let definition = graph.definition_for("comment", "post").unwrap();
    assert_eq!(definition.inverse_key, "comments");
    assert!(definition.is_async);
    assert_eq!(graph.node_count(), 0);
    assert!(graph.identifiers().next().is_none());
}

/// Seed `post:1.comments` with two confirmed comments, then apply `remote` through the coalesce
/// queue only and `local` while the sync queue is still pending.
fn write_between_queues(remote: Operation, local: Operation) -> Graph {
    let (mut graph, ..) = blog_graph();
    graph
        .update(
            replace_many(&post("1"), "comments", vec![comment("1"), comment("2")]),
            EventOrigin::Remote,
        )
        .unwrap();
    graph.flush().unwrap();

    graph.push(remote).unwrap();
    graph.run_queue(FlushQueue::Coalesce).unwrap();
    assert!(graph.pending_queues().contains(FlushQueue::Sync));
    graph.update(local, EventOrigin::Local).unwrap();
    graph.flush().unwrap();
    assert_eq!(graph.check_invariants(), Vec::<String>::new());
    graph
}

#[test]
fn test_local_belongs_to_write_before_sync() {
    let (p1, p2, c3) = (post("1"), post("2"), comment("3"));
    let mut graph = write_between_queues(
        replace_one(&c3, "post", Some(p2.clone())),
        replace_one(&c3, "post", Some(p1.clone())),
    );
    assert!(local_of(&mut graph, &p2, "comments").is_empty());
    assert_eq!(
        local_of(&mut graph, &p1, "comments"),
        vec![comment("1"), comment("2"), c3.clone()]
    );
    assert_eq!(local_of(&mut graph, &c3, "post"), vec![p1]);
    assert_eq!(graph.get(&c3, "post").unwrap().remote_related(), vec![p2]);
}

#[test]
fn test_local_replace_many_before_sync() {
    let (p1, c3, c4) = (post("1"), comment("3"), comment("4"));
    let mut graph = write_between_queues(
        add(&p1, "comments", c3.clone(), None),
        replace_many(&p1, "comments", vec![comment("1"), c4.clone()]),
    );
    assert_eq!(
        local_of(&mut graph, &p1, "comments"),
        vec![comment("1"), c4.clone()]
    );
    assert!(local_of(&mut graph, &c3, "post").is_empty());
    assert!(local_of(&mut graph, &comment("2"), "post").is_empty());
    assert_eq!(local_of(&mut graph, &c4, "post"), vec![p1.clone()]);
    assert_eq!(graph.get(&c3, "post").unwrap().remote_related(), vec![p1]);
}

#[test]
fn test_local_remove_before_sync() {
    let (p1, c3) = (post("1"), comment("3"));
    let mut graph = write_between_queues(
        replace_many(&p1, "comments", vec![comment("2"), c3.clone()]),
        remove(&p1, "comments", c3.clone()),
    );
    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![comment("2")]);
    assert!(local_of(&mut graph, &c3, "post").is_empty());
    assert!(local_of(&mut graph, &comment("1"), "post").is_empty());
    let edge = graph.get(&p1, "comments").unwrap().as_collection().unwrap();
    assert_eq!(edge.removals().iter().collect::<Vec<_>>(), vec![&c3]);
}

#[test]
fn test_local_add_before_sync() {
    let (p1, c1) = (post("1"), comment("1"));
    let mut graph = write_between_queues(
        remove(&p1, "comments", c1.clone()),
        add(&p1, "comments", c1.clone(), None),
    );
    assert_eq!(
        local_of(&mut graph, &p1, "comments"),
        vec![comment("2"), c1.clone()]
    );
    assert_eq!(local_of(&mut graph, &c1, "post"), vec![p1]);
    assert!(graph.get(&c1, "post").unwrap().remote_related().is_empty());
}

#[test]
fn test_local_reflexive_replace_before_sync() {
    let (mut graph, ..) = blog_graph();
    let (u0, u1) = (user("0"), user("1"));
    graph.push(add(&u0, "friends", u1.clone(), None)).unwrap();
    graph.run_queue(FlushQueue::Coalesce).unwrap();
    graph
        .update(replace_many(&u0, "friends", vec![u0.clone()]), EventOrigin::Local)
        .unwrap();
    graph.flush().unwrap();

    assert_eq!(graph.check_invariants(), Vec::<String>::new());
    assert_eq!(local_of(&mut graph, &u0, "friends"), vec![u0.clone()]);
    assert!(local_of(&mut graph, &u1, "friends").is_empty());
    assert_eq!(graph.get(&u1, "friends").unwrap().remote_related(), vec![u0]);
}

#[test]
fn test_add_at_out_of_range_index_appends() {
    let (mut graph, ..) = blog_graph();
    let (p1, c1, c2) = (post("1"), comment("1"), comment("2"));
    graph
        .update(
            Operation::AddToRelatedRecords {
                record: p1.clone(),
                field: "comments".to_string(),
                value: vec![c1.clone(), c2.clone()].into(),
                index: Some(usize::MAX),
            },
            EventOrigin::Local,
        )
        .unwrap();
    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![c1, c2]);
    assert!(graph.check_invariants().is_empty());
}

#[test]
fn test_update_relationship_with_links_notifies_once() {
    let (mut graph, notifier, _) = blog_graph();
    let (p1, c1) = (post("1"), comment("1"));
    let links: crate::properties::Links =
        serde_json::from_str(r#"{"related": "/posts/1/comments"}"#).unwrap();
    graph
        .push(update_relationship(
            &p1,
            "comments",
            RelationshipPayload {
                data: Some(PayloadData::Many(vec![c1.clone()])),
                links: Some(links),
                meta: None,
            },
        ))
        .unwrap();
    graph.flush().unwrap();

    assert_eq!(notifier.count_for(&p1, "comments"), 1);
    assert_eq!(notifier.count_for(&c1, "post"), 1);
    assert_eq!(local_of(&mut graph, &p1, "comments"), vec![c1]);
}

#[test]
fn test_push_rejects_bad_targets_up_front() {
    let (mut graph, ..) = blog_graph();
    let (p1, c1) = (post("1"), comment("1"));

    assert!(matches!(
        graph.push(replace_one(&c1, "nope", Some(p1.clone()))),
        Err(GraphError::UnknownRelationship { .. })
    ));
    graph.definition_for("post", "tags").unwrap();
    let implicit = implicit_key_for("post", "tags");
    assert!(matches!(
        graph.push(replace_one(&tag("1"), &implicit, Some(p1.clone()))),
        Err(GraphError::ImplicitRelationship { .. })
    ));
    assert!(matches!(
        graph.push(replace_one(&p1, "comments", Some(c1.clone()))),
        Err(GraphError::InvalidOperation(_))
    ));
    assert!(matches!(
        graph.push(add(&c1, "post", p1.clone(), None)),
        Err(GraphError::InvalidOperation(_))
    ));
    assert_eq!(graph.pending_operations(), 0);
    assert!(graph.pending_queues().is_empty());
}
