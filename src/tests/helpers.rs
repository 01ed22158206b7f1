//! Shared test utilities for graph testing

use crate::{
    event::RecordingNotifier,
    graph::Graph,
    properties::Identifier,
    scheduler::ManualScheduler,
    schema::{RelationshipSchema, SchemaRegistry},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A small blog model exercising every relationship shape:
///
/// - `post.comments` <-> `comment.post` (hasMany / async belongsTo)
/// - `post.author` <-> `user.posts` (belongsTo / hasMany)
/// - `user.friends` <-> `user.friends` (reflexive hasMany)
/// - `user.profile` <-> `profile.user` (one-to-one)
/// - `node.children` <-> `node.parent` (self-referential tree)
/// - `post.tags` (hasMany, no inverse: tracked implicitly on `tag`)
/// - `comment.attachment` (polymorphic belongsTo, no inverse)
pub fn blog_schema() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry.register_pair(
        ("post", "comments", RelationshipSchema::has_many("comment")),
        ("comment", "post", RelationshipSchema::belongs_to("post").async_()),
    );
    registry.register_pair(
        ("post", "author", RelationshipSchema::belongs_to("user")),
        ("user", "posts", RelationshipSchema::has_many("post")),
    );
    registry.register(
        "user",
        "friends",
        RelationshipSchema::has_many("user").inverse("friends"),
    );
    registry.register_pair(
        ("user", "profile", RelationshipSchema::belongs_to("profile")),
        ("profile", "user", RelationshipSchema::belongs_to("user")),
    );
    registry.register_pair(
        ("node", "children", RelationshipSchema::has_many("node")),
        ("node", "parent", RelationshipSchema::belongs_to("node")),
    );
    registry.register("post", "tags", RelationshipSchema::has_many("tag"));
    registry.register(
        "comment",
        "attachment",
        RelationshipSchema::belongs_to("attachment").polymorphic(),
    );
    registry
}

/// A graph over [blog_schema] with a recording notifier and a manual scheduler.
pub fn blog_graph() -> (Graph, RecordingNotifier, ManualScheduler) {
    init_logging();
    let notifier = RecordingNotifier::new();
    let scheduler = ManualScheduler::new();
    let graph = Graph::new(blog_schema())
        .with_notifier(notifier.clone())
        .with_scheduler(scheduler.clone());
    (graph, notifier, scheduler)
}

pub fn post(id: &str) -> Identifier {
    Identifier::new("post", id)
}

pub fn comment(id: &str) -> Identifier {
    Identifier::new("comment", id)
}

pub fn user(id: &str) -> Identifier {
    Identifier::new("user", id)
}

pub fn tag(id: &str) -> Identifier {
    Identifier::new("tag", id)
}
