//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use relgraph_core::{
    event::RecordingNotifier,
    graph::Graph,
    properties::Identifier,
    schema::{RelationshipSchema, SchemaRegistry},
};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; later calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Library model: authors write books, books belong to a shelf, books have many chapters
/// (async), and books are tagged with genres that declare no inverse.
#[allow(dead_code)]
pub fn library_schema() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry.register_pair(
        ("author", "books", RelationshipSchema::has_many("book")),
        ("book", "author", RelationshipSchema::belongs_to("author")),
    );
    registry.register_pair(
        ("shelf", "books", RelationshipSchema::has_many("book")),
        ("book", "shelf", RelationshipSchema::belongs_to("shelf")),
    );
    registry.register_pair(
        ("book", "chapters", RelationshipSchema::has_many("chapter").async_()),
        ("chapter", "book", RelationshipSchema::belongs_to("book")),
    );
    registry.register("book", "genres", RelationshipSchema::has_many("genre"));
    registry
}

#[allow(dead_code)]
pub fn library_graph() -> (Graph, RecordingNotifier) {
    init_logging();
    let notifier = RecordingNotifier::new();
    let graph = Graph::new(library_schema()).with_notifier(notifier.clone());
    (graph, notifier)
}

#[allow(dead_code)]
pub fn id(kind: &str, id: &str) -> Identifier {
    Identifier::new(kind, id)
}

/// Panic with every violation the graph reports.
#[allow(dead_code)]
pub fn assert_consistent(graph: &Graph) {
    let errors = graph.check_invariants();
    assert!(errors.is_empty(), "graph invariants violated:\n{}", errors.join("\n"));
}
