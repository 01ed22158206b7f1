//! Graph module: the relationship graph engine.
//!
//! # Module Organization
//!
//! - [`definition`]: lazy, cached resolution of relationship definitions
//! - [`state`]: per-edge state flags
//! - [`edge`]: the three edge shapes
//! - `operations`: the mutation operations, each mirroring its change onto inverse edges
//! - `base`: the [Graph] itself (node table, queues, transactions, notifications)
//!
//! ```rust
//! use relgraph_core::{
//!     event::{EventOrigin, Operation},
//!     graph::Graph,
//!     properties::Identifier,
//!     schema::{RelationshipSchema, SchemaRegistry},
//! };
//!
//! let schema = SchemaRegistry::new();
//! schema.register_pair(
//!     ("post", "comments", RelationshipSchema::has_many("comment")),
//!     ("comment", "post", RelationshipSchema::belongs_to("post")),
//! );
//! let mut graph = Graph::new(schema);
//! let post = Identifier::new("post", "1");
//! let comment = Identifier::new("comment", "1");
//! graph
//!     .update(
//!         Operation::ReplaceRelatedRecord {
//!             record: comment.clone(),
//!             field: "post".to_string(),
//!             value: Some(post.clone()),
//!         },
//!         EventOrigin::Local,
//!     )
//!     .unwrap();
//! let comments = graph.get(&post, "comments").unwrap();
//! assert_eq!(comments.local_related(), vec![comment]);
//! ```

mod base;
pub mod definition;
pub mod edge;
mod operations;
pub mod state;

#[cfg(test)]
mod tests;

pub use base::{Graph, Node};
pub use definition::{EdgeDefinition, RelationshipInfo};
pub use edge::{CollectionEdge, Edge, ImplicitEdge, OrderedMembers, ResourceEdge};
pub use state::EdgeState;
