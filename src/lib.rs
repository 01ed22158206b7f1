//! # relgraph-core
//!
//! A bidirectional relationship graph for client-side record caches.
//!
//! ## Overview
//!
//! relgraph-core keeps track of how cached records relate to one another without ever holding
//! the records themselves. Every relationship edge carries two views:
//!
//! - a **remote** view: the last state confirmed by the backing data source, and
//! - a **local** view: in-flight mutations the data source has not confirmed yet.
//!
//! Both sides of every relationship are kept symmetric. Setting `comment.post` also puts the
//! comment into `post.comments`, even when the schema never declared that inverse field (an
//! *implicit* edge tracks it instead).
//!
//! ### Key Features
//!
//! - **Lazy**: nodes and edges are created on first access; relationship definitions are
//!   resolved from a [`schema::SchemaCatalog`] once and cached per pair of types
//! - **Self-referential and polymorphic relationships**: tree-shaped relationships on a single
//!   type and fields that accept a registered family of types
//! - **Coalesced remote updates**: remote operations are queued and applied in one transaction
//!   in a fixed order (deletions, then hasMany, then belongsTo)
//! - **Local reconciliation**: collections keep their pending local additions and removals on
//!   top of whatever the remote side reports next
//! - **Batched notifications**: observers hear about each changed relationship at most once per
//!   mutation or flush
//!
//! ## Architecture
//!
//! - **[`graph`]**: the [`graph::Graph`], its edges and the operations that mutate them
//! - **[`event`]**: operations, payloads, change events and notifiers
//! - **[`properties`]**: record identifiers and relationship kinds
//! - **[`schema`]**: the schema catalog contract and an in-process registry
//! - **[`scheduler`]**: the deferred work queues and scheduler contract
//! - **[`config`]**: graph configuration (validation level)
//!
//! ## Quick Start
//!
//! ```rust
//! use relgraph_core::{
//!     event::{Operation, PayloadData, RelationshipPayload},
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
//!
//! let post = Identifier::new("post", "1");
//! let comment = Identifier::new("comment", "1");
//! graph
//!     .push(Operation::UpdateRelationship {
//!         record: post.clone(),
//!         field: "comments".to_string(),
//!         value: RelationshipPayload::with_data(PayloadData::Many(vec![comment.clone()])),
//!     })
//!     .unwrap();
//! graph.flush().unwrap();
//!
//! let data = graph.get_data(&comment, "post").unwrap().data;
//! assert_eq!(data, Some(PayloadData::One(Some(post))));
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod graph;
pub mod properties;
pub mod scheduler;
pub mod schema;
#[cfg(test)]
mod tests;

pub use error::*;
