use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::properties::{Identifier, Links, Meta};

/// Which view of an edge an operation writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EventOrigin {
    /// An in-flight mutation made by the application that the backing data source has not yet
    /// confirmed.
    Local,

    /// Authoritative state pushed from the backing data source.
    #[default]
    Remote,
}

impl EventOrigin {
    pub fn is_remote(&self) -> bool {
        matches!(self, EventOrigin::Remote)
    }
}

/// A single identifier or a list of them. Collection operations accept either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<Identifier>),
    One(Identifier),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<Identifier> {
        match self {
            OneOrMany::Many(values) => values,
            OneOrMany::One(value) => vec![value],
        }
    }
}

impl From<Identifier> for OneOrMany {
    fn from(value: Identifier) -> Self {
        OneOrMany::One(value)
    }
}

impl From<Vec<Identifier>> for OneOrMany {
    fn from(values: Vec<Identifier>) -> Self {
        OneOrMany::Many(values)
    }
}

/// Relationship `data` as it appears in a JSON:API relationship document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadData {
    Many(Vec<Identifier>),
    One(Option<Identifier>),
}

impl PayloadData {
    /// Collection view of the data: `null` is the empty list and a lone identifier a one-element
    /// list.
    pub fn into_many(self) -> Vec<Identifier> {
        match self {
            PayloadData::Many(values) => values,
            PayloadData::One(value) => value.into_iter().collect(),
        }
    }

    /// Single-valued view of the data: a list contributes its first element.
    pub fn into_one(self) -> Option<Identifier> {
        match self {
            PayloadData::Many(values) => values.into_iter().next(),
            PayloadData::One(value) => value,
        }
    }
}

/// A JSON:API-style relationship document: `{ data?, links?, meta? }`.
///
/// `data: None` means the key was absent (nothing is known), while `Some(PayloadData::One(None))`
/// is an explicit `null` (known to be empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipPayload {
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<PayloadData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

// A present key always yields `Some`, even when its value is `null`.
fn deserialize_present<'de, D>(de: D) -> Result<Option<PayloadData>, D::Error>
where
    D: Deserializer<'de>,
{
    PayloadData::deserialize(de).map(Some)
}

impl RelationshipPayload {
    pub fn with_data(data: PayloadData) -> Self {
        RelationshipPayload {
            data: Some(data),
            ..Default::default()
        }
    }
}

/// Mutation operations accepted by [crate::graph::Graph::update] and [crate::graph::Graph::push].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    ReplaceRelatedRecord {
        record: Identifier,
        field: String,
        value: Option<Identifier>,
    },
    AddToRelatedRecords {
        record: Identifier,
        field: String,
        value: OneOrMany,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    RemoveFromRelatedRecords {
        record: Identifier,
        field: String,
        value: OneOrMany,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    ReplaceRelatedRecords {
        record: Identifier,
        field: String,
        value: Vec<Identifier>,
    },
    /// Remote only.
    UpdateRelationship {
        record: Identifier,
        field: String,
        value: RelationshipPayload,
    },
    /// Remote only.
    DeleteRecord { record: Identifier },
    /// `record` is the identifier being retired, `value` the one that survives.
    MergeIdentifiers { record: Identifier, value: Identifier },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ReplaceRelatedRecord { .. } => "replaceRelatedRecord",
            Operation::AddToRelatedRecords { .. } => "addToRelatedRecords",
            Operation::RemoveFromRelatedRecords { .. } => "removeFromRelatedRecords",
            Operation::ReplaceRelatedRecords { .. } => "replaceRelatedRecords",
            Operation::UpdateRelationship { .. } => "updateRelationship",
            Operation::DeleteRecord { .. } => "deleteRecord",
            Operation::MergeIdentifiers { .. } => "mergeIdentifiers",
        }
    }

    pub fn record(&self) -> &Identifier {
        match self {
            Operation::ReplaceRelatedRecord { record, .. }
            | Operation::AddToRelatedRecords { record, .. }
            | Operation::RemoveFromRelatedRecords { record, .. }
            | Operation::ReplaceRelatedRecords { record, .. }
            | Operation::UpdateRelationship { record, .. }
            | Operation::DeleteRecord { record }
            | Operation::MergeIdentifiers { record, .. } => record,
        }
    }

    /// The relationship field the operation targets; `None` for record-wide operations.
    pub fn field(&self) -> Option<&str> {
        match self {
            Operation::ReplaceRelatedRecord { field, .. }
            | Operation::AddToRelatedRecords { field, .. }
            | Operation::RemoveFromRelatedRecords { field, .. }
            | Operation::ReplaceRelatedRecords { field, .. }
            | Operation::UpdateRelationship { field, .. } => Some(field),
            Operation::DeleteRecord { .. } | Operation::MergeIdentifiers { .. } => None,
        }
    }

    pub fn is_remote_only(&self) -> bool {
        matches!(
            self,
            Operation::UpdateRelationship { .. } | Operation::DeleteRecord { .. }
        )
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.field() {
            Some(field) => write!(f, "{}({}.{})", self.name(), self.record(), field),
            None => write!(f, "{}({})", self.name(), self.record()),
        }
    }
}

/// Events handed to observers of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphEvent {
    RelationshipChanged { identifier: Identifier, field: String },
    /// A coalesced remote flush finished; `touched` relationships were part of it.
    TransactionSettled { touched: usize },
}

/// The observation contract the graph produces.
pub trait ChangeNotifier: Send + Sync {
    fn notify_changed(&self, identifier: &Identifier, field: &str);

    /// Called once when a coalesced remote flush finalizes, after its notifications.
    fn transaction_settled(&self, _touched: usize) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl ChangeNotifier for NullNotifier {
    fn notify_changed(&self, _identifier: &Identifier, _field: &str) {}
}

/// Forwards every change into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier(pub UnboundedSender<GraphEvent>);

impl ChannelNotifier {
    fn send(&self, event: GraphEvent) {
        if let Err(e) = self.0.send(event) {
            tracing::warn!("[ChannelNotifier] {}", crate::GraphError::from(e));
        }
    }
}

impl ChangeNotifier for ChannelNotifier {
    fn notify_changed(&self, identifier: &Identifier, field: &str) {
        self.send(GraphEvent::RelationshipChanged {
            identifier: identifier.clone(),
            field: field.to_string(),
        });
    }

    fn transaction_settled(&self, touched: usize) {
        self.send(GraphEvent::TransactionSettled { touched });
    }
}

/// Keeps every event in memory. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier(Arc<Mutex<Vec<GraphEvent>>>);

impl RecordingNotifier {
    pub fn new() -> Self {
        RecordingNotifier::default()
    }

    pub fn events(&self) -> Vec<GraphEvent> {
        self.0.lock().clone()
    }

    pub fn take(&self) -> Vec<GraphEvent> {
        std::mem::take(&mut *self.0.lock())
    }

    /// How many change notifications `identifier.field` has received.
    pub fn count_for(&self, identifier: &Identifier, field: &str) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|event| {
                matches!(event, GraphEvent::RelationshipChanged { identifier: i, field: f }
                    if i == identifier && f == field)
            })
            .count()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn notify_changed(&self, identifier: &Identifier, field: &str) {
        self.0.lock().push(GraphEvent::RelationshipChanged {
            identifier: identifier.clone(),
            field: field.to_string(),
        });
    }

    fn transaction_settled(&self, touched: usize) {
        self.0.lock().push(GraphEvent::TransactionSettled { touched });
    }
}
