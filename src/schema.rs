// Schema catalog for relationship fields
//
// The graph never decides on its own what a field means. It asks a catalog, once per
// (type, field) pair, and caches the answer. The registry below is the in-process catalog;
// callers with their own model layer implement [`SchemaCatalog`] directly.

use crate::properties::RelationshipKind;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

/// Declared metadata for one relationship field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipSchema {
    pub kind: RelationshipKind,
    /// Field on `related_type` holding the other side. `None` means the inverse is explicitly
    /// absent; the graph then tracks the other side with an implicit edge.
    pub inverse_field: Option<String>,
    pub related_type: String,
    pub is_async: bool,
    pub is_polymorphic: bool,
}

impl RelationshipSchema {
    pub fn belongs_to<T: Into<String>>(related_type: T) -> Self {
        RelationshipSchema {
            kind: RelationshipKind::BelongsTo,
            inverse_field: None,
            related_type: related_type.into(),
            is_async: false,
            is_polymorphic: false,
        }
    }

    pub fn has_many<T: Into<String>>(related_type: T) -> Self {
        RelationshipSchema {
            kind: RelationshipKind::HasMany,
            ..RelationshipSchema::belongs_to(related_type)
        }
    }

    pub fn inverse<F: Into<String>>(mut self, field: F) -> Self {
        self.inverse_field = Some(field.into());
        self
    }

    pub fn no_inverse(mut self) -> Self {
        self.inverse_field = None;
        self
    }

    pub fn async_(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn polymorphic(mut self) -> Self {
        self.is_polymorphic = true;
        self
    }
}

/// The schema contract the graph consumes.
pub trait SchemaCatalog: Send + Sync {
    /// Describe `kind.field`, or `None` when the type declares no such relationship.
    fn describe_relationship(&self, kind: &str, field: &str) -> Option<RelationshipSchema>;
}

/// Thread-safe, cloneable catalog of relationship schemas keyed by type, then field.
#[derive(Default)]
pub struct SchemaRegistry(Arc<RwLock<HashMap<String, BTreeMap<String, RelationshipSchema>>>>);

impl Clone for SchemaRegistry {
    fn clone(&self) -> Self {
        SchemaRegistry(self.0.clone())
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    /// Register a relationship field.
    ///
    /// If the field is already registered it is overwritten and a log message emitted.
    pub fn register<K: Into<String>, F: Into<String>>(
        &self,
        kind: K,
        field: F,
        schema: RelationshipSchema,
    ) -> &Self {
        let kind = kind.into();
        let field = field.into();
        let mut writer = self.0.write();
        let fields = writer.entry(kind.clone()).or_default();
        if fields.contains_key(&field) {
            tracing::info!("[SchemaRegistry::register] Overwriting existing schema: {kind}.{field}");
        }
        fields.insert(field, schema);
        self
    }

    /// Register both sides of a relationship in one call.
    pub fn register_pair(
        &self,
        (lhs_type, lhs_field, lhs): (&str, &str, RelationshipSchema),
        (rhs_type, rhs_field, rhs): (&str, &str, RelationshipSchema),
    ) -> &Self {
        self.register(lhs_type, lhs_field, lhs.inverse(rhs_field));
        self.register(rhs_type, rhs_field, rhs.inverse(lhs_field))
    }

    pub fn get(&self, kind: &str, field: &str) -> Option<RelationshipSchema> {
        self.0
            .read()
            .get(kind)
            .and_then(|fields| fields.get(field))
            .cloned()
    }

    /// List all relationship fields declared on `kind`.
    pub fn fields_for(&self, kind: &str) -> Vec<String> {
        self.0
            .read()
            .get(kind)
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl SchemaCatalog for SchemaRegistry {
    fn describe_relationship(&self, kind: &str, field: &str) -> Option<RelationshipSchema> {
        self.get(kind, field)
    }
}
