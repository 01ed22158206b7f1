//! Lazy resolution of relationship definitions.
//!
//! A relationship has two sides. Each side gets an [EdgeDefinition] describing the field from
//! its owner's point of view, and both sides share one [RelationshipInfo]. Infos are stored per
//! unordered pair of types, and indexed by `(type, field)` for both endpoints the first time
//! either endpoint is resolved, so the inverse side never has to consult the catalog again.

use crate::{
    error::GraphError,
    properties::RelationshipKind,
    schema::{RelationshipSchema, SchemaCatalog},
};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// Immutable metadata for one side of a relationship, shared by every node of `owner_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeDefinition {
    pub kind: RelationshipKind,
    /// Field name on `owner_type`.
    pub key: String,
    pub owner_type: String,
    pub related_type: String,
    pub is_async: bool,
    pub is_polymorphic: bool,
    pub inverse_kind: RelationshipKind,
    /// Field name on the related side. Always present: an undeclared inverse gets an implicit key.
    pub inverse_key: String,
    pub inverse_is_async: bool,
    pub inverse_is_polymorphic: bool,
}

impl EdgeDefinition {
    pub fn is_implicit(&self) -> bool {
        self.kind == RelationshipKind::Implicit
    }

    pub fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }

    pub fn inverse_is_implicit(&self) -> bool {
        self.inverse_kind == RelationshipKind::Implicit
    }
}

/// Key under which the related type tracks an inverse the schema never declared.
pub fn implicit_key_for(kind: &str, field: &str) -> String {
    format!("implicit-{kind}:{field}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Lhs,
    Rhs,
}

/// Both sides of one relationship.
#[derive(Debug)]
pub struct RelationshipInfo {
    pub lhs: Arc<EdgeDefinition>,
    pub rhs: Arc<EdgeDefinition>,
    /// False when the rhs is implicit.
    pub has_inverse: bool,
    pub is_self_referential: bool,
    /// Self-referential and the field is its own inverse (`user.friends` ↔ `user.friends`).
    pub is_reflexive: bool,
}

impl RelationshipInfo {
    fn implicit(kind: &str, field: &str, schema: &RelationshipSchema) -> Self {
        let inverse_key = implicit_key_for(kind, field);
        let lhs = EdgeDefinition {
            kind: schema.kind,
            key: field.to_string(),
            owner_type: kind.to_string(),
            related_type: schema.related_type.clone(),
            is_async: schema.is_async,
            is_polymorphic: schema.is_polymorphic,
            inverse_kind: RelationshipKind::Implicit,
            inverse_key: inverse_key.clone(),
            inverse_is_async: false,
            inverse_is_polymorphic: false,
        };
        let rhs = EdgeDefinition {
            kind: RelationshipKind::Implicit,
            key: inverse_key,
            owner_type: schema.related_type.clone(),
            related_type: kind.to_string(),
            is_async: false,
            is_polymorphic: false,
            inverse_kind: schema.kind,
            inverse_key: field.to_string(),
            inverse_is_async: schema.is_async,
            inverse_is_polymorphic: schema.is_polymorphic,
        };
        RelationshipInfo {
            lhs: Arc::new(lhs),
            rhs: Arc::new(rhs),
            has_inverse: false,
            is_self_referential: kind == schema.related_type,
            is_reflexive: false,
        }
    }

    fn explicit(
        kind: &str,
        field: &str,
        schema: &RelationshipSchema,
        inverse_key: &str,
        inverse: &RelationshipSchema,
    ) -> Self {
        let lhs = EdgeDefinition {
            kind: schema.kind,
            key: field.to_string(),
            owner_type: kind.to_string(),
            related_type: schema.related_type.clone(),
            is_async: schema.is_async,
            is_polymorphic: schema.is_polymorphic,
            inverse_kind: inverse.kind,
            inverse_key: inverse_key.to_string(),
            inverse_is_async: inverse.is_async,
            inverse_is_polymorphic: inverse.is_polymorphic,
        };
        let rhs = EdgeDefinition {
            kind: inverse.kind,
            key: inverse_key.to_string(),
            owner_type: schema.related_type.clone(),
            related_type: inverse.related_type.clone(),
            is_async: inverse.is_async,
            is_polymorphic: inverse.is_polymorphic,
            inverse_kind: schema.kind,
            inverse_key: field.to_string(),
            inverse_is_async: schema.is_async,
            inverse_is_polymorphic: schema.is_polymorphic,
        };
        let is_self_referential = kind == schema.related_type;
        RelationshipInfo {
            lhs: Arc::new(lhs),
            rhs: Arc::new(rhs),
            has_inverse: true,
            is_self_referential,
            is_reflexive: is_self_referential && field == inverse_key,
        }
    }

    /// Which side `kind.field` is. Self-referential relationships share the type on both ends,
    /// so there only the field name decides.
    pub fn side_of(&self, kind: &str, field: &str) -> Option<Side> {
        let owns = |def: &EdgeDefinition| {
            def.key == field && (self.is_self_referential || def.owner_type == kind)
        };
        if owns(&self.lhs) {
            Some(Side::Lhs)
        } else if owns(&self.rhs) {
            Some(Side::Rhs)
        } else {
            None
        }
    }

    pub fn definition(&self, side: Side) -> &Arc<EdgeDefinition> {
        match side {
            Side::Lhs => &self.lhs,
            Side::Rhs => &self.rhs,
        }
    }
}

/// Unordered pair of type names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypePair(String, String);

impl TypePair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            TypePair(a.to_string(), b.to_string())
        } else {
            TypePair(b.to_string(), a.to_string())
        }
    }
}

/// Symmetric type equivalences observed at mutation time. Entries are only ever added.
#[derive(Debug, Default, Clone)]
pub struct PolymorphicTypes(BTreeMap<String, BTreeSet<String>>);

impl PolymorphicTypes {
    /// Returns true if the pair was not registered before.
    pub fn register(&mut self, a: &str, b: &str) -> bool {
        let added = self
            .0
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.0
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
        added
    }

    pub fn are_equivalent(&self, a: &str, b: &str) -> bool {
        a == b || self.0.get(a).is_some_and(|types| types.contains(b))
    }

    pub fn equivalents(&self, kind: &str) -> Vec<String> {
        self.0
            .get(kind)
            .map(|types| types.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct DefinitionCache {
    pairs: BTreeMap<TypePair, Vec<Arc<RelationshipInfo>>>,
    fields: BTreeMap<(String, String), (Arc<RelationshipInfo>, Side)>,
}

impl DefinitionCache {
    pub fn cached(&self, kind: &str, field: &str) -> Option<Arc<EdgeDefinition>> {
        self.fields
            .get(&(kind.to_string(), field.to_string()))
            .map(|(info, side)| info.definition(*side).clone())
    }

    pub fn info(&self, kind: &str, field: &str) -> Option<Arc<RelationshipInfo>> {
        self.fields
            .get(&(kind.to_string(), field.to_string()))
            .map(|(info, _)| info.clone())
    }

    /// Number of distinct relationships resolved so far.
    pub fn len(&self) -> usize {
        self.pairs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Resolve `kind.field`, consulting `catalog` only on a cache miss.
    ///
    /// When `kind` declares nothing under `field`, types registered as polymorphic equivalents
    /// of `kind` are tried in turn and a hit is aliased under `kind`.
    pub fn resolve(
        &mut self,
        catalog: &dyn SchemaCatalog,
        polymorphic: &PolymorphicTypes,
        kind: &str,
        field: &str,
    ) -> Result<Arc<EdgeDefinition>, GraphError> {
        if let Some(definition) = self.cached(kind, field) {
            return Ok(definition);
        }
        if let Some(schema) = catalog.describe_relationship(kind, field) {
            return Ok(self.upgrade(catalog, kind, field, schema));
        }
        for alt in polymorphic.equivalents(kind) {
            if self.cached(&alt, field).is_none() {
                let Some(schema) = catalog.describe_relationship(&alt, field) else {
                    continue;
                };
                self.upgrade(catalog, &alt, field, schema);
            }
            if let Some(entry) = self.fields.get(&(alt.clone(), field.to_string())).cloned() {
                tracing::debug!("[DefinitionCache] {kind}.{field} resolved through {alt}.{field}");
                let definition = entry.0.definition(entry.1).clone();
                self.fields
                    .insert((kind.to_string(), field.to_string()), entry);
                return Ok(definition);
            }
        }
        Err(GraphError::UnknownRelationship {
            kind: kind.to_string(),
            field: field.to_string(),
        })
    }

    fn upgrade(
        &mut self,
        catalog: &dyn SchemaCatalog,
        kind: &str,
        field: &str,
        schema: RelationshipSchema,
    ) -> Arc<EdgeDefinition> {
        let pair = TypePair::new(kind, &schema.related_type);
        let known = self.pairs.get(&pair).and_then(|infos| {
            infos
                .iter()
                .find_map(|info| info.side_of(kind, field).map(|side| (info.clone(), side)))
        });
        if let Some((info, side)) = known {
            let definition = info.definition(side).clone();
            self.fields
                .insert((kind.to_string(), field.to_string()), (info, side));
            return definition;
        }

        let inverse = schema.inverse_field.as_ref().and_then(|inverse_key| {
            catalog
                .describe_relationship(&schema.related_type, inverse_key)
                .map(|inverse| (inverse_key.clone(), inverse))
        });
        let info = Arc::new(match inverse {
            Some((inverse_key, inverse)) => {
                RelationshipInfo::explicit(kind, field, &schema, &inverse_key, &inverse)
            }
            None => {
                if let Some(inverse_key) = &schema.inverse_field {
                    tracing::debug!(
                        "[DefinitionCache] {kind}.{field} names inverse {}.{inverse_key} which is \
                         not declared; tracking the inverse implicitly",
                        schema.related_type
                    );
                }
                RelationshipInfo::implicit(kind, field, &schema)
            }
        });
        tracing::debug!(
            "[DefinitionCache] resolved {}.{} ({}) <-> {}.{} ({})",
            info.lhs.owner_type,
            info.lhs.key,
            info.lhs.kind,
            info.rhs.owner_type,
            info.rhs.key,
            info.rhs.kind
        );

        self.pairs.entry(pair).or_default().push(info.clone());
        self.fields
            .insert((kind.to_string(), field.to_string()), (info.clone(), Side::Lhs));
        self.fields
            .entry((info.rhs.owner_type.clone(), info.rhs.key.clone()))
            .or_insert((info.clone(), Side::Rhs));
        info.lhs.clone()
    }
}
