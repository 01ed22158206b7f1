/// [crate::properties] contains the basic building blocks the relationship graph indexes by:
/// record identifiers and relationship kinds.
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
    hash::{Hash, Hasher},
};

pub use uuid::Uuid;

/// Free-form JSON object carried alongside relationship data (`meta` and `links`).
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
pub type Meta = JsonObject;
pub type Links = JsonObject;

/// Prefix of every lid minted by this crate.
pub const LID_PREFIX: &str = "@lid:";

/// Namespace bytes used when minting lids for unsaved records.
const LOCAL_LID_NODE: [u8; 6] = [0x72, 0x65, 0x6c, 0x67, 0x72, 0x66];

/// A stable handle to one logical record.
///
/// `lid` is the identity: equality, ordering and hashing all ignore `kind` and `id`, so any two
/// handles carrying the same lid are interchangeable keys. `id` is the persisted id assigned by
/// the backing data source and is `None` until the record has been saved.
///
/// The graph never owns records. Edges hold identifiers, and the node table is keyed by them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "RawIdentifier")]
pub struct Identifier {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub lid: String,
}

/// Wire form of an [Identifier]; payloads frequently omit the lid.
#[derive(Deserialize)]
struct RawIdentifier {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    lid: Option<String>,
}

impl From<RawIdentifier> for Identifier {
    fn from(raw: RawIdentifier) -> Self {
        match (raw.lid, raw.id) {
            (Some(lid), id) => Identifier {
                kind: raw.kind,
                id,
                lid,
            },
            (None, Some(id)) => Identifier::new(raw.kind, id),
            (None, None) => Identifier::local(raw.kind),
        }
    }
}

impl Identifier {
    /// Identifier for a persisted record. The lid is derived from type and id, so repeated calls
    /// yield equal identifiers.
    pub fn new<K: Into<String>, I: Into<String>>(kind: K, id: I) -> Self {
        let kind = kind.into();
        let id = id.into();
        Identifier {
            lid: format!("{LID_PREFIX}{kind}-{id}"),
            kind,
            id: Some(id),
        }
    }

    /// Identifier for a record that has not been persisted yet. Every call mints a fresh lid.
    pub fn local<K: Into<String>>(kind: K) -> Self {
        let kind = kind.into();
        let uuid = Uuid::now_v6(&LOCAL_LID_NODE);
        Identifier {
            lid: format!(
                "{LID_PREFIX}{kind}-{}",
                uuid.hyphenated().encode_lower(&mut Uuid::encode_buffer())
            ),
            kind,
            id: None,
        }
    }

    /// Identifier with an explicit lid, for callers that manage their own identifier cache.
    pub fn with_lid<K: Into<String>, L: Into<String>>(kind: K, id: Option<String>, lid: L) -> Self {
        Identifier {
            kind: kind.into(),
            id,
            lid: lid.into(),
        }
    }

    /// True until the backing data source has assigned this record an id.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.lid == other.lid
    }
}

impl Eq for Identifier {}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lid.cmp(&other.lid)
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lid.hash(state);
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => write!(f, "{}:{}", self.kind, self.lid),
        }
    }
}

/// The shape of one side of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    /// Single-valued.
    BelongsTo,
    /// Multi-valued and ordered.
    HasMany,
    /// Inverse-only placeholder for a side the schema never declared.
    Implicit,
}

impl RelationshipKind {
    pub fn is_collection(&self) -> bool {
        !matches!(self, RelationshipKind::BelongsTo)
    }
}

impl Display for RelationshipKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationshipKind::BelongsTo => write!(f, "belongsTo"),
            RelationshipKind::HasMany => write!(f, "hasMany"),
            RelationshipKind::Implicit => write!(f, "implicit"),
        }
    }
}

/// `links.related` may be a bare href or a link object carrying one.
pub fn related_href(links: &Links) -> Option<&str> {
    match links.get("related")? {
        serde_json::Value::String(href) => Some(href.as_str()),
        serde_json::Value::Object(link) => link.get("href").and_then(|href| href.as_str()),
        _ => None,
    }
}
