//! Foreign record: the persistence-adaptor boundary for a snapshot
//! (§6.1). This crate never reads or writes a file; it only describes
//! the ordered key set a snapshot round-trips through and, with the
//! `serde` feature, how those keys map onto JSON (§6.2).

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use indexmap::IndexMap;

use chronicle_value::Variant;

use crate::id::{ObjectId, SnapshotId};
use crate::metamodel::{Metamodel, ObjectType};
use crate::snapshot::Snapshot;
use crate::structure::Structure;

/// An ordered `string -> variant` mapping (§6.1). Snapshot keys
/// (`object_id`, `snapshot_id`, `type`, `structure`, ...) come first,
/// in the order [`to_record`] writes them; attributes follow in the
/// snapshot's own attribute order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignRecord(IndexMap<String, Variant>);

impl ForeignRecord {
    /// An empty record.
    pub fn new() -> Self {
        ForeignRecord(IndexMap::new())
    }

    /// A single key's value.
    pub fn get(&self, key: &str) -> Option<&Variant> {
        self.0.get(key)
    }

    /// Sets a key, preserving first-insertion order.
    pub fn insert(&mut self, key: impl Into<String>, value: Variant) {
        self.0.insert(key.into(), value);
    }

    /// Keys and values, in order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Variant)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Why decoding a [`ForeignRecord`] into a [`Snapshot`] failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignRecordError {
    /// A required key (`object_id`, `snapshot_id`, `type`, or
    /// `structure`) is missing.
    MissingKey(&'static str),
    /// A key's value was present but not the type this format expects
    /// (e.g. `object_id` not convertible to `int`).
    MalformedKey(&'static str),
    /// `structure` was not one of `"unstructured" | "node" | "edge"`.
    UnknownStructure(String),
    /// `type` did not resolve through the supplied [`Metamodel`].
    UnknownObjectType(String),
}

impl core::fmt::Display for ForeignRecordError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ForeignRecordError::MissingKey(key) => write!(f, "missing required key {key:?}"),
            ForeignRecordError::MalformedKey(key) => write!(f, "malformed value for key {key:?}"),
            ForeignRecordError::UnknownStructure(s) => write!(f, "unknown structure kind {s:?}"),
            ForeignRecordError::UnknownObjectType(name) => {
                write!(f, "unknown object type {name:?}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ForeignRecordError {}

const STRUCTURAL_KEYS: [&str; 7] = [
    "object_id",
    "snapshot_id",
    "type",
    "structure",
    "origin",
    "target",
    "parent",
];

/// Encodes a snapshot's structural keys followed by its attributes, in
/// the order §6.1 documents.
pub fn to_record(snapshot: &Snapshot) -> ForeignRecord {
    let mut record = ForeignRecord::new();
    record.insert("object_id", Variant::int(snapshot.object_id().raw() as i64));
    record.insert("snapshot_id", Variant::int(snapshot.snapshot_id().raw() as i64));
    record.insert("type", Variant::string(snapshot.object_type().name()));
    match snapshot.structure() {
        Structure::Unstructured => record.insert("structure", Variant::string("unstructured")),
        Structure::Node => record.insert("structure", Variant::string("node")),
        Structure::Edge { origin, target } => {
            record.insert("structure", Variant::string("edge"));
            record.insert("origin", Variant::int(origin.raw() as i64));
            record.insert("target", Variant::int(target.raw() as i64));
        }
    }
    if let Some(parent) = snapshot.parent() {
        record.insert("parent", Variant::int(parent.raw() as i64));
    }
    if !snapshot.children().is_empty() {
        let children: Vec<i64> = snapshot.children().iter().map(|c| c.raw() as i64).collect();
        record.insert("children", Variant::Array(chronicle_value::Array::Int(children)));
    }
    for (name, value) in snapshot.attributes() {
        record.insert(name.clone(), value.clone());
    }
    record
}

fn id_value(record: &ForeignRecord, key: &'static str) -> Result<u64, ForeignRecordError> {
    record
        .get(key)
        .ok_or(ForeignRecordError::MissingKey(key))?
        .int_value()
        .map_err(|_| ForeignRecordError::MalformedKey(key))
        .map(|v| v as u64)
}

/// Decodes a foreign record into a fresh, transient [`Snapshot`],
/// resolving `type` through `metamodel`. `object_id`/`snapshot_id` are
/// taken as proposed IDs — the caller (ordinarily a
/// [`crate::loader::DesignLoader`]) is responsible for reserving them
/// with the memory's allocator before this is inserted.
pub fn from_record(
    record: &ForeignRecord,
    metamodel: &dyn Metamodel,
) -> Result<Snapshot, ForeignRecordError> {
    let object_id = ObjectId::from_raw(id_value(record, "object_id")?);
    let snapshot_id = SnapshotId::from_raw(id_value(record, "snapshot_id")?);
    let type_name = record
        .get("type")
        .ok_or(ForeignRecordError::MissingKey("type"))?
        .string_value()
        .map_err(|_| ForeignRecordError::MalformedKey("type"))?;
    let object_type: Arc<dyn ObjectType + Send + Sync> = metamodel
        .object_type(&type_name)
        .ok_or_else(|| ForeignRecordError::UnknownObjectType(type_name.clone()))?;
    let structure_name = record
        .get("structure")
        .ok_or(ForeignRecordError::MissingKey("structure"))?
        .string_value()
        .map_err(|_| ForeignRecordError::MalformedKey("structure"))?;
    let structure = match structure_name.as_str() {
        "unstructured" => Structure::Unstructured,
        "node" => Structure::Node,
        "edge" => Structure::Edge {
            origin: ObjectId::from_raw(id_value(record, "origin")?),
            target: ObjectId::from_raw(id_value(record, "target")?),
        },
        other => return Err(ForeignRecordError::UnknownStructure(other.into())),
    };

    let mut attributes = IndexMap::new();
    for (key, value) in record.entries() {
        if STRUCTURAL_KEYS.contains(&key) || key == "children" {
            continue;
        }
        attributes.insert(String::from(key), value.clone());
    }

    let mut snapshot = Snapshot::new(snapshot_id, object_id, object_type, structure, attributes);
    if let Some(parent) = record.get("parent") {
        if let Ok(raw) = parent.int_value() {
            snapshot.set_parent(Some(ObjectId::from_raw(raw as u64)));
        }
    }
    if let Some(Variant::Array(chronicle_value::Array::Int(children))) = record.get("children") {
        for child in children {
            snapshot.add_child(ObjectId::from_raw(*child as u64));
        }
    }
    Ok(snapshot)
}

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use chronicle_value::json::{from_coalesced, to_tagged, JsonVariantError};
    use serde_json::Value as Json;

    /// Encodes a [`ForeignRecord`] as a JSON object, using the tagged
    /// variant encoding (§6.2) for every value.
    pub fn to_json(record: &ForeignRecord) -> Json {
        let mut map = serde_json::Map::new();
        for (key, value) in record.entries() {
            map.insert(key.into(), to_tagged(value));
        }
        Json::Object(map)
    }

    /// Decodes a JSON object into a [`ForeignRecord`], inferring each
    /// value's shape with the coalesced encoding (§6.2) rather than
    /// requiring the tagged form — foreign records read from hand-edited
    /// or third-party sources are more likely to carry bare JSON values.
    pub fn from_json(json: &Json) -> Result<ForeignRecord, JsonVariantError> {
        let object = json
            .as_object()
            .ok_or_else(|| JsonVariantError::UnrecognizedShape(json.to_string()))?;
        let mut record = ForeignRecord::new();
        for (key, value) in object {
            record.insert(key.clone(), from_coalesced(value)?);
        }
        Ok(record)
    }
}

#[cfg(feature = "serde")]
pub use json::{from_json, to_json};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::SimpleObjectType;
    use crate::structure::StructuralKind;
    use alloc::vec::Vec as StdVec;

    struct OneType(Arc<dyn ObjectType + Send + Sync>);

    impl Metamodel for OneType {
        fn object_type(&self, name: &str) -> Option<Arc<dyn ObjectType + Send + Sync>> {
            if name == self.0.name() {
                Some(Arc::clone(&self.0))
            } else {
                None
            }
        }
    }

    fn edge_type() -> Arc<dyn ObjectType + Send + Sync> {
        Arc::new(SimpleObjectType::new("Edge", StructuralKind::Edge, StdVec::new()))
    }

    #[test]
    fn encode_then_decode_preserves_edge_structure_and_attributes() {
        let n1 = ObjectId::from_raw(1);
        let n2 = ObjectId::from_raw(2);
        let mut attrs = IndexMap::new();
        attrs.insert(String::from("name"), Variant::string("flow"));
        attrs.insert(String::from("rate"), Variant::double(0.5));
        let snapshot = Snapshot::new(
            SnapshotId::from_raw(10),
            ObjectId::from_raw(3),
            edge_type(),
            Structure::Edge { origin: n1, target: n2 },
            attrs,
        );

        let record = to_record(&snapshot);
        let metamodel = OneType(edge_type());
        let decoded = from_record(&record, &metamodel).unwrap();

        assert_eq!(decoded.object_id(), snapshot.object_id());
        assert_eq!(decoded.snapshot_id(), snapshot.snapshot_id());
        assert_eq!(decoded.structure(), snapshot.structure());
        assert_eq!(decoded.attribute("name"), snapshot.attribute("name"));
        assert_eq!(decoded.attribute("rate"), snapshot.attribute("rate"));
    }

    #[test]
    fn unknown_type_is_reported() {
        let record = {
            let mut r = ForeignRecord::new();
            r.insert("object_id", Variant::int(1));
            r.insert("snapshot_id", Variant::int(1));
            r.insert("type", Variant::string("Ghost"));
            r.insert("structure", Variant::string("node"));
            r
        };
        let metamodel = OneType(edge_type());
        assert_eq!(
            from_record(&record, &metamodel),
            Err(ForeignRecordError::UnknownObjectType("Ghost".into()))
        );
    }
}
