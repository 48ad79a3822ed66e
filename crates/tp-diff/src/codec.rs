//! JSON wire format for operation trees.
//!
//! Every node is `{ "op": <tag>, "data": <payload> }`:
//!
//! | Tag | Payload |
//! |---|---|
//! | `NOP`, `Del` | omitted |
//! | `Ins`, `Rpl` | the value's JSON form (required) |
//! | `Mrg` | object of field name to node |
//! | `Map` | array of `[key, node]` pairs |
//! | `Arr` | array of `[position, node]` pairs |
//!
//! A JSON value without an `op` member decodes as `Rpl` of that value, so
//! hand-written patches can leave plain values in place of nodes.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use tp_types::Value;

use crate::error::{DiffError, DiffResult};
use crate::operation::{MapRow, OpTag, Operation, SeqRow};

/// Encode an operation tree as a wire node.
pub fn encode(op: &Operation) -> JsonValue {
    let mut node = serde_json::Map::new();
    node.insert("op".into(), JsonValue::String(op.tag().as_str().into()));

    let data = match op {
        Operation::NoChange | Operation::Delete => None,
        Operation::Insert(value) | Operation::Replace(value) => Some(value.to_json()),
        Operation::Merge(fields) => Some(JsonValue::Object(
            fields
                .iter()
                .map(|(name, child)| (name.clone(), encode(child)))
                .collect(),
        )),
        Operation::MapDelta(rows) => Some(JsonValue::Array(
            rows.iter()
                .map(|r| JsonValue::Array(vec![r.key.to_json(), encode(&r.op)]))
                .collect(),
        )),
        Operation::SequenceDelta(rows) => Some(JsonValue::Array(
            rows.iter()
                .map(|r| JsonValue::Array(vec![JsonValue::from(r.position), encode(&r.op)]))
                .collect(),
        )),
    };
    if let Some(data) = data {
        node.insert("data".into(), data);
    }

    JsonValue::Object(node)
}

/// Anything that can be turned into an operation tree by [`decode`].
pub trait IntoOperation {
    fn into_operation(self) -> DiffResult<Operation>;
}

impl IntoOperation for Operation {
    fn into_operation(self) -> DiffResult<Operation> {
        Ok(self)
    }
}

impl IntoOperation for &JsonValue {
    fn into_operation(self) -> DiffResult<Operation> {
        decode_node(self)
    }
}

impl IntoOperation for JsonValue {
    fn into_operation(self) -> DiffResult<Operation> {
        decode_node(&self)
    }
}

impl<T: IntoOperation> IntoOperation for Option<T> {
    fn into_operation(self) -> DiffResult<Operation> {
        match self {
            Some(wire) => wire.into_operation(),
            None => Ok(Operation::NoChange),
        }
    }
}

/// Decode a wire node. Operations pass through unchanged and an absent node
/// decodes as `NoChange`.
pub fn decode<W: IntoOperation>(wire: W) -> DiffResult<Operation> {
    wire.into_operation()
}

/// Parse a JSON document and decode it.
pub fn decode_str(json: &str) -> DiffResult<Operation> {
    let node: JsonValue =
        serde_json::from_str(json).map_err(|e| DiffError::Serialization(e.to_string()))?;
    decode_node(&node)
}

fn decode_node(node: &JsonValue) -> DiffResult<Operation> {
    let tag = node
        .as_object()
        .and_then(|fields| fields.get("op"))
        .filter(|tag| !tag.is_null());
    let Some(tag) = tag else {
        return Ok(Operation::Replace(Value::from(node)));
    };
    let tag = tag
        .as_str()
        .ok_or_else(|| DiffError::MalformedWire(format!("op tag must be a string, got {tag}")))?;
    let data = node.get("data");

    let op = match OpTag::from_str(tag)? {
        OpTag::NoChange => Operation::NoChange,
        OpTag::Delete => Operation::Delete,
        OpTag::Insert => Operation::Insert(payload(data, OpTag::Insert)?),
        OpTag::Replace => Operation::Replace(payload(data, OpTag::Replace)?),
        OpTag::Merge => {
            let fields = data.and_then(JsonValue::as_object).ok_or_else(|| {
                DiffError::MalformedWire("Mrg payload must be an object".into())
            })?;
            let fields = fields
                .iter()
                .map(|(name, child)| Ok::<_, DiffError>((name.clone(), decode_node(child)?)))
                .collect::<DiffResult<BTreeMap<_, _>>>()?;
            Operation::Merge(fields)
        }
        OpTag::MapDelta => Operation::MapDelta(
            decode_rows(data, OpTag::MapDelta)?
                .into_iter()
                .map(|(key, op)| MapRow::new(Value::from(key), op))
                .collect(),
        ),
        OpTag::SequenceDelta => Operation::SequenceDelta(
            decode_rows(data, OpTag::SequenceDelta)?
                .into_iter()
                .map(|(position, op)| {
                    let position = position
                        .as_u64()
                        .and_then(|p| usize::try_from(p).ok())
                        .ok_or_else(|| {
                            DiffError::MalformedWire(format!(
                                "Arr row position must be a non-negative integer, got {position}"
                            ))
                        })?;
                    Ok::<_, DiffError>(SeqRow::new(position, op))
                })
                .collect::<DiffResult<Vec<_>>>()?,
        ),
    };
    Ok(op)
}

/// The value carried by an `Ins` or `Rpl` node. `null` is a value; a missing
/// `data` member is not.
fn payload(data: Option<&JsonValue>, tag: OpTag) -> DiffResult<Value> {
    data.map(Value::from)
        .ok_or_else(|| DiffError::MalformedWire(format!("{tag} node has no data")))
}

/// Split a row payload into `(key, decoded node)` pairs.
fn decode_rows(data: Option<&JsonValue>, tag: OpTag) -> DiffResult<Vec<(&JsonValue, Operation)>> {
    let rows = data
        .and_then(JsonValue::as_array)
        .ok_or_else(|| DiffError::MalformedWire(format!("{tag} payload must be an array")))?;
    rows.iter()
        .map(|row| match row.as_array().map(Vec::as_slice) {
            Some([key, node]) => Ok((key, decode_node(node)?)),
            _ => Err(DiffError::MalformedWire(format!(
                "{tag} row must be a [key, node] pair, got {row}"
            ))),
        })
        .collect()
}

impl Operation {
    /// Encode this operation as a wire node. See [`encode`].
    pub fn encode(&self) -> JsonValue {
        encode(self)
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let node = JsonValue::deserialize(deserializer)?;
        decode_node(&node).map_err(D::Error::custom)
    }
}
