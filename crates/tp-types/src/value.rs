//! The dynamic value model compared and patched by the diff engine.
//!
//! A [`Value`] is a scalar, an ordered sequence, a native keyed collection or
//! a [`Record`]. Absence is never a `Value`: callers model a missing slot as
//! `Option<&Value>::None`, and [`Value::Null`] is an ordinary present value.
//!
//! # Ordering
//!
//! `Value` has a total order so that keyed collections can be merge-joined.
//! Variants rank `Null < Bool < Number < String < Seq < Map < Record`; within
//! a variant, numbers order numerically (an integer sorts before a float of
//! equal magnitude, keeping the order consistent with equality), strings
//! lexicographically and containers element-wise.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;

use crate::error::{ValueError, ValueResult};
use crate::record::Record;

/// A node of the data graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Ordered, indexable sequence.
    Seq(Vec<Value>),
    /// Native keyed collection.
    Map(BTreeMap<Value, Value>),
    Record(Record),
}

impl Value {
    /// Build a sequence from anything convertible to values.
    pub fn seq<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Build a native keyed collection from key/value pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Seq(_) => 4,
            Value::Map(_) => 5,
            Value::Record(_) => 6,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Value, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(rec) => Some(rec),
            _ => None,
        }
    }

    /// Field lookup on a record; `None` for missing fields and non-records.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_record().and_then(|rec| rec.get(field))
    }

    /// The record type tag, if this is a tagged record.
    pub fn type_tag(&self) -> Option<&str> {
        self.as_record().and_then(Record::type_tag)
    }

    /// Borrow the record, or report what was found instead.
    pub fn expect_record(&self) -> ValueResult<&Record> {
        self.as_record().ok_or(ValueError::UnexpectedKind {
            expected: "record",
            actual: self.kind(),
        })
    }

    pub fn expect_str(&self) -> ValueResult<&str> {
        self.as_str().ok_or(ValueError::UnexpectedKind {
            expected: "string",
            actual: self.kind(),
        })
    }

    pub fn expect_i64(&self) -> ValueResult<i64> {
        self.as_i64().ok_or(ValueError::UnexpectedKind {
            expected: "integer",
            actual: self.kind(),
        })
    }

    pub fn expect_bool(&self) -> ValueResult<bool> {
        self.as_bool().ok_or(ValueError::UnexpectedKind {
            expected: "bool",
            actual: self.kind(),
        })
    }

    /// Convert to JSON.
    ///
    /// Records become objects and lose their type tag. Native maps become a
    /// single-member object `{"$map": [[key, value], ...]}`, since their keys
    /// need not be strings; [`Value::from`] turns that shape back into a map.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Seq(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => {
                let pairs = entries
                    .iter()
                    .map(|(k, v)| serde_json::Value::Array(vec![k.to_json(), v.to_json()]))
                    .collect();
                let mut object = serde_json::Map::new();
                object.insert(MAP_MARKER.to_string(), serde_json::Value::Array(pairs));
                serde_json::Value::Object(object)
            }
            Value::Record(rec) => serde_json::Value::Object(
                rec.iter()
                    .map(|(name, v)| (name.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Sole member name of the JSON object a native map is written as.
const MAP_MARKER: &str = "$map";

/// Read back the `{"$map": [[k, v], ...]}` shape written by [`Value::to_json`].
fn map_from_json(fields: &serde_json::Map<String, serde_json::Value>) -> Option<Value> {
    if fields.len() != 1 {
        return None;
    }
    fields
        .get(MAP_MARKER)?
        .as_array()?
        .iter()
        .map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([k, v]) => Some((Value::from(k), Value::from(v))),
            _ => None,
        })
        .collect::<Option<BTreeMap<_, _>>>()
        .map(Value::Map)
}

fn integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn cmp_numbers(a: &Number, b: &Number) -> Ordering {
    let (ia, ib) = (integer(a), integer(b));
    if let (Some(x), Some(y)) = (ia, ib) {
        return x.cmp(&y);
    }
    let x = a.as_f64().unwrap_or_default();
    let y = b.as_f64().unwrap_or_default();
    x.partial_cmp(&y)
        .unwrap_or(Ordering::Equal)
        .then_with(|| ib.is_some().cmp(&ia.is_some()))
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => cmp_numbers(a, b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Seq(a), Value::Seq(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Record(a), Value::Record(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => match map_from_json(&fields) {
                Some(map) => map,
                None => Value::Record(
                    fields
                        .into_iter()
                        .map(|(name, v)| (name, Value::from(v)))
                        .collect(),
                ),
            },
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value::from(json.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite floats have no number representation and become `Null`.
    fn from(f: f64) -> Self {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<BTreeMap<Value, Value>> for Value {
    fn from(entries: BTreeMap<Value, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<Record> for Value {
    fn from(rec: Record) -> Self {
        Value::Record(rec)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

// ---------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Seq(items) if items.is_empty() => write!(f, "[]"),
            Value::Seq(items) => {
                write!(f, "[ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, " ]")
            }
            Value::Map(entries) if entries.is_empty() => write!(f, "Map {{}}"),
            Value::Map(entries) => {
                write!(f, "Map {{ ")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, " }}")
            }
            Value::Record(rec) if rec.is_empty() => write!(f, "{{}}"),
            Value::Record(rec) => {
                write!(f, "{{ ")?;
                for (i, (name, v)) in rec.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {v}")?;
                }
                write!(f, " }}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn variants_rank_in_declared_order() {
        let ordered = vec![
            Value::Null,
            Value::from(false),
            Value::from(3),
            Value::from("a"),
            Value::seq([1]),
            Value::map([(1, "x")]),
            Value::Record(Record::new()),
        ];
        let mut shuffled = ordered.clone();
        shuffled.reverse();
        shuffled.sort();
        assert_eq!(shuffled, ordered);
    }

    #[test]
    fn numbers_order_numerically() {
        assert!(Value::from(2) < Value::from(10));
        assert!(Value::from(-5) < Value::from(1.5));
        assert!(Value::from(1.5) < Value::from(2));
        assert!(Value::from(u64::MAX) > Value::from(i64::MAX));
    }

    #[test]
    fn integer_sorts_before_equal_float() {
        let int = Value::from(1);
        let float = Value::from(1.0);
        assert_ne!(int, float);
        assert_eq!(int.cmp(&float), Ordering::Less);
    }

    #[test]
    fn json_objects_become_plain_records() {
        let v = Value::from(json!({"key": 4, "text": "tumpty"}));
        let rec = v.as_record().unwrap();
        assert_eq!(rec.type_tag(), None);
        assert_eq!(v.get("key"), Some(&Value::from(4)));
    }

    #[test]
    fn maps_serialize_as_marked_pairs() {
        let v = Value::map([(1, "numpty"), (4, "tumpty")]);
        assert_eq!(v.to_json(), json!({"$map": [[1, "numpty"], [4, "tumpty"]]}));
    }

    #[test]
    fn maps_survive_json() {
        let nested = Value::map([(Value::from(2), Value::map([(3, 4)]))]);
        let v = Value::map([(Value::from(1), Value::from(1)), (Value::from("m"), nested)]);
        assert_eq!(Value::from(v.to_json()), v);
        let empty = Value::Map(BTreeMap::new());
        assert_eq!(Value::from(empty.to_json()), empty);
    }

    #[test]
    fn marker_lookalikes_stay_records() {
        let v = Value::from(json!({"$map": [[1, 2]], "other": true}));
        assert!(v.as_record().is_some());
        let v = Value::from(json!({"$map": [1, 2]}));
        assert!(v.as_record().is_some());
    }

    #[test]
    fn record_tag_is_dropped_in_json() {
        let v = Value::Record(Record::tagged("Article").with("key", 1));
        assert_eq!(v.to_json(), json!({"key": 1}));
    }

    #[test]
    fn display_is_compact() {
        let v = Value::Record(Record::new().with("key", 4).with("text", "tumpty"));
        assert_eq!(v.to_string(), "{ key: 4, text: tumpty }");
        assert_eq!(Value::seq([1, 2]).to_string(), "[ 1, 2 ]");
        assert_eq!(Value::map([(1, "x")]).to_string(), "Map { 1: x }");
        assert_eq!(Value::Seq(vec![]).to_string(), "[]");
    }

    #[test]
    fn expect_helpers_report_kind() {
        let err = Value::from(1).expect_record().unwrap_err();
        assert_eq!(
            err,
            ValueError::UnexpectedKind {
                expected: "record",
                actual: "number"
            }
        );
    }

    fn json_leaf() -> impl Strategy<Value = serde_json::Value> {
        prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(serde_json::Value::String),
        ]
    }

    fn json_tree() -> impl Strategy<Value = serde_json::Value> {
        json_leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                    .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn json_roundtrip_preserves_structure(json in json_tree()) {
            let value = Value::from(json.clone());
            prop_assert_eq!(value.to_json(), json);
        }

        #[test]
        fn order_agrees_with_equality(a in json_tree(), b in json_tree()) {
            let (a, b) = (Value::from(a), Value::from(b));
            prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a == b);
        }
    }
}
