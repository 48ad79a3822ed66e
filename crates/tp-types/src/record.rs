use std::collections::BTreeMap;

use crate::error::{ValueError, ValueResult};
use crate::value::Value;

/// A keyed record: a set of named fields plus an optional type tag.
///
/// An untagged record is a plain structural object, which is what every JSON
/// object decodes to. A tagged record stands for an instance of a named record
/// type; two records are considered the same concrete type only when their
/// tags are equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record {
    type_tag: Option<String>,
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty, untagged record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record carrying the given type tag.
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            type_tag: Some(tag.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The record's type tag, or `None` for a plain structural object.
    pub fn type_tag(&self) -> Option<&str> {
        self.type_tag.as_deref()
    }

    /// Returns a copy of this record re-tagged as `tag`.
    pub fn retag(mut self, tag: Option<String>) -> Self {
        self.type_tag = tag;
        self
    }

    /// Returns `true` if both records have the same concrete type.
    pub fn same_type(&self, other: &Record) -> bool {
        self.type_tag == other.type_tag
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a field that must be present.
    pub fn require(&self, name: &str) -> ValueResult<&Value> {
        self.fields
            .get(name)
            .ok_or_else(|| ValueError::MissingField(name.to_string()))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            type_tag: None,
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_records_share_a_type() {
        let a = Record::new().with("a", 1);
        let b = Record::new().with("b", 2);
        assert!(a.same_type(&b));
    }

    #[test]
    fn tags_distinguish_types() {
        let a = Record::tagged("Article").with("key", 1);
        let b = Record::new().with("key", 1);
        assert!(!a.same_type(&b));
        assert_ne!(a, b);
        assert_eq!(a.clone().retag(None), b);
    }

    #[test]
    fn require_reports_missing_field() {
        let rec = Record::new().with("present", true);
        assert!(rec.require("present").is_ok());
        assert_eq!(
            rec.require("absent").unwrap_err(),
            ValueError::MissingField("absent".into())
        );
    }

    #[test]
    fn names_are_sorted() {
        let rec = Record::new().with("zeta", 1).with("alpha", 2).with("mid", 3);
        let names: Vec<&str> = rec.names().collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
