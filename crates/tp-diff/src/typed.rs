//! Statically typed front end.
//!
//! A Rust type takes part in diffing by implementing [`Diffable`]: it lowers
//! itself to a tagged [`Record`](tp_types::Record), rebuilds itself from one,
//! and may declare per-field options. The rebuild doubles as the
//! reconstruction hook used when a patch inserts or replaces an element of
//! that type.

use std::sync::Arc;

use tp_types::Value;

use crate::apply::apply;
use crate::compare::compare;
use crate::error::{DiffError, DiffResult};
use crate::operation::Operation;
use crate::options::{PatchConfig, TypeRegistry};

/// A record type that can be diffed, patched and reconstructed.
pub trait Diffable: Sized {
    /// Type tag carried by the record form of this type.
    const TYPE_TAG: &'static str;

    /// Lower to a value, normally a record tagged with [`Self::TYPE_TAG`].
    fn to_value(&self) -> Value;

    /// Rebuild from a value. Must accept untagged records, since that is what
    /// a payload decoded from the wire looks like.
    fn from_value(value: &Value) -> DiffResult<Self>;

    /// Override options for one of this type's fields.
    fn field_options(_field: &str) -> Option<PatchConfig> {
        None
    }

    /// Register the `Diffable` types nested in this one's fields, so their
    /// field options apply below the root. Only needed for nested types that
    /// override [`Diffable::field_options`].
    fn register_nested(_registry: &mut TypeRegistry) {}

    /// Turn a raw payload into the typed value form of `Self`.
    fn reconstruct(payload: &Value) -> DiffResult<Value> {
        Ok(Self::from_value(payload)?.to_value())
    }
}

/// `config` with `T` added to its type registry.
fn registered<T: Diffable + 'static>(config: &PatchConfig) -> PatchConfig {
    let mut registry = config
        .registry
        .as_deref()
        .cloned()
        .unwrap_or_else(TypeRegistry::new);
    registry.register::<T>();
    config.clone().with_registry(Arc::new(registry))
}

/// Diff two instances of a [`Diffable`] type.
pub fn diff<T: Diffable + 'static>(old: &T, new: &T, config: &PatchConfig) -> Operation {
    compare(&old.to_value(), &new.to_value(), &registered::<T>(config))
}

/// Apply `op` to a [`Diffable`] instance and rebuild the result.
pub fn patch<T: Diffable + 'static>(
    op: &Operation,
    target: &T,
    config: &PatchConfig,
) -> DiffResult<T> {
    let value = apply(op, &target.to_value(), &registered::<T>(config))?
        .ok_or(DiffError::RootRemoved)?;
    T::from_value(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_types::Record;

    #[derive(Clone, Debug, PartialEq)]
    struct Ingredient {
        key: i64,
        text: String,
    }

    impl Diffable for Ingredient {
        const TYPE_TAG: &'static str = "Ingredient";

        fn to_value(&self) -> Value {
            Value::Record(
                Record::tagged(Self::TYPE_TAG)
                    .with("key", self.key)
                    .with("text", self.text.as_str()),
            )
        }

        fn from_value(value: &Value) -> DiffResult<Self> {
            let record = value.expect_record()?;
            Ok(Self {
                key: record.require("key")?.expect_i64()?,
                text: record.require("text")?.expect_str()?.to_string(),
            })
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Breakfast {
        drink: String,
        ingredients: Vec<Ingredient>,
    }

    impl Diffable for Breakfast {
        const TYPE_TAG: &'static str = "Breakfast";

        fn to_value(&self) -> Value {
            Value::Record(
                Record::tagged(Self::TYPE_TAG)
                    .with("drink", self.drink.as_str())
                    .with("ingredients", Value::seq(self.ingredients.iter().map(Diffable::to_value))),
            )
        }

        fn from_value(value: &Value) -> DiffResult<Self> {
            let record = value.expect_record()?;
            let ingredients = match record.require("ingredients")? {
                Value::Seq(items) => items
                    .iter()
                    .map(Ingredient::from_value)
                    .collect::<DiffResult<Vec<_>>>()?,
                other => {
                    return Err(DiffError::TypeMismatch {
                        op: "Breakfast::from_value",
                        found: other.kind(),
                    })
                }
            };
            Ok(Self {
                drink: record.require("drink")?.expect_str()?.to_string(),
                ingredients,
            })
        }

        fn field_options(field: &str) -> Option<PatchConfig> {
            (field == "ingredients")
                .then(|| PatchConfig::keyed_map("key").element_type::<Ingredient>())
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Jar {
        key: i64,
        labels: Vec<String>,
    }

    impl Diffable for Jar {
        const TYPE_TAG: &'static str = "Jar";

        fn to_value(&self) -> Value {
            Value::Record(
                Record::tagged(Self::TYPE_TAG)
                    .with("key", self.key)
                    .with("labels", Value::seq(self.labels.iter().map(String::as_str))),
            )
        }

        fn from_value(value: &Value) -> DiffResult<Self> {
            let record = value.expect_record()?;
            let labels = match record.require("labels")? {
                Value::Seq(items) => items
                    .iter()
                    .map(|l| Ok::<_, DiffError>(l.expect_str()?.to_string()))
                    .collect::<DiffResult<Vec<_>>>()?,
                other => {
                    return Err(DiffError::TypeMismatch {
                        op: "Jar::from_value",
                        found: other.kind(),
                    })
                }
            };
            Ok(Self {
                key: record.require("key")?.expect_i64()?,
                labels,
            })
        }

        fn field_options(field: &str) -> Option<PatchConfig> {
            (field == "labels").then(|| PatchConfig::new().with_map(true))
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Shelf {
        jars: Vec<Jar>,
    }

    impl Diffable for Shelf {
        const TYPE_TAG: &'static str = "Shelf";

        fn to_value(&self) -> Value {
            Value::Record(
                Record::tagged(Self::TYPE_TAG)
                    .with("jars", Value::seq(self.jars.iter().map(Diffable::to_value))),
            )
        }

        fn from_value(value: &Value) -> DiffResult<Self> {
            let jars = match value.expect_record()?.require("jars")? {
                Value::Seq(items) => items
                    .iter()
                    .map(Jar::from_value)
                    .collect::<DiffResult<Vec<_>>>()?,
                other => {
                    return Err(DiffError::TypeMismatch {
                        op: "Shelf::from_value",
                        found: other.kind(),
                    })
                }
            };
            Ok(Self { jars })
        }

        fn field_options(field: &str) -> Option<PatchConfig> {
            (field == "jars").then(|| PatchConfig::keyed_map("key").element_type::<Jar>())
        }

        fn register_nested(registry: &mut TypeRegistry) {
            registry.register::<Jar>();
        }
    }

    /// Refers to itself through `register_nested`.
    struct Node;

    impl Diffable for Node {
        const TYPE_TAG: &'static str = "Node";

        fn to_value(&self) -> Value {
            Value::Record(Record::tagged(Self::TYPE_TAG))
        }

        fn from_value(_value: &Value) -> DiffResult<Self> {
            Ok(Node)
        }

        fn register_nested(registry: &mut TypeRegistry) {
            registry.register::<Node>();
        }
    }

    fn ingredient(key: i64, text: &str) -> Ingredient {
        Ingredient {
            key,
            text: text.into(),
        }
    }

    fn breakfast(drink: &str, ingredients: Vec<Ingredient>) -> Breakfast {
        Breakfast {
            drink: drink.into(),
            ingredients,
        }
    }

    #[test]
    fn identical_instances_do_not_differ() {
        let b = breakfast("coffee", vec![ingredient(1, "flour")]);
        assert!(diff(&b, &b.clone(), &PatchConfig::new()).is_no_change());
    }

    #[test]
    fn field_options_shape_the_diff() {
        let b1 = breakfast("coffee", vec![ingredient(2, "eggs"), ingredient(1, "flour")]);
        let b2 = breakfast(
            "oj",
            vec![ingredient(2, "eggs"), ingredient(1, "flour"), ingredient(3, "butter")],
        );
        let op = diff(&b1, &b2, &PatchConfig::new());
        assert_eq!(
            op.to_string(),
            "Mrg { drink: Rpl oj, ingredients: Map [ Row { 3, Ins { key: 3, text: butter } } ] }"
        );
        assert_eq!(patch(&op, &b1, &PatchConfig::new()).unwrap(), b2);
    }

    #[test]
    fn inserted_elements_are_reconstructed_after_the_wire() {
        let b1 = breakfast("coffee", vec![ingredient(1, "flour")]);
        let b2 = breakfast("coffee", vec![ingredient(1, "flour"), ingredient(2, "eggs")]);
        let op = crate::codec::decode(&diff(&b1, &b2, &PatchConfig::new()).encode()).unwrap();

        let value = apply(&op, &b1.to_value(), &registered::<Breakfast>(&PatchConfig::new()))
            .unwrap()
            .unwrap();
        let items = value.get("ingredients").and_then(Value::as_seq).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.type_tag() == Some("Ingredient")));
    }

    #[test]
    fn nested_types_contribute_field_options() {
        let jar = |labels: &[&str]| Jar {
            key: 1,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        };
        let old = Shelf { jars: vec![jar(&["a", "b"])] };
        let new = Shelf { jars: vec![jar(&["a", "b", "c"])] };

        let op = diff(&old, &new, &PatchConfig::new());
        assert_eq!(
            op.to_string(),
            "Mrg { jars: Map [ Row { 1, Mrg { labels: Map [ Row { c, Ins c } ] } } ] }"
        );
        assert_eq!(patch(&op, &old, &PatchConfig::new()).unwrap(), new);
    }

    #[test]
    fn registration_stops_at_known_tags() {
        let mut registry = TypeRegistry::new();
        registry.register::<Node>().register::<Shelf>();
        assert!(registry.contains("Node"));
        assert!(registry.contains("Shelf"));
        assert!(registry.contains("Jar"));
    }

    #[test]
    fn deleting_the_root_is_an_error() {
        let b = breakfast("tea", vec![]);
        let err = patch(&Operation::Delete, &b, &PatchConfig::new()).unwrap_err();
        assert!(matches!(err, DiffError::RootRemoved));
    }

    #[test]
    fn reconstruct_rejects_bad_payloads() {
        let err = Ingredient::reconstruct(&Value::from(3)).unwrap_err();
        assert!(matches!(err, DiffError::Value(_)));
    }
}
