//! The comparator: picks a diff strategy for each pair of values.
//!
//! Dispatch rules, in order:
//!
//! 1. equal values produce `NoChange`;
//! 2. an absent target produces `Delete`;
//! 3. an absent source produces `Replace` of the target;
//! 4. two sequences go to the map-style differ when `map` is set and to the
//!    sequence differ otherwise; two native maps go to the map-style differ;
//!    two records of the same type go to the keyed-object differ;
//! 5. anything else produces `Replace` of the target.
//!
//! Records of different types are always replaced wholesale, even when they
//! share most of their fields.

use std::collections::BTreeMap;

use tracing::debug;

use tp_types::{Record, Value};

use crate::map_diff::{diff_keyed_sequences, diff_maps};
use crate::operation::Operation;
use crate::options::{Options, PatchConfig};
use crate::seq_diff::diff_sequences;

/// Compare two values and produce the operation turning `a` into `b`.
pub fn compare(a: &Value, b: &Value, config: &PatchConfig) -> Operation {
    compare_slots(Some(a), Some(b), &Options::resolve(config))
}

/// Compare two possibly-absent slots with already resolved options.
pub fn compare_slots(a: Option<&Value>, b: Option<&Value>, options: &Options) -> Operation {
    let (a, b) = match (a, b) {
        (None, None) => return Operation::NoChange,
        (Some(_), None) => return Operation::Delete,
        (None, Some(b)) => return Operation::Replace(b.clone()),
        (Some(a), Some(b)) if a == b => return Operation::NoChange,
        (Some(a), Some(b)) => (a, b),
    };

    match (a, b) {
        (Value::Seq(x), Value::Seq(y)) if options.map => {
            debug!(left = x.len(), right = y.len(), "diffing sequences as keyed collections");
            diff_keyed_sequences(x, y, options)
        }
        (Value::Seq(x), Value::Seq(y)) => {
            debug!(left = x.len(), right = y.len(), "diffing sequences");
            diff_sequences(x, y, options)
        }
        (Value::Map(x), Value::Map(y)) => {
            debug!(left = x.len(), right = y.len(), "diffing maps");
            diff_maps(x, y, options)
        }
        (Value::Record(x), Value::Record(y)) if x.same_type(y) => diff_records(x, y, options),
        _ => Operation::Replace(b.clone()),
    }
}

/// Keyed-object differ: compares two records of the same type field by field.
///
/// Only changed fields are recorded. Fields missing from `b` become `Delete`,
/// fields only in `b` become `Replace`.
fn diff_records(a: &Record, b: &Record, options: &Options) -> Operation {
    let mut fields = BTreeMap::new();

    for (name, old) in a.iter() {
        let new = b.get(name);
        if new == Some(old) {
            continue;
        }
        let op = compare_slots(Some(old), new, &options.child_options(a, name));
        if !op.is_no_change() {
            fields.insert(name.to_string(), op);
        }
    }

    for (name, new) in b.iter() {
        if !a.contains(name) {
            let op = compare_slots(None, Some(new), &options.child_options(b, name));
            fields.insert(name.to_string(), op);
        }
    }

    debug!(
        type_tag = a.type_tag().unwrap_or("-"),
        changed = fields.len(),
        "diffed record"
    );
    Operation::merge(fields)
}
