//! Map-style differ: sorted merge-join over keyed collections.
//!
//! Works on native maps and on sequences whose elements carry their own key
//! (`options.key`). Both sides are sorted by key, then walked with two
//! cursors:
//!
//! - a key only on the left produces a `Delete` row;
//! - a key only on the right produces an `Insert` row with the entry value;
//! - a key on both sides with unequal values produces one nested row.
//!
//! Rows come out in ascending key order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::trace;

use tp_types::Value;

use crate::compare::compare_slots;
use crate::operation::{MapRow, Operation};
use crate::options::Options;

/// Diff two native keyed collections.
pub(crate) fn diff_maps(
    a: &BTreeMap<Value, Value>,
    b: &BTreeMap<Value, Value>,
    options: &Options,
) -> Operation {
    // Native maps iterate in key order already.
    let left: Vec<(Value, Value)> = a.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    let right: Vec<(Value, Value)> = b.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    merge_join(left, right, options)
}

/// Diff two sequences treated as keyed collections.
pub(crate) fn diff_keyed_sequences(a: &[Value], b: &[Value], options: &Options) -> Operation {
    let mut left = entries(a, options);
    let mut right = entries(b, options);
    if !options.sorted {
        sort_entries(&mut left);
        sort_entries(&mut right);
    }
    merge_join(left, right, options)
}

fn entries(elements: &[Value], options: &Options) -> Vec<(Value, Value)> {
    elements
        .iter()
        .map(|e| (options.key(e), options.value(e)))
        .collect()
}

/// Key order, ties broken by value so the result is deterministic.
fn sort_entries(entries: &mut [(Value, Value)]) {
    entries.sort_by(|x, y| x.0.cmp(&y.0).then_with(|| x.1.cmp(&y.1)));
}

fn merge_join(left: Vec<(Value, Value)>, right: Vec<(Value, Value)>, options: &Options) -> Operation {
    if left.is_empty() && right.is_empty() {
        return Operation::NoChange;
    }
    if left.is_empty() {
        return Operation::map_delta(
            right
                .into_iter()
                .map(|(k, v)| MapRow::new(k, Operation::Insert(v)))
                .collect(),
        );
    }
    if right.is_empty() {
        return Operation::map_delta(
            left.into_iter()
                .map(|(k, _)| MapRow::new(k, Operation::Delete))
                .collect(),
        );
    }

    let element_options = options.element_options();
    let mut rows = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        let (lk, lv) = &left[i];
        let (rk, rv) = &right[j];
        match lk.cmp(rk) {
            Ordering::Less => {
                trace!(key = %lk, "left only");
                rows.push(MapRow::new(lk.clone(), Operation::Delete));
                i += 1;
            }
            Ordering::Greater => {
                trace!(key = %rk, "right only");
                rows.push(MapRow::new(rk.clone(), Operation::Insert(rv.clone())));
                j += 1;
            }
            Ordering::Equal => {
                if lv != rv {
                    let op = compare_slots(Some(lv), Some(rv), &element_options);
                    if !op.is_no_change() {
                        trace!(key = %rk, op = %op.tag(), "both sides");
                        rows.push(MapRow::new(rk.clone(), op));
                    }
                }
                i += 1;
                j += 1;
            }
        }
    }

    rows.extend(
        left[i..]
            .iter()
            .map(|(k, _)| MapRow::new(k.clone(), Operation::Delete)),
    );
    rows.extend(
        right[j..]
            .iter()
            .map(|(k, v)| MapRow::new(k.clone(), Operation::Insert(v.clone()))),
    );

    Operation::map_delta(rows)
}
