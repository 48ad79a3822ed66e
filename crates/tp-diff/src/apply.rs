//! Patch applier: replays an operation tree against a value.
//!
//! Application is pure. The target is never modified; a new value is built
//! and returned, or an error is reported before anything is produced. A
//! result of `None` means the operation removed the slot.
//!
//! Rows of keyed and positional deltas are stably sorted by key (or position)
//! before replay, so rows decoded out of canonical order apply the same as
//! rows produced by the differ.

use std::collections::BTreeMap;

use tracing::debug;

use tp_types::{Record, Value};

use crate::error::{DiffError, DiffResult};
use crate::operation::{MapRow, Operation, SeqRow};
use crate::options::{Options, PatchConfig};

/// Apply `op` to `target`, resolving `config` first.
pub fn apply(op: &Operation, target: &Value, config: &PatchConfig) -> DiffResult<Option<Value>> {
    apply_slot(op, Some(target), &Options::resolve(config))
}

/// Apply `op` to a possibly-absent slot with already resolved options.
pub fn apply_slot(
    op: &Operation,
    target: Option<&Value>,
    options: &Options,
) -> DiffResult<Option<Value>> {
    match op {
        Operation::NoChange => Ok(target.cloned()),
        Operation::Delete => Ok(None),
        Operation::Insert(payload) | Operation::Replace(payload) => {
            options.reconstruct(payload).map(Some)
        }
        Operation::Merge(fields) => apply_merge(fields, target, options).map(Some),
        Operation::MapDelta(rows) => apply_map_delta(rows, target, options).map(Some),
        Operation::SequenceDelta(rows) => apply_sequence_delta(rows, target, options).map(Some),
    }
}

fn found(target: Option<&Value>) -> &'static str {
    target.map_or("absent value", Value::kind)
}

fn apply_merge(
    fields: &BTreeMap<String, Operation>,
    target: Option<&Value>,
    options: &Options,
) -> DiffResult<Value> {
    let Some(Value::Record(record)) = target else {
        return Err(DiffError::TypeMismatch {
            op: "Mrg",
            found: found(target),
        });
    };

    let mut out = record.clone();
    for (name, op) in fields {
        let child_options = options.child_options(record, name);
        match apply_slot(op, record.get(name), &child_options)? {
            Some(value) => {
                out.insert(name.clone(), value);
            }
            None => {
                out.remove(name);
            }
        }
    }
    Ok(Value::Record(out))
}

fn apply_map_delta(rows: &[MapRow], target: Option<&Value>, options: &Options) -> DiffResult<Value> {
    let mut rows: Vec<&MapRow> = rows.iter().collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    debug!(rows = rows.len(), "applying keyed delta");

    match target {
        Some(Value::Map(entries)) => apply_to_map(&rows, entries, options),
        None if !options.map => apply_to_map(&rows, &BTreeMap::new(), options),
        Some(Value::Seq(items)) => apply_to_keyed_sequence(&rows, items, options),
        None => apply_to_keyed_sequence(&rows, &[], options),
        Some(other) => Err(DiffError::TypeMismatch {
            op: "Map",
            found: other.kind(),
        }),
    }
}

fn apply_to_map(
    rows: &[&MapRow],
    entries: &BTreeMap<Value, Value>,
    options: &Options,
) -> DiffResult<Value> {
    let element_options = options.element_options();
    let mut out = entries.clone();
    for row in rows {
        let next = apply_slot(&row.op, out.get(&row.key), &element_options)?;
        match next {
            Some(value) => {
                out.insert(row.key.clone(), value);
            }
            None => {
                out.remove(&row.key);
            }
        }
    }
    Ok(Value::Map(out))
}

fn apply_to_keyed_sequence(
    rows: &[&MapRow],
    items: &[Value],
    options: &Options,
) -> DiffResult<Value> {
    let element_options = options.element_options();
    let mut out = items.to_vec();
    for row in rows {
        // Inserts always add an element; other rows address the first
        // element carrying the key.
        let slot = match row.op {
            Operation::Insert(_) => None,
            _ => out.iter().position(|e| options.key(e) == row.key),
        };
        let current = slot.map(|i| options.value(&out[i]));
        let next = apply_slot(&row.op, current.as_ref(), &element_options)?;
        match (slot, next) {
            (Some(i), Some(value)) => out[i] = options.entry(&row.key, value),
            (Some(i), None) => {
                out.remove(i);
            }
            (None, Some(value)) => {
                // Land in key order when the sequence is kept sorted, after
                // any elements sharing the key.
                let at = out
                    .iter()
                    .position(|e| options.key(e) > row.key)
                    .unwrap_or(out.len());
                out.insert(at, options.entry(&row.key, value));
            }
            (None, None) => {}
        }
    }
    Ok(Value::Seq(out))
}

/// Resolve a pre-patch position against the working copy.
fn slot_index(position: usize, offset: isize, bound: usize, len: usize) -> DiffResult<usize> {
    isize::try_from(position)
        .ok()
        .and_then(|p| p.checked_add(offset))
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i < bound)
        .ok_or(DiffError::PositionOutOfRange { position, len })
}

fn apply_sequence_delta(
    rows: &[SeqRow],
    target: Option<&Value>,
    options: &Options,
) -> DiffResult<Value> {
    let items: &[Value] = match target {
        Some(Value::Seq(items)) => items,
        None => &[],
        Some(other) => {
            return Err(DiffError::TypeMismatch {
                op: "Arr",
                found: other.kind(),
            })
        }
    };

    let mut rows: Vec<&SeqRow> = rows.iter().collect();
    rows.sort_by_key(|r| r.position);
    debug!(rows = rows.len(), len = items.len(), "applying positional delta");

    let element_options = options.element_options();
    let mut out = items.to_vec();
    // Inserts minus deletes so far; rebases pre-patch positions.
    let mut offset: isize = 0;

    for row in rows {
        let len = out.len();
        match &row.op {
            Operation::NoChange => {}
            Operation::Insert(payload) => {
                let index = slot_index(row.position, offset, len + 1, len)?;
                out.insert(index, element_options.reconstruct(payload)?);
                offset += 1;
            }
            Operation::Delete => {
                let index = slot_index(row.position, offset, len, len)?;
                out.remove(index);
                offset -= 1;
            }
            op => {
                let index = slot_index(row.position, offset, len, len)?;
                match apply_slot(op, Some(&out[index]), &element_options)? {
                    Some(value) => out[index] = value,
                    None => {
                        out.remove(index);
                        offset -= 1;
                    }
                }
            }
        }
    }
    Ok(Value::Seq(out))
}

impl Operation {
    /// Apply this operation to `target`. See [`apply`].
    pub fn apply(&self, target: &Value, config: &PatchConfig) -> DiffResult<Option<Value>> {
        apply(self, target, config)
    }
}
