//! Sequence differ: positional diff driven by the edit-script primitive.
//!
//! Row positions are pre-patch indices. An inserted element's position is the
//! pre-patch index it goes in front of, so appending to a one-element
//! sequence yields a row at position 1. Elements the identity function pairs
//! up but whose values differ get a nested row at their pre-patch index.

use tp_types::Value;

use crate::compare::compare_slots;
use crate::edit_script::{edit_script, Edit};
use crate::operation::{Operation, SeqRow};
use crate::options::Options;

pub(crate) fn diff_sequences(a: &[Value], b: &[Value], options: &Options) -> Operation {
    let element_options = options.element_options();
    let script = edit_script(a, b, |x, y| element_options.same_identity(x, y));

    let mut rows = Vec::new();
    for edit in script {
        match edit {
            Edit::Insert {
                old_index,
                new_index,
            } => rows.push(SeqRow::new(old_index, Operation::Insert(b[new_index].clone()))),
            Edit::Delete { old_index } => rows.push(SeqRow::new(old_index, Operation::Delete)),
            Edit::Common {
                old_index,
                new_index,
            } => {
                let (x, y) = (&a[old_index], &b[new_index]);
                if x != y {
                    let op = compare_slots(Some(x), Some(y), &element_options);
                    if !op.is_no_change() {
                        rows.push(SeqRow::new(old_index, op));
                    }
                }
            }
        }
    }

    Operation::sequence_delta(rows)
}
