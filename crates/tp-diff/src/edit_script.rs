//! Shortest edit script between two sequences.
//!
//! Uses the `similar` crate's Myers implementation with a caller-supplied
//! identity test instead of `PartialEq`, and flattens the resulting hunks into
//! per-element events.
//!
//! Events are reported left to right. Every event carries the pre-patch
//! (`old_index`) position it applies at; an insertion's `old_index` is the
//! old element it lands in front of (`old.len()` for an append).

use std::convert::Infallible;

use similar::algorithms::{myers, Capture};
use similar::DiffOp;

/// A single step of an edit script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edit {
    /// `old[old_index]` and `new[new_index]` are the same logical element.
    Common { old_index: usize, new_index: usize },
    /// `old[old_index]` has no counterpart in `new`.
    Delete { old_index: usize },
    /// `new[new_index]` has no counterpart in `old` and is inserted before
    /// `old[old_index]`.
    Insert { old_index: usize, new_index: usize },
}

/// Adapts an identity function to the `PartialEq` bound the diff algorithm
/// expects.
struct Ident<'a, T> {
    item: &'a T,
    same: &'a dyn Fn(&T, &T) -> bool,
}

impl<T> PartialEq for Ident<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        (self.same)(self.item, other.item)
    }
}

/// Compute a minimal edit script turning `old` into `new`, treating two
/// elements as the same when `same` says so.
pub fn edit_script<T, F>(old: &[T], new: &[T], same: F) -> Vec<Edit>
where
    F: Fn(&T, &T) -> bool,
{
    let same: &dyn Fn(&T, &T) -> bool = &same;
    let old_ids: Vec<Ident<'_, T>> = old.iter().map(|item| Ident { item, same }).collect();
    let new_ids: Vec<Ident<'_, T>> = new.iter().map(|item| Ident { item, same }).collect();

    let mut capture = Capture::new();
    let outcome: Result<(), Infallible> = myers::diff(
        &mut capture,
        &old_ids,
        0..old_ids.len(),
        &new_ids,
        0..new_ids.len(),
    );
    if let Err(never) = outcome {
        match never {}
    }

    let mut edits = Vec::with_capacity(old.len().max(new.len()));
    for op in capture.into_ops() {
        match op {
            DiffOp::Equal {
                old_index,
                new_index,
                len,
            } => edits.extend((0..len).map(|i| Edit::Common {
                old_index: old_index + i,
                new_index: new_index + i,
            })),
            DiffOp::Delete {
                old_index, old_len, ..
            } => edits.extend((old_index..old_index + old_len).map(|i| Edit::Delete { old_index: i })),
            DiffOp::Insert {
                old_index,
                new_index,
                new_len,
            } => edits.extend((new_index..new_index + new_len).map(|i| Edit::Insert {
                old_index,
                new_index: i,
            })),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                edits.extend((old_index..old_index + old_len).map(|i| Edit::Delete { old_index: i }));
                edits.extend((new_index..new_index + new_len).map(|i| Edit::Insert {
                    old_index: old_index + old_len,
                    new_index: i,
                }));
            }
        }
    }
    edits
}
