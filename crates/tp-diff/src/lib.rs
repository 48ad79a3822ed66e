//! Typed structural diff and patch.
//!
//! Compares two values of the same shape and produces an operation tree
//! describing the delta, applies such a tree to a value, and moves trees over
//! a JSON wire format.
//!
//! # Key types
//!
//! - [`Operation`]: one node of the operation tree.
//! - [`PatchConfig`] / [`Options`]: per-slot comparison and patch settings.
//! - [`Diffable`]: the bridge from a Rust type to its record form.
//! - [`DiffSettings`]: the serializable subset of [`PatchConfig`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tp_diff::{apply, compare, PatchConfig};
//! use tp_types::Value;
//!
//! let a = Value::from(json!({"a": 1, "b": 2}));
//! let b = Value::from(json!({"a": 1, "b": 4}));
//! let op = compare(&a, &b, &PatchConfig::new());
//! assert_eq!(op.to_string(), "Mrg { b: Rpl 4 }");
//! assert_eq!(apply(&op, &a, &PatchConfig::new()).unwrap(), Some(b));
//! ```

pub mod apply;
pub mod codec;
pub mod compare;
pub mod edit_script;
pub mod error;
mod map_diff;
pub mod operation;
pub mod options;
mod seq_diff;
pub mod settings;
pub mod typed;

pub use apply::{apply, apply_slot};
pub use codec::{decode, decode_str, encode, IntoOperation};
pub use compare::{compare, compare_slots};
pub use edit_script::{edit_script, Edit};
pub use error::{DiffError, DiffResult};
pub use operation::{MapRow, OpTag, Operation, SeqRow};
pub use options::{Options, PatchConfig, TypeRegistry};
pub use settings::DiffSettings;
pub use typed::{diff, patch, Diffable};
