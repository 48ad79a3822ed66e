//! Foundation types for typed-patch.
//!
//! This crate provides the dynamic data graph that the diff engine compares
//! and patches. Every other typed-patch crate depends on `tp-types`.
//!
//! # Key Types
//!
//! - [`Value`]: a node of the data graph: scalar, sequence, keyed collection, or record
//! - [`Record`]: a keyed record with an optional type tag
//! - [`ValueError`]: conversion failures when reading typed data out of a [`Value`]

pub mod error;
pub mod record;
pub mod value;

pub use error::{ValueError, ValueResult};
pub use record::Record;
pub use value::Value;
