//! The operation tree: a typed description of the delta between two values.
//!
//! Operations are plain values. They are never mutated after construction and
//! compare structurally.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tp_types::Value;

use crate::error::DiffError;

/// The closed set of operation kinds, with their stable wire tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpTag {
    NoChange,
    Delete,
    Insert,
    Replace,
    Merge,
    MapDelta,
    SequenceDelta,
}

impl OpTag {
    pub const ALL: [OpTag; 7] = [
        OpTag::NoChange,
        OpTag::Delete,
        OpTag::Insert,
        OpTag::Replace,
        OpTag::Merge,
        OpTag::MapDelta,
        OpTag::SequenceDelta,
    ];

    /// The tag string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            OpTag::NoChange => "NOP",
            OpTag::Delete => "Del",
            OpTag::Insert => "Ins",
            OpTag::Replace => "Rpl",
            OpTag::Merge => "Mrg",
            OpTag::MapDelta => "Map",
            OpTag::SequenceDelta => "Arr",
        }
    }
}

impl FromStr for OpTag {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| DiffError::UnknownTag(s.to_string()))
    }
}

impl fmt::Display for OpTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a keyed-collection delta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapRow {
    pub key: Value,
    pub op: Operation,
}

impl MapRow {
    pub fn new(key: Value, op: Operation) -> Self {
        Self { key, op }
    }
}

/// One row of a sequence delta. `position` is a pre-patch index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeqRow {
    pub position: usize,
    pub op: Operation,
}

impl SeqRow {
    pub fn new(position: usize, op: Operation) -> Self {
        Self { position, op }
    }
}

/// A node of the operation tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Operation {
    /// The target equals the source at this position.
    #[default]
    NoChange,
    /// Remove the value at this position.
    Delete,
    /// Introduce a new value at this position.
    Insert(Value),
    /// Unconditionally replace the value at this position.
    Replace(Value),
    /// Apply each child operation to the named field of a record.
    Merge(BTreeMap<String, Operation>),
    /// Apply each row to the entry of a keyed collection with that key.
    MapDelta(Vec<MapRow>),
    /// Apply each row to an ordered sequence at the given position.
    SequenceDelta(Vec<SeqRow>),
}

impl Operation {
    pub fn tag(&self) -> OpTag {
        match self {
            Operation::NoChange => OpTag::NoChange,
            Operation::Delete => OpTag::Delete,
            Operation::Insert(_) => OpTag::Insert,
            Operation::Replace(_) => OpTag::Replace,
            Operation::Merge(_) => OpTag::Merge,
            Operation::MapDelta(_) => OpTag::MapDelta,
            Operation::SequenceDelta(_) => OpTag::SequenceDelta,
        }
    }

    pub fn is_no_change(&self) -> bool {
        matches!(self, Operation::NoChange)
    }

    /// Build a merge node, collapsing to `NoChange` when no field changed.
    pub fn merge(fields: BTreeMap<String, Operation>) -> Self {
        if fields.is_empty() {
            Operation::NoChange
        } else {
            Operation::Merge(fields)
        }
    }

    /// Build a keyed delta, collapsing to `NoChange` when there are no rows.
    pub fn map_delta(rows: Vec<MapRow>) -> Self {
        if rows.is_empty() {
            Operation::NoChange
        } else {
            Operation::MapDelta(rows)
        }
    }

    /// Build a positional delta, collapsing to `NoChange` when there are no rows.
    pub fn sequence_delta(rows: Vec<SeqRow>) -> Self {
        if rows.is_empty() {
            Operation::NoChange
        } else {
            Operation::SequenceDelta(rows)
        }
    }
}

fn write_rows<'a, K: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    rows: impl Iterator<Item = (K, &'a Operation)>,
) -> fmt::Result {
    let mut first = true;
    for (key, op) in rows {
        if !first {
            write!(f, ",")?;
        }
        first = false;
        write!(f, " Row {{ {key}, {op} }}")?;
    }
    Ok(())
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag();
        match self {
            Operation::NoChange | Operation::Delete => write!(f, "{tag}"),
            Operation::Insert(value) | Operation::Replace(value) => write!(f, "{tag} {value}"),
            Operation::Merge(fields) => {
                write!(f, "{tag} {{")?;
                for (i, (name, op)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {name}: {op}")?;
                }
                write!(f, " }}")
            }
            Operation::MapDelta(rows) => {
                write!(f, "{tag} [")?;
                write_rows(f, rows.iter().map(|r| (&r.key, &r.op)))?;
                write!(f, " ]")
            }
            Operation::SequenceDelta(rows) => {
                write!(f, "{tag} [")?;
                write_rows(f, rows.iter().map(|r| (r.position, &r.op)))?;
                write!(f, " ]")
            }
        }
    }
}
