//! Node properties and their value lists

use serde::{Deserialize, Serialize};

use crate::graph::{NodeId, SourceLocation};

/// A reference from a property value to another node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PHandleRef {
    /// Reference as written (`&label` or `/path`)
    pub reference: String,
    /// Resolved target, `None` when the reference dangles
    pub target: Option<NodeId>,
}

impl PHandleRef {
    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

/// One element of a property value list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Cell(u64),
    String(String),
    PHandle(PHandleRef),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Cell(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::PHandle(p) => write!(f, "{}", p.reference),
        }
    }
}

/// A phandle followed by its parameter cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PHandleEntry<'a> {
    pub phandle: &'a PHandleRef,
    /// Offset of the phandle within the property's value list
    pub offset: usize,
    pub cells: Vec<u64>,
}

impl PHandleEntry<'_> {
    pub fn target(&self) -> Option<NodeId> {
        self.phandle.target
    }
}

/// A named property belonging to exactly one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub values: Vec<Value>,
    pub source: Option<SourceLocation>,
}

impl Property {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
            source: None,
        }
    }

    /// Boolean properties carry no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All numeric cells in declaration order
    pub fn cells(&self) -> Vec<u64> {
        self.values
            .iter()
            .filter_map(|v| match v {
                Value::Cell(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// First numeric cell
    pub fn cell(&self) -> Option<u64> {
        self.values.iter().find_map(|v| match v {
            Value::Cell(c) => Some(*c),
            _ => None,
        })
    }

    /// All string values in declaration order
    pub fn strings(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// First string value
    pub fn string(&self) -> Option<&str> {
        self.values.iter().find_map(|v| match v {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn first_phandle(&self) -> Option<&PHandleRef> {
        self.values.iter().find_map(|v| match v {
            Value::PHandle(p) => Some(p),
            _ => None,
        })
    }

    /// Group the value list into phandle entries.
    ///
    /// Each phandle starts a new entry and collects the numeric cells that
    /// follow it. Values before the first phandle belong to no entry.
    pub fn phandle_entries(&self) -> Vec<PHandleEntry<'_>> {
        let mut entries: Vec<PHandleEntry<'_>> = Vec::new();
        for (offset, value) in self.values.iter().enumerate() {
            match value {
                Value::PHandle(phandle) => entries.push(PHandleEntry {
                    phandle,
                    offset,
                    cells: Vec::new(),
                }),
                Value::Cell(c) => {
                    if let Some(entry) = entries.last_mut() {
                        entry.cells.push(*c);
                    }
                }
                Value::String(_) => {}
            }
        }
        entries
    }

    /// Values joined for display, e.g. `100000` or `&dma1, 3`
    pub fn display_value(&self) -> String {
        self.values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phandle(reference: &str, target: Option<usize>) -> Value {
        Value::PHandle(PHandleRef {
            reference: reference.to_string(),
            target: target.map(NodeId),
        })
    }

    #[test]
    fn test_phandle_entries_group_cells() {
        let prop = Property::new(
            "cs-gpios",
            vec![
                phandle("&gpio0", Some(3)),
                Value::Cell(17),
                Value::Cell(1),
                phandle("&gpio1", None),
                Value::Cell(4),
            ],
        );

        let entries = prop.phandle_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].target(), Some(NodeId(3)));
        assert_eq!(entries[0].cells, vec![17, 1]);
        assert_eq!(entries[0].offset, 0);
        assert_eq!(entries[1].target(), None);
        assert_eq!(entries[1].cells, vec![4]);
        assert_eq!(entries[1].offset, 3);
    }

    #[test]
    fn test_leading_cells_belong_to_no_entry() {
        let prop = Property::new("clocks", vec![Value::Cell(9), phandle("&clk", Some(1))]);
        let entries = prop.phandle_entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].cells.is_empty());
    }

    #[test]
    fn test_string_and_cell_accessors() {
        let prop = Property::new(
            "mixed",
            vec![
                Value::String("a".to_string()),
                Value::Cell(5),
                Value::String("b".to_string()),
            ],
        );
        assert_eq!(prop.strings(), vec!["a", "b"]);
        assert_eq!(prop.string(), Some("a"));
        assert_eq!(prop.cell(), Some(5));
        assert_eq!(prop.display_value(), "a, 5, b");
        assert!(Property::new("status-ok", Vec::new()).is_empty());
    }
}
