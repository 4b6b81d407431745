//! Reverse phandle index
//!
//! Phandle values are edges from a property to another node. The index maps
//! each target to the entries referencing it so consumers can be found
//! without scanning every property of every node.

use std::collections::HashMap;

use crate::graph::{HardwareNode, NodeId};

/// One phandle entry pointing at an indexed target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Node owning the referencing property
    pub source: NodeId,
    /// Name of the referencing property
    pub property: String,
    /// Position of the entry among the property's phandle entries
    pub entry: usize,
    /// Offset of the phandle within the property's value list
    pub cell_offset: usize,
    /// Parameter cells following the phandle
    pub cells: Vec<u64>,
}

/// Target → referencing entries, built once per graph snapshot
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    by_target: HashMap<NodeId, Vec<Reference>>,
}

impl ReferenceIndex {
    /// Index every resolved phandle entry. Entries are kept in node order,
    /// then property order, then entry order.
    pub fn build(nodes: &[HardwareNode]) -> Self {
        let mut by_target: HashMap<NodeId, Vec<Reference>> = HashMap::new();

        for node in nodes {
            for prop in &node.properties {
                for (entry, phandle) in prop.phandle_entries().into_iter().enumerate() {
                    let Some(target) = phandle.target() else {
                        continue;
                    };
                    by_target.entry(target).or_default().push(Reference {
                        source: node.id,
                        property: prop.name.clone(),
                        entry,
                        cell_offset: phandle.offset,
                        cells: phandle.cells,
                    });
                }
            }
        }

        Self { by_target }
    }

    pub fn to(&self, target: NodeId) -> &[Reference] {
        self.by_target
            .get(&target)
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct referenced targets
    pub fn target_count(&self) -> usize {
        self.by_target.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PHandleRef, Property, Value};

    fn node(id: usize, properties: Vec<Property>) -> HardwareNode {
        HardwareNode {
            id: NodeId(id),
            path: format!("/n{}", id),
            name: format!("n{}", id),
            labels: Vec::new(),
            parent: None,
            children: Vec::new(),
            properties,
            binding: None,
            source: None,
        }
    }

    fn phandle(target: Option<usize>) -> Value {
        Value::PHandle(PHandleRef {
            reference: "&x".to_string(),
            target: target.map(NodeId),
        })
    }

    #[test]
    fn test_index_skips_dangling_entries() {
        let nodes = vec![
            node(0, Vec::new()),
            node(
                1,
                vec![Property::new(
                    "clocks",
                    vec![phandle(Some(0)), Value::Cell(4), phandle(None), Value::Cell(2)],
                )],
            ),
            node(
                2,
                vec![Property::new("clocks", vec![phandle(Some(0)), Value::Cell(7)])],
            ),
        ];

        let index = ReferenceIndex::build(&nodes);
        let refs = index.to(NodeId(0));
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].source, NodeId(1));
        assert_eq!(refs[0].cells, vec![4]);
        assert_eq!(refs[1].source, NodeId(2));
        assert_eq!(refs[1].entry, 0);
        assert_eq!(index.target_count(), 1);
        assert!(index.to(NodeId(1)).is_empty());
    }
}
