//! Hardware graph - the linked, read-only devicetree snapshot
//!
//! Nodes live in an arena indexed by [`NodeId`] in depth-first pre-order.
//! Parent/child links form the ownership tree; phandle values are lookups
//! into the same arena and are indexed separately by [`ReferenceIndex`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::binding::Binding;
use crate::property::Property;
use crate::references::{Reference, ReferenceIndex};

/// Largest `#*-cells` count accepted when decoding cell arrays
pub const MAX_CELLS: usize = 4;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to parse graph snapshot: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Unknown node id {0}")]
    UnknownNode(usize),
    #[error("Duplicate node path: {0}")]
    DuplicatePath(String),
}

/// Index of a node in the graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a node or property was declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    #[serde(default)]
    pub line: Option<u32>,
}

/// One decoded `reg` entry. Either field may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterEntry {
    pub address: Option<u64>,
    pub size: Option<u64>,
}

impl RegisterEntry {
    /// Both address and size are known
    pub fn span(&self) -> Option<(u64, u64)> {
        match (self.address, self.size) {
            (Some(address), Some(size)) => Some((address, size)),
            _ => None,
        }
    }
}

/// A vertex in the hardware graph
#[derive(Debug, Clone)]
pub struct HardwareNode {
    pub id: NodeId,
    /// Full path, e.g. `/soc/flash-controller@4001e000/flash@0`
    pub path: String,
    /// Local name including unit address, e.g. `flash@0`
    pub name: String,
    pub labels: Vec<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub properties: Vec<Property>,
    pub binding: Option<Arc<Binding>>,
    pub source: Option<SourceLocation>,
}

impl HardwareNode {
    /// Local name without the unit address
    pub fn base_name(&self) -> &str {
        self.name.split('@').next().unwrap_or(&self.name)
    }

    /// Unit address parsed as hex, if any
    pub fn unit_address(&self) -> Option<u64> {
        let (_, unit) = self.name.split_once('@')?;
        let first = unit.split(',').next()?;
        let digits = first.trim_start_matches("0x");
        u64::from_str_radix(digits, 16).ok()
    }

    /// Display name: `&label` for labelled nodes, the local name otherwise
    pub fn unique_name(&self) -> String {
        match self.labels.first() {
            Some(label) => format!("&{}", label),
            None => self.name.clone(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Declared `#*-cells` count, e.g. `#address-cells`.
    ///
    /// `Some(Err(value))` when the count exceeds [`MAX_CELLS`].
    pub fn cell_count(&self, name: &str) -> Option<Result<usize, u64>> {
        let value = self.property(name)?.cell()?;
        match usize::try_from(value) {
            Ok(count) if count <= MAX_CELLS => Some(Ok(count)),
            _ => {
                debug!(node = %self.path, property = name, value, "Cell count out of range");
                Some(Err(value))
            }
        }
    }

    /// Binding kind membership, falling back to the compatible list when
    /// the node has no binding
    pub fn is(&self, kind: &str) -> bool {
        if let Some(binding) = &self.binding {
            if binding.is(kind) {
                return true;
            }
        }
        self.property("compatible")
            .map(|p| p.strings().contains(&kind))
            .unwrap_or(false)
    }

    pub fn bus(&self) -> Option<&str> {
        self.binding.as_ref().and_then(|b| b.bus.as_deref())
    }

    pub fn cell_names(&self, domain: &str) -> &[String] {
        self.binding
            .as_ref()
            .map(|b| b.cell_names(domain))
            .unwrap_or(&[])
    }

    pub fn description(&self) -> Option<&str> {
        self.binding.as_ref().and_then(|b| b.description.as_deref())
    }
}

/// The linked devicetree snapshot
#[derive(Debug)]
pub struct HardwareGraph {
    nodes: Vec<HardwareNode>,
    paths: HashMap<String, NodeId>,
    labels: HashMap<String, NodeId>,
    references: ReferenceIndex,
    /// File reported for nodes without their own source location
    default_file: Option<PathBuf>,
}

impl HardwareGraph {
    /// Assemble a graph from linked nodes. The first node is the root.
    pub(crate) fn from_linked(
        nodes: Vec<HardwareNode>,
        labels: HashMap<String, NodeId>,
        default_file: Option<PathBuf>,
    ) -> Self {
        let paths = nodes.iter().map(|n| (n.path.clone(), n.id)).collect();
        let references = ReferenceIndex::build(&nodes);
        Self {
            nodes,
            paths,
            labels,
            references,
            default_file,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&HardwareNode, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownNode(id.0))
    }

    pub fn root(&self) -> Option<&HardwareNode> {
        self.nodes.first()
    }

    /// All nodes in depth-first pre-order
    pub fn nodes(&self) -> impl Iterator<Item = &HardwareNode> {
        self.nodes.iter()
    }

    pub fn find(&self, path: &str) -> Option<&HardwareNode> {
        self.paths.get(path).and_then(|id| self.nodes.get(id.0))
    }

    pub fn by_label(&self, label: &str) -> Option<&HardwareNode> {
        self.labels.get(label).and_then(|id| self.nodes.get(id.0))
    }

    pub fn parent(&self, node: &HardwareNode) -> Option<&HardwareNode> {
        node.parent.and_then(|id| self.nodes.get(id.0))
    }

    pub fn children<'a>(&'a self, node: &'a HardwareNode) -> impl Iterator<Item = &'a HardwareNode> {
        node.children.iter().filter_map(|id| self.nodes.get(id.0))
    }

    /// The node itself followed by its ancestors up to the root
    pub fn ancestors<'a>(&'a self, node: &'a HardwareNode) -> impl Iterator<Item = &'a HardwareNode> {
        std::iter::successors(Some(node), move |n| self.parent(n))
    }

    /// Every phandle entry in the graph that targets `target`
    pub fn references_to(&self, target: NodeId) -> &[Reference] {
        self.references.to(target)
    }

    /// Decode the node's `reg` property using the parent's cell counts
    pub fn registers(&self, node: &HardwareNode) -> Vec<RegisterEntry> {
        let Some(reg) = node.property("reg") else {
            return Vec::new();
        };
        let parent = self.parent(node);
        let cell_count = |name: &str, default: usize| match parent.and_then(|p| p.cell_count(name)) {
            None => Some(default),
            Some(Ok(count)) => Some(count),
            Some(Err(_)) => None,
        };
        // Entries are unknown when the parent declares absurd cell counts
        let (Some(address_cells), Some(size_cells)) =
            (cell_count("#address-cells", 2), cell_count("#size-cells", 1))
        else {
            return Vec::new();
        };
        decode_registers(&reg.cells(), address_cells, size_cells)
    }

    /// Source location of a node, or of one of its properties when named
    pub fn source_of(&self, path: &str, property: Option<&str>) -> Option<SourceLocation> {
        let node = self.find(path)?;
        let location = property
            .and_then(|name| node.property(name))
            .and_then(|p| p.source.clone())
            .or_else(|| node.source.clone());
        location.or_else(|| {
            self.default_file.clone().map(|file| SourceLocation { file, line: None })
        })
    }
}

fn combine_cells(cells: &[u64]) -> u64 {
    // Only the low 64 bits are kept for wider addresses
    cells
        .iter()
        .rev()
        .take(2)
        .rev()
        .fold(0u64, |acc, c| (acc << 32) | (c & 0xffff_ffff))
}

/// Split raw `reg` cells into entries. A trailing partial group keeps what it
/// has and leaves the rest unknown. Cell counts above [`MAX_CELLS`] decode to
/// nothing.
pub fn decode_registers(cells: &[u64], address_cells: usize, size_cells: usize) -> Vec<RegisterEntry> {
    if address_cells > MAX_CELLS || size_cells > MAX_CELLS {
        return Vec::new();
    }
    let stride = match address_cells.checked_add(size_cells) {
        Some(0) | None => return Vec::new(),
        Some(stride) => stride,
    };

    cells
        .chunks(stride)
        .map(|chunk| {
            let address = (address_cells > 0 && chunk.len() >= address_cells)
                .then(|| combine_cells(&chunk[..address_cells]));
            let size = (size_cells > 0 && chunk.len() == stride)
                .then(|| combine_cells(&chunk[address_cells..]));
            RegisterEntry { address, size }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> HardwareNode {
        HardwareNode {
            id: NodeId(0),
            path: format!("/{}", name),
            name: name.to_string(),
            labels: Vec::new(),
            parent: None,
            children: Vec::new(),
            properties: Vec::new(),
            binding: None,
            source: None,
        }
    }

    #[test]
    fn test_unit_address() {
        assert_eq!(node("flash@4001e000").unit_address(), Some(0x4001e000));
        assert_eq!(node("partition@0").unit_address(), Some(0));
        assert_eq!(node("cpus").unit_address(), None);
        assert_eq!(node("pci@1,0").unit_address(), Some(1));
        assert_eq!(node("uart@40002000").base_name(), "uart");
    }

    #[test]
    fn test_unique_name_prefers_label() {
        let mut n = node("i2c@40003000");
        assert_eq!(n.unique_name(), "i2c@40003000");
        n.labels.push("i2c0".to_string());
        assert_eq!(n.unique_name(), "&i2c0");
    }

    #[test]
    fn test_decode_registers() {
        let regs = decode_registers(&[0x0, 0x10000, 0x20000, 0x8000], 1, 1);
        assert_eq!(regs.len(), 2);
        assert_eq!(regs[1].span(), Some((0x20000, 0x8000)));

        let wide = decode_registers(&[0x1, 0x0, 0x0, 0x1000], 2, 2);
        assert_eq!(wide[0].address, Some(0x1_0000_0000));
        assert_eq!(wide[0].size, Some(0x1000));
    }

    #[test]
    fn test_partial_register_entry_is_unknown_not_zero() {
        let regs = decode_registers(&[0x1000, 0x100, 0x2000], 1, 1);
        assert_eq!(regs.len(), 2);
        assert_eq!(regs[1].address, Some(0x2000));
        assert_eq!(regs[1].size, None);
        assert_eq!(regs[1].span(), None);

        let no_size = decode_registers(&[0x50], 1, 0);
        assert_eq!(no_size[0].address, Some(0x50));
        assert_eq!(no_size[0].size, None);
    }

    #[test]
    fn test_absurd_cell_counts_decode_nothing() {
        assert!(decode_registers(&[0x0, 0x1000], usize::MAX, 1).is_empty());
        assert!(decode_registers(&[0x0, 0x1000], 1, MAX_CELLS + 1).is_empty());
        assert!(decode_registers(&[0x0, 0x1000], 0, 0).is_empty());
    }

    #[test]
    fn test_registers_with_absurd_parent_cells() {
        let graph = crate::snapshot::GraphSnapshot::from_json(
            r##"{ "root": { "name": "/",
                "properties": [{ "name": "#address-cells", "value": [18446744073709551615] }],
                "children": [{ "name": "flash@0", "properties": [{ "name": "reg", "value": [0, 4096] }] }]
            } }"##,
        )
        .unwrap()
        .link()
        .unwrap();

        let flash = graph.find("/flash@0").unwrap();
        assert!(graph.registers(flash).is_empty());
        let root = graph.root().unwrap();
        assert_eq!(root.cell_count("#address-cells"), Some(Err(u64::MAX)));
        assert_eq!(root.cell_count("#size-cells"), None);
    }
}
