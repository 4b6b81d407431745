//! Flash and memory-map overview
//!
//! Partition tables are laid out in start-address order. Gaps between
//! partitions and the unused tail of the device become "Free space" entries;
//! a partition starting before the previous one ended is annotated as an
//! overlap. The running offset always follows the declared end of the last
//! partition, so a partition nested inside an earlier one moves the offset
//! backwards rather than being merged into a union.

use dtview_core::{HardwareGraph, HardwareNode};
use tracing::debug;

use crate::error::OverviewError;
use crate::item::{NavTarget, OverviewItem};
use crate::shaping::{hex, non_empty, size_string};
use crate::synth::{SynthInput, Synthesizer};

/// Start and size of one declared partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub start: u64,
    pub size: u64,
}

/// One row of a laid-out partition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEntry {
    /// Unused range before a partition or at the end of the device
    Free { start: u64, size: u64 },
    /// A declared partition; `index` is its position in the input
    Partition {
        index: usize,
        start: u64,
        size: u64,
        /// Bytes overlapping the previous partition
        overlap: Option<u64>,
    },
}

/// Lay out partitions in ascending start order, ties kept in input order
pub fn layout_partitions(capacity: Option<u64>, partitions: &[Partition]) -> Vec<LayoutEntry> {
    let mut order: Vec<usize> = (0..partitions.len()).collect();
    order.sort_by_key(|&i| partitions[i].start);

    let mut layout = Vec::with_capacity(partitions.len() * 2 + 1);
    let mut offset: u64 = 0;

    for index in order {
        let Partition { start, size } = partitions[index];
        if start > offset {
            layout.push(LayoutEntry::Free {
                start: offset,
                size: start - offset,
            });
        }
        let overlap = (start < offset).then(|| offset - start);
        layout.push(LayoutEntry::Partition {
            index,
            start,
            size,
            overlap,
        });
        offset = start.saturating_add(size);
    }

    if let Some(capacity) = capacity {
        if offset < capacity {
            layout.push(LayoutEntry::Free {
                start: offset,
                size: capacity - offset,
            });
        }
    }

    layout
}

fn start_and_size(start: u64, size: u64) -> [OverviewItem; 2] {
    [
        OverviewItem::field("Start", hex(start)),
        OverviewItem::field("Size", size_string(size)).with_tooltip(hex(size)),
    ]
}

fn free_space(start: u64, size: u64) -> OverviewItem {
    OverviewItem::field(format!("Free space @ {}", hex(start)), size_string(size))
}

fn partition_item(node: &HardwareNode, start: u64, size: u64, overlap: Option<u64>) -> OverviewItem {
    let name = node
        .property("label")
        .and_then(|p| p.string())
        .map(|s| s.to_string())
        .unwrap_or_else(|| node.unique_name());

    let mut description = size_string(size);
    if let Some(overlap) = overlap {
        description.push_str(&format!(" - {} overlap!", size_string(overlap)));
    }

    let last = start.saturating_add(size.saturating_sub(1));
    let mut item = OverviewItem::new(name)
        .with_description(description)
        .with_tooltip(format!("{} - {}", hex(start), hex(last)))
        .with_target(NavTarget::node(node.path.as_str()));
    for child in start_and_size(start, size) {
        item.add_child(child);
    }
    item
}

/// Group item for one fixed-partitions node, described by the device capacity
fn partition_table(
    graph: &HardwareGraph,
    table: &HardwareNode,
) -> Result<Option<OverviewItem>, OverviewError> {
    let Some(flash) = graph.parent(table) else {
        return Ok(None);
    };

    let mut group = OverviewItem::new(flash.unique_name()).with_target(NavTarget::node(flash.path.as_str()));
    let capacity = graph.registers(flash).first().and_then(|r| r.size);
    if let Some(capacity) = capacity {
        group.description = Some(size_string(capacity));
    }

    let mut nodes = Vec::new();
    let mut partitions = Vec::new();
    for child in graph.children(table) {
        let regs = graph.registers(child);
        if let [reg] = regs.as_slice() {
            if let Some((start, size)) = reg.span() {
                nodes.push(child);
                partitions.push(Partition { start, size });
            }
        }
    }

    for entry in layout_partitions(capacity, &partitions) {
        match entry {
            LayoutEntry::Free { start, size } => group.add_child(free_space(start, size)),
            LayoutEntry::Partition {
                index,
                start,
                size,
                overlap,
            } => group.add_child(partition_item(nodes[index], start, size, overlap)),
        }
    }

    Ok(Some(group))
}

/// Raw flash devices without a partition table
fn raw_flash(graph: &HardwareGraph, node: &HardwareNode) -> OverviewItem {
    let mut device = OverviewItem::new(node.unique_name()).with_target(NavTarget::node(node.path.as_str()));

    let areas: Vec<(u64, u64)> = graph.registers(node).iter().filter_map(|r| r.span()).collect();
    match areas.as_slice() {
        [] => {}
        [(start, size)] => {
            device.description = Some(size_string(*size));
            for child in start_and_size(*start, *size) {
                device.add_child(child);
            }
        }
        _ => {
            for (i, (start, size)) in areas.iter().enumerate() {
                let mut area = OverviewItem::new(format!("Area {}", i + 1))
                    .with_description(size_string(*size));
                for child in start_and_size(*start, *size) {
                    area.add_child(child);
                }
                device.add_child(area);
            }
        }
    }

    device
}

/// Move a lone device group's contents into the domain item
fn absorb(details: &mut OverviewItem, mut group: OverviewItem) {
    details.description = group.description.take();
    details.target = group.target.take();
    for child in group.take_children() {
        details.add_child(child);
    }
}

/// Partition tables, falling back to raw flash devices
#[derive(Debug, Default)]
pub struct FlashSynthesizer;

impl Synthesizer for FlashSynthesizer {
    fn domain(&self) -> &'static str {
        "flash"
    }

    fn synthesize(&self, input: &SynthInput<'_>) -> Result<Option<OverviewItem>, OverviewError> {
        let graph = input.graph;
        let mut details = OverviewItem::new("Flash").with_icon("flash");

        let tables: Vec<&HardwareNode> = graph
            .nodes()
            .filter(|n| n.parent.is_some() && n.is("fixed-partitions"))
            .collect();
        for table in &tables {
            let Some(group) = partition_table(graph, table)? else {
                continue;
            };
            if tables.len() > 1 {
                if group.has_children() {
                    details.add_child(group);
                } else {
                    debug!(table = %table.path, "Empty partition table");
                }
            } else {
                absorb(&mut details, group);
            }
        }

        if !details.has_children() {
            let devices: Vec<&HardwareNode> = graph.nodes().filter(|n| n.is("soc-nv-flash")).collect();
            for node in &devices {
                let device = raw_flash(graph, node);
                if devices.len() > 1 {
                    details.add_child(device);
                } else {
                    absorb(&mut details, device);
                }
            }
        }

        Ok(non_empty(details))
    }
}
