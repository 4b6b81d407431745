//! Interrupt routing overview

use dtview_core::{HardwareGraph, HardwareNode, NodeId, PHandleRef};
use tracing::debug;

use crate::error::OverviewError;
use crate::item::{NavTarget, OverviewItem};
use crate::shaping::{capitalize, flattened};
use crate::synth::{SynthInput, Synthesizer};

/// The `interrupt-parent` in effect for a node: its own, or the one on the
/// nearest ancestor that declares it
pub fn interrupt_parent_of<'a>(graph: &'a HardwareGraph, node: &'a HardwareNode) -> Option<&'a PHandleRef> {
    graph
        .ancestors(node)
        .find_map(|n| n.property("interrupt-parent"))
        .and_then(|p| p.first_phandle())
}

/// Split the consumer's `interrupts` cells into one specifier per interrupt
fn specifiers(consumer: &HardwareNode, controller: &HardwareNode) -> Vec<Vec<u64>> {
    let cells = consumer
        .property("interrupts")
        .map(|p| p.cells())
        .unwrap_or_default();
    if cells.is_empty() {
        return Vec::new();
    }

    // An out-of-range #interrupt-cells is ignored in favor of the binding
    let width = match controller.cell_count("#interrupt-cells") {
        Some(Ok(width)) => width,
        _ => controller.cell_names("interrupt").len(),
    };
    if width == 0 {
        return vec![cells];
    }
    cells.chunks(width).map(|c| c.to_vec()).collect()
}

struct Consumer<'a> {
    node: &'a HardwareNode,
    specifiers: Vec<Vec<u64>>,
}

impl Consumer<'_> {
    /// First cell of the first specifier; consumers without one sort last
    fn sort_key(&self) -> (bool, u64) {
        match self.specifiers.first().and_then(|s| s.first()) {
            Some(irq) => (false, *irq),
            None => (true, 0),
        }
    }
}

fn interrupt_items(consumer: &Consumer<'_>, cells: &[String]) -> Vec<OverviewItem> {
    let names = consumer
        .node
        .property("interrupt-names")
        .map(|p| p.strings())
        .unwrap_or_default();
    let priority = cells.iter().position(|c| c == "priority");
    let count = consumer.specifiers.len();

    consumer
        .specifiers
        .iter()
        .enumerate()
        .map(|(i, values)| {
            let mut name = consumer.node.unique_name();
            if count > 1 {
                match names.get(i) {
                    Some(irq_name) => name.push_str(&format!(" ({})", irq_name)),
                    None => name.push_str(&format!(" ({})", i)),
                }
            }

            let mut irq = OverviewItem::new(name)
                .with_target(NavTarget::property(consumer.node.path.as_str(), "interrupts"));
            if let Some(description) = consumer.node.description() {
                irq = irq.with_tooltip(description);
            }
            if let Some(value) = priority.and_then(|idx| values.get(idx)) {
                irq = irq.with_description(format!("Priority: {}", value));
            }

            for (idx, cell) in cells.iter().enumerate() {
                let value = values
                    .get(idx)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                irq.add_child(OverviewItem::field(format!("{}:", capitalize(cell)), value));
            }
            irq
        })
        .collect()
}

/// Interrupt consumers grouped by controller, sorted by interrupt number
#[derive(Debug, Default)]
pub struct InterruptSynthesizer;

impl Synthesizer for InterruptSynthesizer {
    fn domain(&self) -> &'static str {
        "interrupts"
    }

    fn synthesize(&self, input: &SynthInput<'_>) -> Result<Option<OverviewItem>, OverviewError> {
        let graph = input.graph;
        let mut details = OverviewItem::new("Interrupts").with_icon("interrupts");

        let controllers: Vec<&HardwareNode> = graph
            .nodes()
            .filter(|n| n.has_property("interrupt-controller"))
            .collect();
        let mut groups: Vec<Vec<Consumer<'_>>> = controllers.iter().map(|_| Vec::new()).collect();

        for node in graph.nodes().filter(|n| n.has_property("interrupts")) {
            let Some(parent) = interrupt_parent_of(graph, node) else {
                debug!(node = %node.path, "No interrupt-parent in scope");
                continue;
            };
            let Some(target) = parent.target else {
                debug!(node = %node.path, reference = %parent.reference, "Dangling interrupt-parent");
                continue;
            };
            let Some(index) = controllers.iter().position(|c| c.id == target) else {
                debug!(node = %node.path, controller = %target, "interrupt-parent is not a controller");
                continue;
            };

            groups[index].push(Consumer {
                node,
                specifiers: specifiers(node, controllers[index]),
            });
        }

        for (controller, mut consumers) in controllers.iter().zip(groups) {
            if consumers.is_empty() {
                continue;
            }
            consumers.sort_by_key(|c| c.sort_key());

            let mut item = controller_item(graph, controller.id)?;
            let cells = controller.cell_names("interrupt");
            for consumer in &consumers {
                for irq in interrupt_items(consumer, cells) {
                    item.add_child(irq);
                }
            }
            details.add_child(item);
        }

        Ok(flattened(details))
    }
}

fn controller_item(graph: &HardwareGraph, id: NodeId) -> Result<OverviewItem, OverviewError> {
    let controller = graph.node(id)?;
    let mut item = OverviewItem::new(controller.unique_name())
        .with_target(NavTarget::node(controller.path.as_str()));
    if let Some(description) = controller.description() {
        item = item.with_tooltip(description);
    }
    Ok(item)
}
