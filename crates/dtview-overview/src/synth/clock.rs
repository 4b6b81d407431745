//! Clock fan-out overview

use dtview_core::{HardwareGraph, HardwareNode};

use crate::error::OverviewError;
use crate::item::{NavTarget, OverviewItem};
use crate::shaping::{capitalize, flattened};
use crate::synth::{SynthInput, Synthesizer};

fn is_clock_controller(node: &HardwareNode) -> bool {
    node.is("clock-controller") || node.has_property("#clock-cells")
}

/// Consumer items for every `clocks` entry targeting `controller`
fn consumers(graph: &HardwareGraph, controller: &HardwareNode) -> Result<Vec<OverviewItem>, OverviewError> {
    let cells = controller.cell_names("clock");
    let mut items = Vec::new();

    for reference in graph
        .references_to(controller.id)
        .iter()
        .filter(|r| r.property == "clocks" && r.source != controller.id)
    {
        let consumer = graph.node(reference.source)?;
        let mut item = OverviewItem::new(consumer.unique_name())
            .with_target(NavTarget::property(consumer.path.as_str(), "clocks"));
        if let Some(name) = consumer
            .property("clock-names")
            .and_then(|p| p.strings().get(reference.entry).map(|s| s.to_string()))
        {
            item = item.with_description(name);
        }
        if let Some(tooltip) = consumer.description() {
            item = item.with_tooltip(tooltip);
        }

        for (name, value) in cells.iter().zip(&reference.cells) {
            item.add_child(OverviewItem::field(format!("{}:", capitalize(name)), value.to_string()));
        }
        items.push(item);
    }

    Ok(items)
}

/// Clock consumers per clock controller
#[derive(Debug, Default)]
pub struct ClockSynthesizer;

impl Synthesizer for ClockSynthesizer {
    fn domain(&self) -> &'static str {
        "clocks"
    }

    fn synthesize(&self, input: &SynthInput<'_>) -> Result<Option<OverviewItem>, OverviewError> {
        let graph = input.graph;
        let mut details = OverviewItem::new("Clocks").with_icon("clock");

        for controller in graph.nodes().filter(|n| is_clock_controller(n)) {
            let mut item = OverviewItem::new(controller.unique_name())
                .with_target(NavTarget::node(controller.path.as_str()));
            if let Some(description) = controller.description() {
                item = item.with_tooltip(description);
            }

            let users = consumers(graph, controller)?;
            if users.is_empty() {
                item.add_child(OverviewItem::new("No users"));
            }
            for user in users {
                item.add_child(user);
            }
            details.add_child(item);
        }

        Ok(flattened(details))
    }
}
