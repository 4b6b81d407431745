//! Bus topology overview

use dtview_core::{HardwareGraph, HardwareNode, Property};

use crate::error::OverviewError;
use crate::item::{NavTarget, OverviewItem};
use crate::shaping::{hex, non_empty};
use crate::synth::{SynthInput, Synthesizer};

/// Bus properties worth surfacing on the bus item
fn is_bus_property(name: &str) -> bool {
    name.ends_with("-speed")
        || name.ends_with("-pin")
        || name.starts_with("pinctrl-")
        || name == "clock-frequency"
        || name == "hw-flow-control"
        || name == "dma-channels"
}

fn property_item(node: &HardwareNode, prop: &Property) -> OverviewItem {
    OverviewItem::field(format!("{}:", prop.name.replace('-', " ")), prop.display_value())
        .with_target(NavTarget::property(node.path.as_str(), prop.name.as_str()))
}

/// `Chip select` entry for an SPI device, from the bus's `cs-gpios`
fn chip_select(
    graph: &HardwareGraph,
    bus: &HardwareNode,
    address: u64,
) -> Result<Option<OverviewItem>, OverviewError> {
    let Some(cs_gpios) = bus.property("cs-gpios") else {
        return Ok(None);
    };
    let entries = cs_gpios.phandle_entries();
    let Some(entry) = usize::try_from(address).ok().and_then(|i| entries.get(i)) else {
        return Ok(None);
    };
    let Some(target) = entry.target() else {
        return Ok(None);
    };

    let target = graph.node(target)?;
    let mut description = target.unique_name();
    for cell in &entry.cells {
        description.push_str(&format!(" {}", cell));
    }
    Ok(Some(
        OverviewItem::field("Chip select", description)
            .with_target(NavTarget::property(bus.path.as_str(), "cs-gpios")),
    ))
}

/// One item per bus with its properties and connected devices
#[derive(Debug, Default)]
pub struct BusSynthesizer;

impl Synthesizer for BusSynthesizer {
    fn domain(&self) -> &'static str {
        "buses"
    }

    fn synthesize(&self, input: &SynthInput<'_>) -> Result<Option<OverviewItem>, OverviewError> {
        let graph = input.graph;
        let mut details = OverviewItem::new("Buses").with_icon("bus");

        for node in graph.nodes() {
            let Some(kind) = node.bus() else {
                continue;
            };

            let name = node.unique_name();
            let mut summary = Vec::new();
            if !name.to_lowercase().contains(&kind.to_lowercase()) {
                summary.push(kind.to_string());
            }

            let mut bus = OverviewItem::new(name).with_target(NavTarget::node(node.path.as_str()));
            if let Some(description) = node.description() {
                bus = bus.with_tooltip(description);
            }

            for prop in node
                .properties
                .iter()
                .filter(|p| !p.is_empty() && is_bus_property(&p.name))
            {
                bus.add_child(property_item(node, prop));
            }

            let mut devices = OverviewItem::new("Nodes");
            for child in graph.children(node) {
                let mut device =
                    OverviewItem::new(child.unique_name()).with_target(NavTarget::node(child.path.as_str()));
                if let Some(description) = child.description() {
                    device = device.with_tooltip(description);
                }
                if let Some(address) = child.unit_address() {
                    device = device.with_description(format!("@ {}", hex(address)));
                    if kind == "spi" {
                        device.add_child(chip_select(graph, node, address)?);
                    }
                }
                devices.add_child(device);
            }

            if devices.has_children() {
                summary.push(format!("{} nodes", devices.children().len()));
            } else {
                devices = devices.with_description("Nothing connected");
            }
            bus.add_child(devices);

            if !summary.is_empty() {
                bus = bus.with_description(summary.join(" • "));
            }
            details.add_child(bus);
        }

        Ok(non_empty(details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtview_core::GraphSnapshot;

    fn graph(json: &str) -> HardwareGraph {
        GraphSnapshot::from_json(json).unwrap().link().unwrap()
    }

    const BUSES: &str = r#"{
        "bindings": {
            "nordic,nrf-spim": { "description": "SPI master", "bus": "spi" },
            "nordic,nrf-twim": { "description": "I2C master", "bus": "i2c" },
            "jedec,spi-nor": { "description": "SPI NOR flash" }
        },
        "root": {
            "name": "/",
            "children": [
                { "name": "gpio@50000000", "labels": ["gpio0"], "properties": [{ "name": "gpio-controller" }] },
                {
                    "name": "spi@40023000",
                    "labels": ["spi3"],
                    "properties": [
                        { "name": "compatible", "value": ["nordic,nrf-spim"] },
                        { "name": "clock-frequency", "value": [8000000] },
                        { "name": "pinctrl-names", "value": ["default", "sleep"] },
                        { "name": "hw-flow-control" },
                        { "name": "cs-gpios", "value": [{ "ref": "&gpio0" }, 17, 1, { "ref": "&missing" }, 3, 1] }
                    ],
                    "children": [
                        { "name": "flash@0", "labels": ["mx25r64"],
                          "properties": [{ "name": "compatible", "value": ["jedec,spi-nor"] }] },
                        { "name": "sensor@1" },
                        { "name": "display@4" }
                    ]
                },
                {
                    "name": "bus@40003000",
                    "labels": ["arduino_bus"],
                    "properties": [{ "name": "compatible", "value": ["nordic,nrf-twim"] }]
                }
            ]
        }
    }"#;

    #[test]
    fn test_buses() {
        let graph = graph(BUSES);
        let buses = BusSynthesizer.synthesize(&SynthInput::new(&graph)).unwrap().unwrap();
        assert_eq!(buses.name, "Buses");
        assert_eq!(buses.children().len(), 2);

        let spi = &buses.children()[0];
        assert_eq!(spi.name, "&spi3");
        // Kind already implied by the name
        assert_eq!(spi.description.as_deref(), Some("3 nodes"));
        assert_eq!(spi.tooltip.as_deref(), Some("SPI master"));

        let freq = spi.find("clock frequency:").unwrap();
        assert_eq!(freq.description.as_deref(), Some("8000000"));
        assert_eq!(
            spi.find("pinctrl names:").unwrap().description.as_deref(),
            Some("default, sleep")
        );
        // Boolean properties carry no value
        assert!(spi.find("hw flow control:").is_none());

        let nodes = spi.find("Nodes").unwrap();
        let flash = &nodes.children()[0];
        assert_eq!(flash.name, "&mx25r64");
        assert_eq!(flash.description.as_deref(), Some("@ 0x0"));
        assert_eq!(flash.tooltip.as_deref(), Some("SPI NOR flash"));
        let cs = flash.find("Chip select").unwrap();
        assert_eq!(cs.description.as_deref(), Some("&gpio0 17 1"));
        assert_eq!(cs.target, Some(NavTarget::property("/spi@40023000", "cs-gpios")));

        // Dangling and out-of-range chip selects are skipped
        assert!(nodes.children()[1].children().is_empty());
        assert!(nodes.children()[2].children().is_empty());

        let i2c = &buses.children()[1];
        assert_eq!(i2c.name, "&arduino_bus");
        assert_eq!(i2c.description.as_deref(), Some("i2c"));
        let empty = i2c.find("Nodes").unwrap();
        assert_eq!(empty.description.as_deref(), Some("Nothing connected"));
    }

    #[test]
    fn test_no_buses_omits_domain() {
        let graph = graph(r#"{ "root": { "name": "/", "children": [{ "name": "uart" }] } }"#);
        assert!(BusSynthesizer.synthesize(&SynthInput::new(&graph)).unwrap().is_none());
    }
}
