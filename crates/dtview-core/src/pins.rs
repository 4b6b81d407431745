//! GPIO pin assignment derived from the reference index

use tracing::debug;

use crate::graph::{HardwareGraph, HardwareNode, NodeId};

/// Default pin count for controllers without `ngpios`
pub const DEFAULT_NGPIOS: u64 = 32;

/// Largest `ngpios` taken at face value
pub const MAX_NGPIOS: u64 = 1024;

/// A consumer of one GPIO pin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinAssignment {
    /// Node using the pin
    pub consumer: NodeId,
    /// Property through which the pin is used (`cs-gpios`, `pinctrl-0`, ...)
    pub property: String,
    /// Pin-mux function name, e.g. `usart1_tx_pa9`
    pub pinmux: Option<String>,
}

fn is_gpio_property(name: &str) -> bool {
    name == "gpios" || name.ends_with("-gpios")
}

impl HardwareGraph {
    /// Pin assignments of a GPIO controller, indexed by pin number.
    ///
    /// Empty for nodes that aren't GPIO controllers. When two consumers claim
    /// the same pin the first one in node order is kept.
    pub fn pins(&self, controller: &HardwareNode) -> Vec<Option<PinAssignment>> {
        if !controller.has_property("gpio-controller") {
            return Vec::new();
        }

        let count = match controller.property("ngpios").and_then(|p| p.cell()) {
            Some(count) if count > MAX_NGPIOS => {
                debug!(node = %controller.path, ngpios = count, "ngpios out of range, using default");
                DEFAULT_NGPIOS
            }
            Some(count) => count,
            None => DEFAULT_NGPIOS,
        };
        let mut pins: Vec<Option<PinAssignment>> = vec![None; count as usize];

        let mut assign = |pin: Option<&u64>, assignment: PinAssignment| {
            let Some(&pin) = pin else {
                return;
            };
            if let Some(slot) = pins.get_mut(pin as usize) {
                if slot.is_none() {
                    *slot = Some(assignment);
                }
            }
        };

        for reference in self.references_to(controller.id) {
            if is_gpio_property(&reference.property) {
                assign(
                    reference.cells.first(),
                    PinAssignment {
                        consumer: reference.source,
                        property: reference.property.clone(),
                        pinmux: None,
                    },
                );
            } else if reference.property == "pinmux" {
                let Ok(config) = self.node(reference.source) else {
                    continue;
                };
                for (consumer, property) in self.pinctrl_users(config) {
                    assign(
                        reference.cells.first(),
                        PinAssignment {
                            consumer,
                            property,
                            pinmux: Some(config.base_name().to_string()),
                        },
                    );
                }
            }
        }

        pins
    }

    /// Nodes referencing a pin configuration, or its group, through a
    /// `pinctrl-N` property
    fn pinctrl_users(&self, config: &HardwareNode) -> Vec<(NodeId, String)> {
        let mut targets = vec![config.id];
        if let Some(group) = config.parent {
            targets.push(group);
        }

        targets
            .into_iter()
            .flat_map(|target| self.references_to(target))
            .filter(|r| r.property.starts_with("pinctrl-"))
            .map(|r| (r.source, r.property.clone()))
            .collect()
    }
}
