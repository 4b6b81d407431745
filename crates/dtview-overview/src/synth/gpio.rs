//! GPIO pin usage overview

use dtview_core::{HardwareNode, PinAssignment};

use crate::error::OverviewError;
use crate::item::{NavTarget, OverviewItem};
use crate::shaping::non_empty;
use crate::synth::{SynthInput, Synthesizer};

/// One item per GPIO controller, one child per assigned pin
#[derive(Debug, Default)]
pub struct GpioSynthesizer;

/// Drop a trailing pin suffix such as `_pa9` or `pb12`
fn strip_pin_suffix(name: &str) -> &str {
    let bytes = name.as_bytes();
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1].is_ascii_digit() {
        end -= 1;
    }
    if end == bytes.len() || end < 2 {
        return name;
    }
    // Port letter preceded by `p`
    let port = end - 1;
    if !bytes[port].is_ascii_alphabetic() || !bytes[port - 1].eq_ignore_ascii_case(&b'p') {
        return name;
    }
    let mut start = port - 1;
    if start > 0 && bytes[start - 1] == b'_' {
        start -= 1;
    }
    &name[..start]
}

/// Pin-mux function name without the consumer prefix and pin suffix,
/// e.g. `usart1_tx_pa9` used by `&usart1` becomes `tx`
pub fn pinmux_function(pinmux: &str, consumer: &HardwareNode) -> String {
    let owner = consumer
        .labels
        .first()
        .map(|l| l.as_str())
        .unwrap_or_else(|| consumer.base_name())
        .to_lowercase();
    let prefix = format!("{}_", owner);
    let function = pinmux.strip_prefix(prefix.as_str()).unwrap_or(pinmux);
    strip_pin_suffix(function).to_string()
}

fn pin_item(
    input: &SynthInput<'_>,
    index: usize,
    pin: &PinAssignment,
) -> Result<OverviewItem, OverviewError> {
    let consumer = input.graph.node(pin.consumer)?;
    let function = match &pin.pinmux {
        Some(pinmux) => pinmux_function(pinmux, consumer),
        None => pin.property.clone(),
    };

    Ok(OverviewItem::new(format!("Pin {}", index))
        .with_description(format!("{} • {}", consumer.unique_name(), function))
        .with_target(NavTarget::property(consumer.path.as_str(), pin.property.as_str())))
}

impl Synthesizer for GpioSynthesizer {
    fn domain(&self) -> &'static str {
        "gpio"
    }

    fn synthesize(&self, input: &SynthInput<'_>) -> Result<Option<OverviewItem>, OverviewError> {
        let mut details = OverviewItem::new("GPIO").with_icon("gpio-pin");

        for node in input.graph.nodes() {
            let pins = input.graph.pins(node);
            if pins.is_empty() {
                continue;
            }

            let mut controller =
                OverviewItem::new(node.unique_name()).with_target(NavTarget::node(node.path.as_str()));
            for (index, pin) in pins.iter().enumerate() {
                if let Some(pin) = pin {
                    controller.add_child(pin_item(input, index, pin)?);
                }
            }

            let in_use = controller.children().len();
            let mut description = format!("{} pins", pins.len());
            let tooltip = description.clone();
            if in_use == 0 {
                description.push_str(" • Nothing connected");
            } else if in_use < pins.len() {
                description.push_str(&format!(" • {} in use", in_use));
            }

            details.add_child(controller.with_description(description).with_tooltip(tooltip));
        }

        Ok(non_empty(details))
    }
}
