//! ADC and DAC channel assignment overview

use dtview_core::{HardwareGraph, HardwareNode, Reference};

use crate::error::OverviewError;
use crate::item::{NavTarget, OverviewItem};
use crate::shaping::flattened;
use crate::synth::{SynthInput, Synthesizer};

/// Which side of the analog interface a synthesizer covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Adc,
    Dac,
}

impl ChannelKind {
    pub fn title(&self) -> &'static str {
        match self {
            ChannelKind::Adc => "ADCs",
            ChannelKind::Dac => "DACs",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ChannelKind::Adc => "adc",
            ChannelKind::Dac => "dac",
        }
    }

    /// Binding kind identifying a controller
    pub fn controller_kind(&self) -> &'static str {
        match self {
            ChannelKind::Adc => "adc-controller",
            ChannelKind::Dac => "dac-controller",
        }
    }
}

struct ChannelUse<'a> {
    channel: u64,
    consumer: &'a HardwareNode,
    name: Option<String>,
}

/// Resolve the `io-channels` entries of every consumer of `controller`
fn channel_uses<'a>(
    graph: &'a HardwareGraph,
    controller: &HardwareNode,
) -> Result<Vec<ChannelUse<'a>>, OverviewError> {
    let refs: Vec<&Reference> = graph
        .references_to(controller.id)
        .iter()
        .filter(|r| r.property == "io-channels" && r.source != controller.id)
        .collect();

    let mut uses = Vec::new();
    for (i, reference) in refs.iter().enumerate() {
        let Some(channel) = reference.cells.first() else {
            continue;
        };
        let consumer = graph.node(reference.source)?;

        let named = consumer
            .property("io-channel-names")
            .and_then(|p| p.strings().get(reference.entry).map(|s| s.to_string()));
        let name = match named {
            Some(name) => Some(name),
            None => {
                let siblings = refs.iter().filter(|r| r.source == reference.source).count();
                if siblings > 1 {
                    let ordinal = refs[..i].iter().filter(|r| r.source == reference.source).count();
                    Some(ordinal.to_string())
                } else {
                    None
                }
            }
        };

        uses.push(ChannelUse {
            channel: *channel,
            consumer,
            name,
        });
    }

    uses.sort_by_key(|u| u.channel);
    Ok(uses)
}

fn channel_item(channel: &ChannelUse<'_>) -> OverviewItem {
    let mut description = channel.consumer.unique_name();
    if let Some(name) = &channel.name {
        description.push_str(&format!(" • {}", name));
    }
    let mut item = OverviewItem::new(format!("Channel {}", channel.channel))
        .with_description(description)
        .with_target(NavTarget::property(channel.consumer.path.as_str(), "io-channels"));
    if let Some(tooltip) = channel.consumer.description() {
        item = item.with_tooltip(tooltip);
    }
    item
}

/// Channel usage per ADC or DAC controller
#[derive(Debug)]
pub struct IoChannelSynthesizer {
    kind: ChannelKind,
}

impl IoChannelSynthesizer {
    pub fn new(kind: ChannelKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }
}

impl Synthesizer for IoChannelSynthesizer {
    fn domain(&self) -> &'static str {
        match self.kind {
            ChannelKind::Adc => "adc",
            ChannelKind::Dac => "dac",
        }
    }

    fn synthesize(&self, input: &SynthInput<'_>) -> Result<Option<OverviewItem>, OverviewError> {
        let graph = input.graph;
        let mut details = OverviewItem::new(self.kind.title()).with_icon(self.kind.icon());

        for controller in graph.nodes().filter(|n| n.is(self.kind.controller_kind())) {
            let mut item = OverviewItem::new(controller.unique_name())
                .with_target(NavTarget::node(controller.path.as_str()));
            if let Some(description) = controller.description() {
                item = item.with_tooltip(description);
            }

            let uses = channel_uses(graph, controller)?;
            if uses.is_empty() {
                item.add_child(OverviewItem::new("No channels in use"));
            }
            for channel in &uses {
                item.add_child(channel_item(channel));
            }
            details.add_child(item);
        }

        Ok(flattened(details))
    }
}
