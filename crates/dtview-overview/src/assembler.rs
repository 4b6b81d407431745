//! Overview assembly - runs every domain synthesizer in a fixed order

use tracing::{debug, warn};

use crate::item::OverviewItem;
use crate::synth::{
    BoardSynthesizer, BusSynthesizer, ChannelKind, ClockSynthesizer, FlashSynthesizer,
    GpioSynthesizer, InterruptSynthesizer, IoChannelSynthesizer, SynthInput, Synthesizer,
};

/// Runs the synthesizers and collects their subtrees under one root
pub struct Assembler {
    synthesizers: Vec<Box<dyn Synthesizer>>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    /// Board, GPIO, Flash, Interrupts, Buses, ADCs, DACs, Clocks
    pub fn new() -> Self {
        Self::with_synthesizers(vec![
            Box::new(BoardSynthesizer),
            Box::new(GpioSynthesizer),
            Box::new(FlashSynthesizer),
            Box::new(InterruptSynthesizer),
            Box::new(BusSynthesizer),
            Box::new(IoChannelSynthesizer::new(ChannelKind::Adc)),
            Box::new(IoChannelSynthesizer::new(ChannelKind::Dac)),
            Box::new(ClockSynthesizer),
        ])
    }

    pub fn with_synthesizers(synthesizers: Vec<Box<dyn Synthesizer>>) -> Self {
        Self { synthesizers }
    }

    pub fn domains(&self) -> Vec<&'static str> {
        self.synthesizers.iter().map(|s| s.domain()).collect()
    }

    /// Build the `Overview` root, `None` when no domain produced anything
    pub fn assemble(&self, input: &SynthInput<'_>) -> Option<OverviewItem> {
        let mut root = OverviewItem::new("Overview").with_icon("overview");

        for synth in &self.synthesizers {
            match synth.synthesize(input) {
                Ok(Some(item)) => root.add_child(item),
                Ok(None) => debug!(domain = synth.domain(), "Nothing to show"),
                Err(e) => warn!(domain = synth.domain(), error = %e, "Synthesizer failed"),
            }
        }

        root.has_children().then_some(root)
    }
}
