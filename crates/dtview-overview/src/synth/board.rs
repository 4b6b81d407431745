//! Board identity overview

use crate::error::OverviewError;
use crate::item::{NavTarget, OverviewItem};
use crate::shaping::non_empty;
use crate::synth::{SynthInput, Synthesizer};

/// Board name, architecture, features and toolchains
#[derive(Debug, Default)]
pub struct BoardSynthesizer;

impl Synthesizer for BoardSynthesizer {
    fn domain(&self) -> &'static str {
        "board"
    }

    fn synthesize(&self, input: &SynthInput<'_>) -> Result<Option<OverviewItem>, OverviewError> {
        let Some(info) = input.board.filter(|info| !info.is_empty()) else {
            return Ok(None);
        };

        let mut board = OverviewItem::new("Board").with_icon("circuit-board");

        let root = input.graph.root();
        let model = root
            .and_then(|r| r.property("model"))
            .and_then(|p| p.string());
        match (model, info.name.as_deref()) {
            (Some(model), _) => board.add_child(
                OverviewItem::field("Name:", model).with_target(NavTarget::property("/", "model")),
            ),
            (None, Some(name)) => board.add_child(OverviewItem::field("Name:", name)),
            (None, None) => {}
        }

        if let Some(arch) = &info.arch {
            board.add_child(OverviewItem::field("Architecture:", arch.as_str()));
        }

        if !info.supported.is_empty() {
            let mut supported = OverviewItem::new("Supported features");
            for feature in &info.supported {
                supported.add_child(OverviewItem::new(feature.as_str()));
            }
            board.add_child(supported);
        }

        if !info.toolchain.is_empty() {
            let mut toolchains = OverviewItem::new("Supported toolchains");
            for toolchain in &info.toolchain {
                toolchains.add_child(OverviewItem::new(toolchain.as_str()));
            }
            board.add_child(toolchains);
        }

        Ok(non_empty(board))
    }
}
