//! Per-domain synthesizers
//!
//! Each synthesizer walks the hardware graph independently and produces at
//! most one overview subtree for its domain.

pub mod board;
pub mod bus;
pub mod clock;
pub mod flash;
pub mod gpio;
pub mod interrupt;
pub mod io_channel;

use dtview_core::{BoardInfo, HardwareGraph};

use crate::error::OverviewError;
use crate::item::OverviewItem;

pub use board::BoardSynthesizer;
pub use bus::BusSynthesizer;
pub use clock::ClockSynthesizer;
pub use flash::{layout_partitions, FlashSynthesizer, LayoutEntry, Partition};
pub use gpio::GpioSynthesizer;
pub use interrupt::{interrupt_parent_of, InterruptSynthesizer};
pub use io_channel::{ChannelKind, IoChannelSynthesizer};

/// Everything a synthesizer may read
#[derive(Debug, Clone, Copy)]
pub struct SynthInput<'a> {
    pub graph: &'a HardwareGraph,
    pub board: Option<&'a BoardInfo>,
}

impl<'a> SynthInput<'a> {
    pub fn new(graph: &'a HardwareGraph) -> Self {
        Self { graph, board: None }
    }

    pub fn with_board(mut self, board: Option<&'a BoardInfo>) -> Self {
        self.board = board;
        self
    }
}

/// A domain synthesizer
pub trait Synthesizer: Send + Sync {
    /// Domain name used in logs
    fn domain(&self) -> &'static str;

    /// Build the domain subtree, `None` when the domain has nothing to show
    fn synthesize(&self, input: &SynthInput<'_>) -> Result<Option<OverviewItem>, OverviewError>;
}
