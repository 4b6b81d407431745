//! dtview Overview - Hardware overview synthesis
//!
//! This crate turns a linked hardware graph into a navigable overview:
//! - Per-domain synthesizers (board, GPIO, flash, interrupts, buses, ADC/DAC, clocks)
//! - Presentation shaping and the fixed-order assembler
//! - Frozen overview trees with stable item keys
//! - Snapshot store, per-board contexts and the host tree provider

pub mod assembler;
pub mod context;
pub mod error;
pub mod item;
pub mod provider;
pub mod shaping;
pub mod synth;
pub mod tree;

pub use assembler::Assembler;
pub use context::{GraphSource, OverviewContext, SnapshotStore};
pub use error::OverviewError;
pub use item::{NavTarget, OverviewItem};
pub use provider::{Navigation, OverviewProvider, TreeDataProvider, TreeNode};
pub use synth::{
    interrupt_parent_of, layout_partitions, ChannelKind, LayoutEntry, Partition, SynthInput,
    Synthesizer,
};
pub use tree::{ItemId, ItemKey, ItemPresentation, OverviewTree};
