//! dtview Core - Hardware graph model, snapshot linking, and board database
//!
//! This crate provides the foundational types for dtview:
//! - Hardware graph of devicetree nodes, properties and register ranges
//! - Snapshot loading and phandle linking
//! - Reverse phandle index and GPIO pin derivation
//! - Board metadata database for board identity lookups

pub mod binding;
pub mod board;
pub mod graph;
pub mod pins;
pub mod property;
pub mod references;
pub mod snapshot;

pub use binding::Binding;
pub use board::{BoardDatabase, BoardError, BoardIndex, BoardInfo, BoardLookup};
pub use graph::{
    decode_registers, GraphError, HardwareGraph, HardwareNode, NodeId, RegisterEntry,
    SourceLocation, MAX_CELLS,
};
pub use pins::{PinAssignment, DEFAULT_NGPIOS, MAX_NGPIOS};
pub use property::{PHandleEntry, PHandleRef, Property, Value};
pub use references::{Reference, ReferenceIndex};
pub use snapshot::{load_graph, GraphSnapshot};
