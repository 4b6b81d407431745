//! Binding descriptors - the semantic type of a node

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic descriptor attached to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Binding name, usually the matching compatible string
    #[serde(default)]
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Bus kind this node provides (e.g. "i2c", "spi")
    #[serde(default)]
    pub bus: Option<String>,
    /// Base bindings this one includes (e.g. "adc-controller")
    #[serde(default)]
    pub kinds: Vec<String>,
    /// Named-cell layouts keyed by cell domain ("interrupt", "clock", ...)
    #[serde(default)]
    pub cells: BTreeMap<String, Vec<String>>,
}

impl Binding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check membership of a binding kind
    pub fn is(&self, kind: &str) -> bool {
        self.name == kind || self.kinds.iter().any(|k| k == kind)
    }

    /// Cell names for a cell domain, empty when the binding doesn't define it
    pub fn cell_names(&self, domain: &str) -> &[String] {
        self.cells.get(domain).map(|c| c.as_slice()).unwrap_or(&[])
    }
}
