//! Graph snapshot loading and linking
//!
//! A snapshot is the JSON form of an already-parsed devicetree, as exported
//! by the upstream parser. Loading it assigns node ids, builds paths, attaches
//! bindings and resolves phandle references into a [`HardwareGraph`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::binding::Binding;
use crate::graph::{GraphError, HardwareGraph, HardwareNode, NodeId, SourceLocation};
use crate::property::{PHandleRef, Property, Value};

/// Reference value, e.g. `{"ref": "&gpio0"}` or `{"ref": "/soc/gpio@0"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefSpec {
    #[serde(rename = "ref")]
    pub target: String,
}

/// One value of a snapshot property
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Cell(u64),
    Text(String),
    Ref(RefSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    #[serde(default)]
    pub value: Vec<ValueSpec>,
    #[serde(default)]
    pub source: Option<SourceLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Explicit binding name; otherwise matched through `compatible`
    #[serde(default)]
    pub binding: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
    #[serde(default)]
    pub source: Option<SourceLocation>,
}

/// Root snapshot document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Default source file for nodes without a location
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Bindings keyed by compatible string
    #[serde(default)]
    pub bindings: BTreeMap<String, Binding>,
    pub root: NodeSpec,
}

impl GraphSnapshot {
    /// Parse a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a snapshot from a file
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&content)?;
        info!(path = %path.display(), "Loaded graph snapshot");
        Ok(snapshot)
    }

    /// Link the snapshot into a graph
    pub fn link(self) -> Result<HardwareGraph, GraphError> {
        let bindings: HashMap<String, Arc<Binding>> = self
            .bindings
            .into_iter()
            .map(|(key, mut binding)| {
                if binding.name.is_empty() {
                    binding.name = key.clone();
                }
                (key, Arc::new(binding))
            })
            .collect();

        let mut linker = Linker {
            bindings,
            nodes: Vec::new(),
            pending: Vec::new(),
            paths: HashMap::new(),
            labels: HashMap::new(),
        };
        linker.add(self.root, None)?;
        linker.resolve();

        info!(
            nodes = linker.nodes.len(),
            labels = linker.labels.len(),
            "Linked hardware graph"
        );
        Ok(HardwareGraph::from_linked(linker.nodes, linker.labels, self.file))
    }
}

/// Load and link a snapshot file in one step
pub fn load_graph(path: &Path) -> Result<HardwareGraph, GraphError> {
    GraphSnapshot::from_file(path)?.link()
}

struct Linker {
    bindings: HashMap<String, Arc<Binding>>,
    nodes: Vec<HardwareNode>,
    /// Unresolved property values, per node, in declaration order
    pending: Vec<Vec<(PropertySpec, Vec<ValueSpec>)>>,
    paths: HashMap<String, NodeId>,
    labels: HashMap<String, NodeId>,
}

impl Linker {
    fn add(&mut self, spec: NodeSpec, parent: Option<NodeId>) -> Result<NodeId, GraphError> {
        let id = NodeId(self.nodes.len());
        let path = match parent {
            None => "/".to_string(),
            Some(pid) => {
                let parent_path = &self.nodes[pid.0].path;
                if parent_path == "/" {
                    format!("/{}", spec.name)
                } else {
                    format!("{}/{}", parent_path, spec.name)
                }
            }
        };

        if self.paths.insert(path.clone(), id).is_some() {
            return Err(GraphError::DuplicatePath(path));
        }

        for label in &spec.labels {
            if self.labels.contains_key(label) {
                warn!(label = %label, path = %path, "Duplicate label, keeping first");
                continue;
            }
            self.labels.insert(label.clone(), id);
        }

        let binding = self.binding_for(&spec);
        let name = if parent.is_none() { "/".to_string() } else { spec.name };

        self.nodes.push(HardwareNode {
            id,
            path,
            name,
            labels: spec.labels,
            parent,
            children: Vec::new(),
            properties: Vec::new(),
            binding,
            source: spec.source,
        });
        self.pending.push(
            spec.properties
                .into_iter()
                .map(|mut p| {
                    let values = std::mem::take(&mut p.value);
                    (p, values)
                })
                .collect(),
        );

        for child in spec.children {
            let child_id = self.add(child, Some(id))?;
            self.nodes[id.0].children.push(child_id);
        }

        Ok(id)
    }

    fn binding_for(&self, spec: &NodeSpec) -> Option<Arc<Binding>> {
        if let Some(name) = &spec.binding {
            return self.bindings.get(name).cloned();
        }
        spec.properties
            .iter()
            .filter(|p| p.name == "compatible")
            .flat_map(|p| p.value.iter())
            .find_map(|v| match v {
                ValueSpec::Text(compat) => self.bindings.get(compat).cloned(),
                _ => None,
            })
    }

    fn lookup(&self, reference: &str) -> Option<NodeId> {
        if let Some(label) = reference.strip_prefix('&') {
            let label = label.trim_start_matches('{').trim_end_matches('}');
            if label.starts_with('/') {
                return self.paths.get(label).copied();
            }
            return self.labels.get(label).copied();
        }
        self.paths.get(reference).copied()
    }

    /// Convert pending values now that every node has an id
    fn resolve(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for (index, props) in pending.into_iter().enumerate() {
            let properties = props
                .into_iter()
                .map(|(spec, values)| {
                    let values = values
                        .into_iter()
                        .map(|v| match v {
                            ValueSpec::Cell(c) => Value::Cell(c),
                            ValueSpec::Text(s) => Value::String(s),
                            ValueSpec::Ref(r) => {
                                let target = self.lookup(&r.target);
                                if target.is_none() {
                                    debug!(
                                        node = %self.nodes[index].path,
                                        property = %spec.name,
                                        reference = %r.target,
                                        "Unresolved phandle reference"
                                    );
                                }
                                Value::PHandle(PHandleRef {
                                    reference: r.target,
                                    target,
                                })
                            }
                        })
                        .collect();
                    Property {
                        name: spec.name,
                        values,
                        source: spec.source,
                    }
                })
                .collect();
            self.nodes[index].properties = properties;
        }
    }
}
