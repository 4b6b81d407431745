//! Host-facing tree data provider
//!
//! A host (editor view, CLI renderer) asks for children and presentations of
//! opaque [`TreeNode`] handles. The top level lists one node per context;
//! everything below comes from that context's frozen overview.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dtview_core::HardwareGraph;
use serde::Serialize;
use tracing::warn;

use crate::context::OverviewContext;
use crate::tree::{ItemId, ItemPresentation, OverviewTree};

/// Handle to one row of the host tree
#[derive(Debug, Clone)]
pub enum TreeNode {
    /// A context root, by position
    Context(usize),
    /// An overview item inside a frozen tree
    Item {
        context: usize,
        graph: Arc<HardwareGraph>,
        tree: Arc<OverviewTree>,
        id: ItemId,
    },
}

/// Where to jump for an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub file: PathBuf,
    /// Node path inside the graph
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

pub trait TreeDataProvider {
    /// Children of `node`, or the top-level rows for `None`
    fn children(&self, node: Option<&TreeNode>) -> Vec<TreeNode>;

    fn presentation(&self, node: &TreeNode) -> ItemPresentation;

    /// Source location for the node's navigation target, if any
    fn navigate(&self, node: &TreeNode) -> Option<Navigation>;
}

/// Provider over a fixed list of contexts
pub struct OverviewProvider {
    contexts: Vec<OverviewContext>,
    timeout: Duration,
}

impl OverviewProvider {
    pub fn new(contexts: Vec<OverviewContext>) -> Self {
        Self {
            contexts,
            timeout: Duration::from_secs(5),
        }
    }

    /// How long to wait for a stable snapshot per request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn contexts(&self) -> &[OverviewContext] {
        &self.contexts
    }

    fn context_children(&self, index: usize) -> Vec<TreeNode> {
        let Some(context) = self.contexts.get(index) else {
            return Vec::new();
        };
        let overview = panic::catch_unwind(AssertUnwindSafe(|| context.overview(self.timeout)));
        let Ok(overview) = overview else {
            warn!(context = %context.name(), "Overview synthesis panicked");
            return Vec::new();
        };
        match overview {
            Ok(Some((graph, tree))) => {
                let tree = Arc::new(tree);
                tree.children(tree.root())
                    .iter()
                    .map(|id| TreeNode::Item {
                        context: index,
                        graph: Arc::clone(&graph),
                        tree: Arc::clone(&tree),
                        id: *id,
                    })
                    .collect()
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(context = %context.name(), error = %e, "Failed to build overview");
                Vec::new()
            }
        }
    }
}

impl TreeDataProvider for OverviewProvider {
    fn children(&self, node: Option<&TreeNode>) -> Vec<TreeNode> {
        match node {
            None => (0..self.contexts.len()).map(TreeNode::Context).collect(),
            Some(TreeNode::Context(index)) => self.context_children(*index),
            Some(TreeNode::Item {
                context,
                graph,
                tree,
                id,
            }) => tree
                .children(*id)
                .iter()
                .map(|child| TreeNode::Item {
                    context: *context,
                    graph: Arc::clone(graph),
                    tree: Arc::clone(tree),
                    id: *child,
                })
                .collect(),
        }
    }

    fn presentation(&self, node: &TreeNode) -> ItemPresentation {
        match node {
            TreeNode::Context(index) => {
                let context = self.contexts.get(*index);
                ItemPresentation {
                    label: context
                        .map(|c| c.name().to_string())
                        .unwrap_or_else(|| format!("context {}", index)),
                    description: context.and_then(|c| c.board_id().map(|b| b.to_string())),
                    tooltip: None,
                    icon: Some("overview".to_string()),
                    collapsible: true,
                    target: None,
                }
            }
            TreeNode::Item { tree, id, .. } => {
                tree.presentation(*id).unwrap_or_else(|| ItemPresentation {
                    label: String::new(),
                    description: None,
                    tooltip: None,
                    icon: None,
                    collapsible: false,
                    target: None,
                })
            }
        }
    }

    fn navigate(&self, node: &TreeNode) -> Option<Navigation> {
        let TreeNode::Item { graph, tree, id, .. } = node else {
            return None;
        };
        let target = tree.target(*id)?;
        let location = graph.source_of(&target.path, target.property.as_deref())?;
        Some(Navigation {
            file: location.file,
            path: target.path.clone(),
            line: location.line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{GraphSource, SnapshotStore};
    use dtview_core::{BoardDatabase, BoardLookup, GraphSnapshot};

    const GRAPH: &str = r#"{
        "file": "build/zephyr/zephyr.dts",
        "root": { "name": "/", "children": [
            { "name": "gpio@0", "labels": ["gpio0"], "source": { "file": "soc.dtsi", "line": 12 },
              "properties": [{ "name": "gpio-controller" }, { "name": "ngpios", "value": [2] }] },
            { "name": "led", "source": { "file": "board.dts", "line": 30 },
              "properties": [{ "name": "gpios", "value": [{ "ref": "&gpio0" }, 1, 0],
                               "source": { "file": "board.dts", "line": 31 } }] }
        ] }
    }"#;

    fn provider() -> OverviewProvider {
        let graph = GraphSnapshot::from_json(GRAPH).unwrap().link().unwrap();
        let source: Arc<dyn GraphSource> = Arc::new(Arc::new(graph));
        let boards: Arc<dyn BoardLookup> = Arc::new(BoardDatabase::empty());
        OverviewProvider::new(vec![OverviewContext::new(
            "app",
            Some("demo".to_string()),
            source,
            boards,
        )])
    }

    #[test]
    fn test_walk_and_present() {
        let provider = provider();
        let top = provider.children(None);
        assert_eq!(top.len(), 1);
        let context = provider.presentation(&top[0]);
        assert_eq!(context.label, "app");
        assert_eq!(context.description.as_deref(), Some("demo"));
        assert!(provider.navigate(&top[0]).is_none());

        let domains = provider.children(Some(&top[0]));
        assert_eq!(domains.len(), 1);
        let gpio = provider.presentation(&domains[0]);
        assert_eq!(gpio.label, "GPIO");
        assert_eq!(gpio.icon.as_deref(), Some("gpio-pin"));
        assert!(gpio.collapsible);

        let controllers = provider.children(Some(&domains[0]));
        let controller = provider.presentation(&controllers[0]);
        assert_eq!(controller.label, "&gpio0");
        assert_eq!(controller.description.as_deref(), Some("2 pins • 1 in use"));

        let pins = provider.children(Some(&controllers[0]));
        assert_eq!(pins.len(), 1);
        let pin = provider.presentation(&pins[0]);
        assert_eq!(pin.label, "Pin 1");
        assert!(!pin.collapsible);
        assert!(provider.children(Some(&pins[0])).is_empty());
    }

    #[test]
    fn test_navigate_to_property_source() {
        let provider = provider();
        let top = provider.children(None);
        let domains = provider.children(Some(&top[0]));
        let controllers = provider.children(Some(&domains[0]));
        let pins = provider.children(Some(&controllers[0]));

        // Domain items carry no target
        assert!(provider.navigate(&domains[0]).is_none());

        let nav = provider.navigate(&pins[0]).unwrap();
        assert_eq!(nav.file, PathBuf::from("board.dts"));
        assert_eq!(nav.path, "/led");
        assert_eq!(nav.line, Some(31));

        let controller = provider.navigate(&controllers[0]).unwrap();
        assert_eq!(controller.file, PathBuf::from("soc.dtsi"));
        assert_eq!(controller.line, Some(12));
    }

    #[test]
    fn test_failing_context_has_no_children() {
        let source: Arc<dyn GraphSource> = Arc::new(SnapshotStore::new());
        let boards: Arc<dyn BoardLookup> = Arc::new(BoardDatabase::empty());
        let provider = OverviewProvider::new(vec![OverviewContext::new("pending", None, source, boards)])
            .with_timeout(Duration::from_millis(10));

        let top = provider.children(None);
        assert!(provider.children(Some(&top[0])).is_empty());
        assert!(provider.children(Some(&TreeNode::Context(7))).is_empty());
    }

    #[test]
    fn test_malformed_snapshot_degrades() {
        let graph = GraphSnapshot::from_json(
            r##"{ "root": { "name": "/",
                "properties": [{ "name": "#address-cells", "value": [18446744073709551615] }],
                "children": [
                    { "name": "gpio@0", "labels": ["gpio0"], "properties": [
                        { "name": "gpio-controller" },
                        { "name": "ngpios", "value": [18446744073709551615] } ] },
                    { "name": "flash@0", "properties": [
                        { "name": "compatible", "value": ["soc-nv-flash"] },
                        { "name": "reg", "value": [0, 1048576] } ] },
                    { "name": "intc", "labels": ["intc"], "properties": [
                        { "name": "interrupt-controller" },
                        { "name": "#interrupt-cells", "value": [18446744073709551615] } ] },
                    { "name": "led", "properties": [
                        { "name": "gpios", "value": [{ "ref": "&gpio0" }, 1, 0] },
                        { "name": "interrupt-parent", "value": [{ "ref": "&intc" }] },
                        { "name": "interrupts", "value": [5, 1] } ] }
                ] } }"##,
        )
        .unwrap()
        .link()
        .unwrap();
        let source: Arc<dyn GraphSource> = Arc::new(Arc::new(graph));
        let boards: Arc<dyn BoardLookup> = Arc::new(BoardDatabase::empty());
        let provider = OverviewProvider::new(vec![OverviewContext::new("broken", None, source, boards)]);

        let top = provider.children(None);
        let domains = provider.children(Some(&top[0]));
        let labels: Vec<String> = domains.iter().map(|d| provider.presentation(d).label).collect();

        // Flash regs can't be decoded, the other domains survive
        assert!(!labels.contains(&"Flash".to_string()));
        assert!(labels.contains(&"GPIO".to_string()));

        let mut stack = domains;
        while let Some(node) = stack.pop() {
            stack.extend(provider.children(Some(&node)));
        }

        let gpio = &provider.children(Some(&top[0]))[0];
        let controllers = provider.children(Some(gpio));
        assert_eq!(
            provider.presentation(&controllers[0]).description.as_deref(),
            Some("32 pins • 1 in use")
        );
    }
}
