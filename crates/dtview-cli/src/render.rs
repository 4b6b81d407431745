//! Text and JSON rendering of the overview tree

use anyhow::Result;
use dtview_overview::{ItemPresentation, Navigation, TreeDataProvider, TreeNode};
use serde::Serialize;

/// One rendered row with its subtree
#[derive(Debug, Serialize)]
pub struct RenderedNode {
    #[serde(flatten)]
    pub presentation: ItemPresentation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<Navigation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderedNode>,
}

/// Walk the whole provider tree depth-first
pub fn walk(provider: &impl TreeDataProvider) -> Vec<RenderedNode> {
    provider
        .children(None)
        .iter()
        .map(|node| walk_node(provider, node))
        .collect()
}

fn walk_node(provider: &impl TreeDataProvider, node: &TreeNode) -> RenderedNode {
    RenderedNode {
        presentation: provider.presentation(node),
        navigation: provider.navigate(node),
        children: provider
            .children(Some(node))
            .iter()
            .map(|child| walk_node(provider, child))
            .collect(),
    }
}

fn line(presentation: &ItemPresentation) -> String {
    match &presentation.description {
        Some(description) if presentation.label.ends_with(':') => {
            format!("{} {}", presentation.label, description)
        }
        Some(description) => format!("{} ({})", presentation.label, description),
        None => presentation.label.clone(),
    }
}

fn render_node(out: &mut String, node: &RenderedNode, depth: usize, show_tooltips: bool) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{}{}\n", indent, line(&node.presentation)));
    if show_tooltips {
        if let Some(tooltip) = &node.presentation.tooltip {
            out.push_str(&format!("{}  tooltip: {}\n", indent, tooltip));
        }
    }
    for child in &node.children {
        render_node(out, child, depth + 1, show_tooltips);
    }
}

/// Indented outline, one item per line
pub fn render_text(provider: &impl TreeDataProvider, show_tooltips: bool) -> String {
    let mut out = String::new();
    for context in walk(provider) {
        if context.children.is_empty() {
            out.push_str(&format!("{}\n  No overview available\n", line(&context.presentation)));
            continue;
        }
        render_node(&mut out, &context, 0, show_tooltips);
    }
    out
}

pub fn render_json(provider: &impl TreeDataProvider) -> Result<String> {
    Ok(serde_json::to_string_pretty(&walk(provider))?)
}
