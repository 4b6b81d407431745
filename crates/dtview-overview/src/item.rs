//! Overview item model - the uniform output of every synthesizer

use serde::{Deserialize, Serialize};

/// Back-reference from an item into the hardware graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavTarget {
    /// Node path
    pub path: String,
    /// Property on that node, when the item is about one property
    pub property: Option<String>,
}

impl NavTarget {
    pub fn node(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            property: None,
        }
    }

    pub fn property(path: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            property: Some(property.into()),
        }
    }
}

/// A node of an overview subtree under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewItem {
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub tooltip: Option<String>,
    pub target: Option<NavTarget>,
    children: Vec<OverviewItem>,
}

impl OverviewItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            description: None,
            tooltip: None,
            target: None,
            children: Vec::new(),
        }
    }

    /// Name/value pair, e.g. `Start` → `0x20000`
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name).with_description(value)
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn with_target(mut self, target: NavTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Append a child. `None` is ignored so optional subtrees can be passed
    /// straight through.
    pub fn add_child(&mut self, child: impl Into<Option<OverviewItem>>) {
        if let Some(child) = child.into() {
            self.children.push(child);
        }
    }

    pub fn children(&self) -> &[OverviewItem] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Depth-first search by name
    pub fn find(&self, name: &str) -> Option<&OverviewItem> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub(crate) fn take_children(&mut self) -> Vec<OverviewItem> {
        std::mem::take(&mut self.children)
    }

    pub(crate) fn sort_children_by_key<K: Ord>(&mut self, key: impl FnMut(&OverviewItem) -> K) {
        self.children.sort_by_key(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_child_ignores_none() {
        let mut parent = OverviewItem::new("Flash").with_icon("flash");
        let missing: Option<OverviewItem> = None;
        parent.add_child(missing);
        parent.add_child(OverviewItem::field("Start", "0x0"));
        parent.add_child(Some(OverviewItem::new("Size")));

        assert_eq!(parent.children().len(), 2);
        assert_eq!(parent.children()[0].description.as_deref(), Some("0x0"));
        assert!(parent.find("Size").is_some());
        assert!(parent.find("Missing").is_none());
    }
}
