//! Frozen overview tree
//!
//! Synthesizers build owned [`OverviewItem`] trees. Once assembled, the tree
//! is flattened into an arena so hosts can hold cheap item handles, walk back
//! to a parent and identify items across rebuilds.

use serde::Serialize;
use std::fmt;

use crate::item::{NavTarget, OverviewItem};

/// Index of an item in its [`OverviewTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId(pub usize);

/// Identity derived from the (name, description) chain from the root.
///
/// Unlike [`ItemId`] it survives a rebuild as long as the item and its
/// ancestors still present the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ItemKey(String);

impl ItemKey {
    fn child(parent: Option<&ItemKey>, item: &OverviewItem) -> Self {
        let segment = match &item.description {
            Some(description) => format!("{}|{}", item.name, description),
            None => item.name.clone(),
        };
        match parent {
            Some(parent) => Self(format!("{}/{}", parent.0, segment)),
            None => Self(segment),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a host needs to draw one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemPresentation {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub collapsible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<NavTarget>,
}

#[derive(Debug, Clone)]
struct TreeEntry {
    name: String,
    icon: Option<String>,
    description: Option<String>,
    tooltip: Option<String>,
    target: Option<NavTarget>,
    parent: Option<ItemId>,
    children: Vec<ItemId>,
    key: ItemKey,
}

/// Arena of overview items in depth-first pre-order
#[derive(Debug, Clone)]
pub struct OverviewTree {
    entries: Vec<TreeEntry>,
}

impl OverviewTree {
    /// Freeze an assembled overview; the root gets `ItemId(0)`
    pub fn from_root(root: OverviewItem) -> Self {
        let mut tree = Self { entries: Vec::new() };
        tree.insert(root, None);
        tree
    }

    fn insert(&mut self, mut item: OverviewItem, parent: Option<ItemId>) -> ItemId {
        let id = ItemId(self.entries.len());
        let key = ItemKey::child(parent.map(|p| &self.entries[p.0].key), &item);
        let children = item.take_children();

        self.entries.push(TreeEntry {
            name: item.name,
            icon: item.icon,
            description: item.description,
            tooltip: item.tooltip,
            target: item.target,
            parent,
            children: Vec::with_capacity(children.len()),
            key,
        });

        for child in children {
            let child_id = self.insert(child, Some(id));
            self.entries[id.0].children.push(child_id);
        }
        id
    }

    pub fn root(&self) -> ItemId {
        ItemId(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: ItemId) -> Option<&TreeEntry> {
        self.entries.get(id.0)
    }

    pub fn name(&self, id: ItemId) -> Option<&str> {
        self.entry(id).map(|e| e.name.as_str())
    }

    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.entry(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ItemId) -> &[ItemId] {
        self.entry(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn key(&self, id: ItemId) -> Option<&ItemKey> {
        self.entry(id).map(|e| &e.key)
    }

    pub fn target(&self, id: ItemId) -> Option<&NavTarget> {
        self.entry(id).and_then(|e| e.target.as_ref())
    }

    pub fn find_key(&self, key: &ItemKey) -> Option<ItemId> {
        self.entries.iter().position(|e| &e.key == key).map(ItemId)
    }

    pub fn presentation(&self, id: ItemId) -> Option<ItemPresentation> {
        self.entry(id).map(|e| ItemPresentation {
            label: e.name.clone(),
            description: e.description.clone(),
            tooltip: e.tooltip.clone(),
            icon: e.icon.clone(),
            collapsible: !e.children.is_empty(),
            target: e.target.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overview() -> OverviewItem {
        let mut root = OverviewItem::new("Overview").with_icon("overview");
        let mut flash = OverviewItem::new("Flash").with_description("&flash0");
        flash.add_child(
            OverviewItem::new("app")
                .with_description("64 kB")
                .with_target(NavTarget::node("/flash/partitions/partition@20000")),
        );
        flash.add_child(OverviewItem::new("Free space @ 0x30000").with_description("832 kB"));
        root.add_child(flash);
        root.add_child(OverviewItem::new("GPIO"));
        root
    }

    #[test]
    fn test_from_root_preorder_with_parents() {
        let tree = OverviewTree::from_root(overview());
        assert_eq!(tree.len(), 5);

        let root = tree.root();
        assert_eq!(tree.name(root), Some("Overview"));
        assert_eq!(tree.parent(root), None);

        let top: Vec<&str> = tree
            .children(root)
            .iter()
            .filter_map(|id| tree.name(*id))
            .collect();
        assert_eq!(top, vec!["Flash", "GPIO"]);

        let flash = tree.children(root)[0];
        let app = tree.children(flash)[0];
        assert_eq!(app, ItemId(2));
        assert_eq!(tree.parent(app), Some(flash));
        assert_eq!(tree.children(ItemId(99)), &[] as &[ItemId]);
    }

    #[test]
    fn test_keys_follow_description_chain() {
        let tree = OverviewTree::from_root(overview());
        let app = ItemId(2);
        assert_eq!(tree.key(app).unwrap().as_str(), "Overview/Flash|&flash0/app|64 kB");

        // Rebuilding the same overview yields the same keys
        let rebuilt = OverviewTree::from_root(overview());
        assert_eq!(rebuilt.find_key(tree.key(app).unwrap()), Some(app));
    }

    #[test]
    fn test_presentation() {
        let tree = OverviewTree::from_root(overview());
        let flash = tree.presentation(ItemId(1)).unwrap();
        assert!(flash.collapsible);
        assert_eq!(flash.description.as_deref(), Some("&flash0"));

        let app = tree.presentation(ItemId(2)).unwrap();
        assert!(!app.collapsible);
        assert_eq!(app.target, Some(NavTarget::node("/flash/partitions/partition@20000")));
        assert!(tree.presentation(ItemId(42)).is_none());
    }

    #[test]
    fn test_presentation_json_skips_missing_fields() {
        let tree = OverviewTree::from_root(overview());
        let gpio = serde_json::to_value(tree.presentation(ItemId(4)).unwrap()).unwrap();
        assert_eq!(gpio, serde_json::json!({ "label": "GPIO", "collapsible": false }));
    }
}
