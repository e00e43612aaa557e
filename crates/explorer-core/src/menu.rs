//! Navigation menu tree and ancestor lookup
//!
//! The menu is a static label/key tree built once at startup. When a page
//! is opened from anywhere other than the menu itself (CLI argument,
//! restored session), the branches leading to it are expanded using
//! [`find_ancestor_keys`].

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

/// One entry of the navigation menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuNode {
    /// Unique across the whole tree
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    pub fn leaf(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(
        key: impl Into<String>,
        label: impl Into<String>,
        children: Vec<MenuNode>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Keys of every ancestor of `target`, root first, immediate parent last
///
/// Every branch is visited. If `target` occurs more than once, the
/// ancestor chains of all occurrences are collected in traversal order,
/// each key at most once. A top-level target has no ancestors, and an
/// unknown target yields an empty list.
pub fn find_ancestor_keys(tree: &[MenuNode], target: &str) -> Vec<String> {
    let mut path = Vec::new();
    let mut found = Vec::new();
    collect_ancestors(tree, target, &mut path, &mut found);
    found
}

fn collect_ancestors<'a>(
    nodes: &'a [MenuNode],
    target: &str,
    path: &mut Vec<&'a str>,
    found: &mut Vec<String>,
) {
    for node in nodes {
        if node.key == target {
            for key in path.iter() {
                if !found.iter().any(|k| k == key) {
                    found.push((*key).to_string());
                }
            }
        }
        if !node.children.is_empty() {
            path.push(&node.key);
            collect_ancestors(&node.children, target, path, found);
            path.pop();
        }
    }
}

/// Depth-first search for a node by key
pub fn find_node<'a>(tree: &'a [MenuNode], key: &str) -> Option<&'a MenuNode> {
    for node in tree {
        if node.key == key {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, key) {
            return Some(found);
        }
    }
    None
}

/// Keys of all leaves in display order
pub fn leaf_keys(tree: &[MenuNode]) -> Vec<String> {
    let mut keys = Vec::new();
    for node in tree {
        if node.is_leaf() {
            keys.push(node.key.clone());
        } else {
            keys.extend(leaf_keys(&node.children));
        }
    }
    keys
}

/// Labels from the root down to `key` itself, for breadcrumbs
pub fn label_path(tree: &[MenuNode], key: &str) -> Vec<String> {
    let ancestors = find_ancestor_keys(tree, key);
    let mut labels: Vec<String> = ancestors
        .iter()
        .filter_map(|k| find_node(tree, k).map(|n| n.label.clone()))
        .collect();
    if let Some(node) = find_node(tree, key) {
        labels.push(node.label.clone());
    }
    labels
}

/// Keys that appear more than once; empty for a well-formed tree
pub fn duplicate_keys(tree: &[MenuNode]) -> Vec<String> {
    fn walk(nodes: &[MenuNode], seen: &mut HashSet<String>, dups: &mut Vec<String>) {
        for node in nodes {
            if !seen.insert(node.key.clone()) && !dups.contains(&node.key) {
                dups.push(node.key.clone());
            }
            walk(&node.children, seen, dups);
        }
    }

    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    walk(tree, &mut seen, &mut dups);
    dups
}

/// A menu line as displayed, given the set of expanded branch keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub key: String,
    pub label: String,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
}

/// Flatten the tree into the rows currently visible
pub fn visible_rows(tree: &[MenuNode], expanded: &BTreeSet<String>) -> Vec<VisibleRow> {
    fn walk(
        nodes: &[MenuNode],
        expanded: &BTreeSet<String>,
        depth: usize,
        rows: &mut Vec<VisibleRow>,
    ) {
        for node in nodes {
            let is_expanded = expanded.contains(&node.key);
            rows.push(VisibleRow {
                key: node.key.clone(),
                label: node.label.clone(),
                depth,
                has_children: !node.is_leaf(),
                expanded: is_expanded,
            });
            if is_expanded {
                walk(&node.children, expanded, depth + 1, rows);
            }
        }
    }

    let mut rows = Vec::new();
    walk(tree, expanded, 0, &mut rows);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_three_tree() -> Vec<MenuNode> {
        vec![MenuNode::branch(
            "A",
            "Group A",
            vec![MenuNode::branch(
                "A1",
                "Group A1",
                vec![MenuNode::leaf("A1a", "Leaf A1a")],
            )],
        )]
    }

    fn sdk_tree() -> Vec<MenuNode> {
        vec![
            MenuNode::branch(
                "im",
                "Messaging",
                vec![
                    MenuNode::leaf("im.sendText", "Send text"),
                    MenuNode::branch(
                        "im.listeners",
                        "Listeners",
                        vec![MenuNode::leaf("im.addListener", "Add listener")],
                    ),
                ],
            ),
            MenuNode::branch(
                "group",
                "Groups",
                vec![MenuNode::leaf("group.create", "Create group")],
            ),
            MenuNode::leaf("about", "About"),
        ]
    }

    #[test]
    fn test_depth_three_returns_full_chain_root_first() {
        let tree = depth_three_tree();
        assert_eq!(find_ancestor_keys(&tree, "A1a"), vec!["A", "A1"]);
        assert_eq!(find_ancestor_keys(&tree, "A1"), vec!["A"]);
    }

    #[test]
    fn test_top_level_and_missing_targets() {
        let tree = depth_three_tree();
        assert!(find_ancestor_keys(&tree, "A").is_empty());
        assert!(find_ancestor_keys(&tree, "nope").is_empty());
        assert!(find_ancestor_keys(&[], "A").is_empty());
    }

    #[test]
    fn test_lookup_visits_every_branch() {
        let tree = sdk_tree();
        assert_eq!(
            find_ancestor_keys(&tree, "im.addListener"),
            vec!["im", "im.listeners"]
        );
        assert_eq!(find_ancestor_keys(&tree, "group.create"), vec!["group"]);
    }

    #[test]
    fn test_duplicate_targets_collect_every_chain_once() {
        let tree = vec![
            MenuNode::branch("x", "X", vec![MenuNode::leaf("dup", "Dup")]),
            MenuNode::branch(
                "y",
                "Y",
                vec![MenuNode::branch(
                    "x2",
                    "X2",
                    vec![MenuNode::leaf("dup", "Dup")],
                )],
            ),
        ];
        assert_eq!(find_ancestor_keys(&tree, "dup"), vec!["x", "y", "x2"]);
        assert_eq!(duplicate_keys(&tree), vec!["dup"]);
    }

    #[test]
    fn test_find_node_and_leaves() {
        let tree = sdk_tree();
        assert_eq!(
            find_node(&tree, "im.addListener").map(|n| n.label.as_str()),
            Some("Add listener")
        );
        assert!(find_node(&tree, "missing").is_none());
        assert_eq!(
            leaf_keys(&tree),
            vec!["im.sendText", "im.addListener", "group.create", "about"]
        );
        assert!(duplicate_keys(&tree).is_empty());
    }

    #[test]
    fn test_label_path() {
        let tree = sdk_tree();
        assert_eq!(
            label_path(&tree, "im.addListener"),
            vec!["Messaging", "Listeners", "Add listener"]
        );
    }

    #[test]
    fn test_visible_rows_follow_expansion() {
        let tree = sdk_tree();
        let collapsed = visible_rows(&tree, &BTreeSet::new());
        assert_eq!(collapsed.len(), 3);

        let expanded: BTreeSet<String> = find_ancestor_keys(&tree, "im.addListener")
            .into_iter()
            .collect();
        let rows = visible_rows(&tree, &expanded);
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "im",
                "im.sendText",
                "im.listeners",
                "im.addListener",
                "group",
                "about"
            ]
        );
        assert_eq!(rows[3].depth, 2);
        assert!(rows[0].expanded && rows[0].has_children);
    }
}
