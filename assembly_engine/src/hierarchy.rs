//! Part paths grouped into a tree for selection and visibility controls.
//!
//! Paths are split on [`PATH_SEPARATOR`]; every prefix becomes a group and
//! every full path a leaf. A path that is also the prefix of deeper paths
//! shows up as a leaf inside its own group, listed first.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::loader::PATH_SEPARATOR;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PartNode {
    Group {
        name: String,
        path: String,
        children: Vec<PartNode>,
    },
    Leaf {
        name: String,
        path: String,
    },
}

impl PartNode {
    pub fn name(&self) -> &str {
        match self {
            PartNode::Group { name, .. } | PartNode::Leaf { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            PartNode::Group { path, .. } | PartNode::Leaf { path, .. } => path,
        }
    }

    fn walk<'a, F>(&'a self, depth: usize, visit: &mut F)
    where
        F: FnMut(Visit<'a>),
    {
        match self {
            PartNode::Leaf { name, path } => visit(Visit::Leaf { name, path, depth }),
            PartNode::Group {
                name,
                path,
                children,
            } => {
                visit(Visit::Enter { name, path, depth });
                for child in children {
                    child.walk(depth + 1, visit);
                }
                visit(Visit::Leave { path, depth });
            }
        }
    }
}

/// Events produced by [`PartTree::walk`], in depth-first order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit<'a> {
    Enter {
        name: &'a str,
        path: &'a str,
        depth: usize,
    },
    Leaf {
        name: &'a str,
        path: &'a str,
        depth: usize,
    },
    Leave {
        path: &'a str,
        depth: usize,
    },
}

/// How many leaves under a node satisfy a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    None,
    Partial,
    Full,
}

impl Coverage {
    fn from_counts(matched: usize, total: usize) -> Self {
        if total == 0 || matched == 0 {
            Coverage::None
        } else if matched == total {
            Coverage::Full
        } else {
            Coverage::Partial
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Coverage::None => "[ ]",
            Coverage::Partial => "[~]",
            Coverage::Full => "[x]",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartTree {
    roots: Vec<PartNode>,
}

impl PartTree {
    pub fn from_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tree = PartTree::default();
        for path in paths {
            let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
            insert(&mut tree.roots, &segments, "");
        }
        tree
    }

    pub fn roots(&self) -> &[PartNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn walk<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(Visit<'a>),
    {
        for node in &self.roots {
            node.walk(0, &mut visit);
        }
    }

    /// Group or leaf whose path is exactly `path`. Groups take precedence
    /// over the leaf of the same path.
    pub fn find(&self, path: &str) -> Option<&PartNode> {
        let mut level = self.roots.as_slice();
        let mut found = None;
        let mut prefix = String::new();
        for segment in path.split(PATH_SEPARATOR) {
            if !prefix.is_empty() {
                prefix.push_str(PATH_SEPARATOR);
            }
            prefix.push_str(segment);
            let node = level
                .iter()
                .find(|node| matches!(node, PartNode::Group { .. }) && node.path() == prefix)
                .or_else(|| level.iter().find(|node| node.path() == prefix))?;
            level = match node {
                PartNode::Group { children, .. } => children.as_slice(),
                PartNode::Leaf { .. } => &[],
            };
            found = Some(node);
        }
        found
    }

    /// Every part path at or below `path`; empty when `path` is unknown.
    pub fn leaf_paths(&self, path: &str) -> Vec<&str> {
        let Some(node) = self.find(path) else {
            return Vec::new();
        };
        let mut leaves = Vec::new();
        node.walk(0, &mut |visit| {
            if let Visit::Leaf { path, .. } = visit {
                leaves.push(path);
            }
        });
        leaves
    }

    pub fn coverage<F>(&self, path: &str, mut predicate: F) -> Coverage
    where
        F: FnMut(&str) -> bool,
    {
        let leaves = self.leaf_paths(path);
        let matched = leaves.iter().filter(|leaf| predicate(**leaf)).count();
        Coverage::from_counts(matched, leaves.len())
    }

    pub fn selection_coverage(&self, path: &str, selected: &BTreeSet<String>) -> Coverage {
        self.coverage(path, |leaf| selected.contains(leaf))
    }

    pub fn visibility_coverage(&self, path: &str, visible: &BTreeMap<String, bool>) -> Coverage {
        self.coverage(path, |leaf| visible.get(leaf).copied().unwrap_or(false))
    }

    /// Indented text outline; each line carries the visibility marker of its
    /// node.
    pub fn outline(&self, visible: &BTreeMap<String, bool>) -> Vec<String> {
        let mut lines = Vec::new();
        self.walk(|visit| match visit {
            Visit::Enter { name, path, depth } => {
                let marker = self.visibility_coverage(path, visible).marker();
                lines.push(format!("{}{marker} {name}/", "  ".repeat(depth)));
            }
            Visit::Leaf { name, path, depth } => {
                let shown = visible.get(path).copied().unwrap_or(false);
                let marker = if shown { "[x]" } else { "[ ]" };
                lines.push(format!("{}{marker} {name}", "  ".repeat(depth)));
            }
            Visit::Leave { .. } => {}
        });
        lines
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}{PATH_SEPARATOR}{segment}")
    }
}

fn insert(level: &mut Vec<PartNode>, segments: &[&str], prefix: &str) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let path = join(prefix, head);

    if rest.is_empty() {
        let leaf = PartNode::Leaf {
            name: head.to_string(),
            path: path.clone(),
        };
        match level.iter_mut().find(|node| node.path() == path) {
            Some(PartNode::Group { children, .. }) => {
                if !children.iter().any(|child| *child == leaf) {
                    children.insert(0, leaf);
                }
            }
            Some(PartNode::Leaf { .. }) => {}
            None => level.push(leaf),
        }
        return;
    }

    let index = match level.iter().position(|node| node.path() == path) {
        Some(index) => index,
        None => {
            level.push(PartNode::Group {
                name: head.to_string(),
                path: path.clone(),
                children: Vec::new(),
            });
            level.len() - 1
        }
    };
    if let PartNode::Leaf { .. } = &level[index] {
        let leaf = level[index].clone();
        level[index] = PartNode::Group {
            name: head.to_string(),
            path: path.clone(),
            children: vec![leaf],
        };
    }
    if let PartNode::Group { children, .. } = &mut level[index] {
        insert(children, rest, &path);
    }
}
