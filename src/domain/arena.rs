use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};

/// How a node's children were declared in the source tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// `[label, link]`
    Pair,
    /// `[label, link, null]`
    Null,
    /// `[label, link, [...]]`
    Inline,
    /// `[label, link, "fragment"]`, children live in another script
    Reference(String),
}

/// Data payload for navigation entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Display text
    pub label: String,
    /// Target page, possibly with `#anchor`; may be empty
    pub link: String,
    pub shape: Shape,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.link.is_empty() {
            write!(f, "{}", self.label)
        } else {
            write!(f, "{} ({})", self.label, self.link)
        }
    }
}

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a node of one particular `NavTree`.
///
/// Arena slots are reused across trees, so the handle also carries the id of
/// the tree that issued it. Any other tree answers `NodeNotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    tree: u64,
    idx: Index,
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Parent node, None for the root
    pub parent: Option<NodeRef>,
    /// Child nodes in declaration order
    pub children: Vec<NodeRef>,
}

/// Arena-based navigation tree.
///
/// Built once by the loader and read-only afterwards.
#[derive(Debug)]
pub struct NavTree {
    id: u64,
    arena: Arena<TreeNode>,
    root: NodeRef,
}

impl NavTree {
    /// Create a tree holding only the synthetic root.
    pub(crate) fn with_root(name: &str) -> Self {
        let id = NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed);
        let mut arena = Arena::new();
        let idx = arena.insert(TreeNode {
            data: NodeData {
                label: name.to_string(),
                link: String::new(),
                shape: Shape::Inline,
            },
            parent: None,
            children: Vec::new(),
        });
        Self {
            id,
            arena,
            root: NodeRef { tree: id, idx },
        }
    }

    pub(crate) fn insert_node(&mut self, data: NodeData, parent: NodeRef) -> NodeRef {
        let node = NodeRef {
            tree: self.id,
            idx: self.arena.insert(TreeNode {
                data,
                parent: Some(parent),
                children: Vec::new(),
            }),
        };
        if parent.tree == self.id {
            if let Some(parent) = self.arena.get_mut(parent.idx) {
                parent.children.push(node);
            }
        }
        node
    }

    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// Name of the binding the tree was loaded from, e.g. `NAVTREE`.
    pub fn name(&self) -> &str {
        &self.arena[self.root.idx].data.label
    }

    pub fn get_node(&self, node: NodeRef) -> Option<&TreeNode> {
        if node.tree != self.id {
            return None;
        }
        self.arena.get(node.idx)
    }

    fn node(&self, node: NodeRef) -> DomainResult<&TreeNode> {
        self.get_node(node).ok_or(DomainError::NodeNotFound)
    }

    pub fn children_of(&self, idx: NodeRef) -> DomainResult<&[NodeRef]> {
        Ok(&self.node(idx)?.children)
    }

    pub fn label_of(&self, idx: NodeRef) -> DomainResult<&str> {
        Ok(&self.node(idx)?.data.label)
    }

    pub fn link_of(&self, idx: NodeRef) -> DomainResult<&str> {
        Ok(&self.node(idx)?.data.link)
    }

    pub fn shape_of(&self, idx: NodeRef) -> DomainResult<&Shape> {
        Ok(&self.node(idx)?.data.shape)
    }

    pub fn parent_of(&self, idx: NodeRef) -> DomainResult<Option<NodeRef>> {
        Ok(self.node(idx)?.parent)
    }

    /// Number of entries, excluding the synthetic root.
    pub fn len(&self) -> usize {
        self.arena.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pre-order traversal over entries in declaration order; the root is skipped.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Levels of entries below the root; an empty tree has depth 0.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, depth, _)| depth).max().unwrap_or(0)
    }

    /// Entries without children, in declaration order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<NodeRef> {
        self.iter()
            .filter(|(_, _, node)| node.children.is_empty())
            .map(|(idx, _, _)| idx)
            .collect()
    }

    /// First entry in pre-order whose link matches.
    ///
    /// A link without `#anchor` also matches the page part of an anchored link,
    /// so `doc_api.html` finds `doc_api.html#doc_api_1` when no exact entry exists.
    #[instrument(level = "debug", skip(self))]
    pub fn find_by_link(&self, link: &str) -> Option<NodeRef> {
        self.iter()
            .find(|(_, _, node)| node.data.link == link)
            .or_else(|| {
                if link.contains('#') {
                    return None;
                }
                self.iter()
                    .find(|(_, _, node)| node.data.link.split('#').next() == Some(link))
            })
            .map(|(idx, _, _)| idx)
    }

    /// Chain of entries from the top level down to `idx`, inclusive.
    pub fn path_to(&self, idx: NodeRef) -> DomainResult<Vec<NodeRef>> {
        self.node(idx)?;
        let mut path = Vec::new();
        let mut current = Some(idx);
        while let Some(i) = current {
            if i == self.root {
                break;
            }
            path.push(i);
            current = self.node(i)?.parent;
        }
        path.reverse();
        Ok(path)
    }
}

pub struct TreeIterator<'a> {
    tree: &'a NavTree,
    stack: Vec<(NodeRef, usize)>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a NavTree) -> Self {
        let stack = tree
            .get_node(tree.root)
            .map(|root| root.children.iter().rev().map(|&c| (c, 1)).collect())
            .unwrap_or_default();
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    /// Handle, depth (top level is 1) and node.
    type Item = (NodeRef, usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, depth)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((current_idx, depth, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a NavTree,
    stack: Vec<(NodeRef, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a NavTree) -> Self {
        let stack = tree
            .get_node(tree.root)
            .map(|root| root.children.iter().rev().map(|&c| (c, false)).collect())
            .unwrap_or_default();
        Self { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeRef, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
