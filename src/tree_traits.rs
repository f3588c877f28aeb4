/*
termtree rendering for navigation trees.

Kept as a trait so the CLI can render any tree-like value the same way.
 */
use termtree::Tree;
use tracing::instrument;

use crate::domain::{NavTree, NodeRef};

/// Options for text rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Deepest level to render; top-level entries are level 1
    pub max_depth: Option<usize>,
    /// Append `(link)` to labels
    pub show_links: bool,
}

pub trait TreeNodeConvert {
    fn to_tree_string(&self, options: RenderOptions) -> Tree<String>;
}

impl TreeNodeConvert for NavTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, options: RenderOptions) -> Tree<String> {
        fn label(tree: &NavTree, idx: NodeRef, options: RenderOptions) -> String {
            match tree.get_node(idx) {
                Some(node) if options.show_links => node.data.to_string(),
                Some(node) => node.data.label.clone(),
                None => String::new(),
            }
        }

        fn build_tree(
            tree: &NavTree,
            node_idx: NodeRef,
            depth: usize,
            options: RenderOptions,
            parent_tree: &mut Tree<String>,
        ) {
            if options.max_depth.is_some_and(|max| depth > max) {
                return;
            }
            if let Some(node) = tree.get_node(node_idx) {
                for &child_idx in &node.children {
                    let mut child_tree = Tree::new(label(tree, child_idx, options));
                    build_tree(tree, child_idx, depth + 1, options, &mut child_tree);
                    parent_tree.push(child_tree);
                }
            }
        }

        let mut root = Tree::new(self.name().to_string());
        build_tree(self, self.root(), 1, options, &mut root);
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::load_str;

    const SOURCE: &str = r#"[["A","a.html",[["B","b.html",null]]],["C","c.html"]]"#;

    #[test]
    fn given_tree_when_rendering_then_lists_labels_with_links() {
        let tree = load_str(SOURCE).unwrap();
        let text = tree
            .to_tree_string(RenderOptions {
                max_depth: None,
                show_links: true,
            })
            .to_string();
        assert!(text.starts_with("NAVTREE\n"));
        assert!(text.contains("A (a.html)"));
        assert!(text.contains("B (b.html)"));
        assert!(text.contains("C (c.html)"));
    }

    #[test]
    fn given_max_depth_when_rendering_then_cuts_deeper_levels() {
        let tree = load_str(SOURCE).unwrap();
        let text = tree
            .to_tree_string(RenderOptions {
                max_depth: Some(1),
                show_links: false,
            })
            .to_string();
        assert!(text.contains("── A"));
        assert!(!text.contains('B'));
        assert!(!text.contains("a.html"));
    }
}
