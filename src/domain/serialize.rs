//! Converts a `NavTree` back to its tuple form.

use crate::domain::arena::{NavTree, NodeRef, Shape};
use crate::domain::literal::Literal;

/// Reproduce the source tuples, keeping each node's declared shape.
///
/// References serialize as their fragment name; their expanded children
/// belong to the other fragment.
pub fn to_literal(tree: &NavTree) -> Literal {
    Literal::Array(entries(tree, tree.root(), false))
}

/// Tuple form with every reference replaced by its expanded children.
///
/// Unresolved references become `null` so the result stands alone.
pub fn to_expanded_literal(tree: &NavTree) -> Literal {
    Literal::Array(entries(tree, tree.root(), true))
}

fn entries(tree: &NavTree, idx: NodeRef, expand: bool) -> Vec<Literal> {
    tree.get_node(idx)
        .map(|node| {
            node.children
                .iter()
                .filter_map(|&child| entry(tree, child, expand))
                .collect()
        })
        .unwrap_or_default()
}

fn entry(tree: &NavTree, idx: NodeRef, expand: bool) -> Option<Literal> {
    let node = tree.get_node(idx)?;
    let mut tuple = vec![
        Literal::str(&node.data.label),
        Literal::str(&node.data.link),
    ];
    match &node.data.shape {
        Shape::Pair => {}
        Shape::Null => tuple.push(Literal::Null),
        Shape::Inline => tuple.push(Literal::Array(entries(tree, idx, expand))),
        Shape::Reference(name) if !expand => tuple.push(Literal::str(name)),
        Shape::Reference(_) if node.children.is_empty() => tuple.push(Literal::Null),
        Shape::Reference(_) => tuple.push(Literal::Array(entries(tree, idx, expand))),
    }
    Some(Literal::Array(tuple))
}

/// Render a binding the way Doxygen writes it.
pub fn to_script(name: &str, value: &Literal) -> String {
    format!("var {name} =\n{value};\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::literal::{parse_literal, Script};
    use crate::domain::loader::{load, NavTreeLoader, FragmentResolver};
    use crate::domain::error::DomainResult;

    const SOURCE: &str = r#"[
  [ "AngelScript", "index.html", [
    [ "Introduction", "index.html", null ],
    [ "Developer manual", "main_topics.html", "main_topics" ],
    [ "Glossary", "glossary.html" ],
    [ "Empty", "empty.html", [] ]
  ] ]
]"#;

    struct Topics;

    impl FragmentResolver for Topics {
        fn resolve(&self, name: &str) -> DomainResult<Option<Literal>> {
            Ok((name == "main_topics")
                .then(|| parse_literal(r#"[["License","doc_license.html",null]]"#).unwrap()))
        }
    }

    #[test]
    fn given_loaded_tree_when_serializing_then_reproduces_source_text() {
        let source = parse_literal(SOURCE).unwrap();
        let tree = load(&source).unwrap();
        let back = to_literal(&tree);
        assert_eq!(back, source);
        assert_eq!(back.to_string(), SOURCE);
    }

    #[test]
    fn given_expanded_reference_when_serializing_then_keeps_reference_name() {
        let source = parse_literal(SOURCE).unwrap();
        let tree = NavTreeLoader::new().with_resolver(&Topics).load(&source).unwrap();
        assert_eq!(tree.len(), 6);
        assert_eq!(to_literal(&tree), source);
    }

    #[test]
    fn given_expanded_reference_when_serializing_expanded_then_inlines_children() {
        let source = parse_literal(SOURCE).unwrap();
        let tree = NavTreeLoader::new().with_resolver(&Topics).load(&source).unwrap();
        let expanded = to_expanded_literal(&tree);
        let reloaded = load(&expanded).unwrap();
        assert_eq!(reloaded.len(), 6);
        assert!(!expanded.to_string().contains("\"main_topics\""));
    }

    #[test]
    fn given_binding_when_rendering_script_then_parses_back() {
        let value = parse_literal(r#"[["A","a.html",null]]"#).unwrap();
        let script = to_script("NAVTREE", &value);
        assert!(script.starts_with("var NAVTREE =\n[\n"));
        assert_eq!(Script::parse(&script).unwrap().get("NAVTREE"), Some(&value));
    }
}
