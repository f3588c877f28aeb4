//! Builds a `NavTree` from navigation tuples.

use tracing::{debug, instrument, trace, warn};

use crate::domain::arena::{NavTree, NodeData, NodeRef, Shape};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::literal::{is_bare_literal, parse_literal, Literal, Script, MAX_NESTING};

/// Default binding holding the top-level tree.
pub const ROOT_BINDING: &str = "NAVTREE";

/// Deepest entry level a tree may have, counting fragments.
///
/// Each level takes two arrays in tuple form, so any loaded tree still
/// serializes to a literal the parser accepts.
pub const MAX_DEPTH: usize = (MAX_NESTING - 1) / 2;

/// Supplies the literal behind a fragment reference (`[label, link, "name"]`).
pub trait FragmentResolver {
    /// Returns `Ok(None)` when the fragment does not exist.
    fn resolve(&self, name: &str) -> DomainResult<Option<Literal>>;
}

/// Resolver for trees without external fragments.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFragments;

impl FragmentResolver for NoFragments {
    fn resolve(&self, _name: &str) -> DomainResult<Option<Literal>> {
        Ok(None)
    }
}

/// Load a tree from a literal without resolving fragment references.
pub fn load(source: &Literal) -> DomainResult<NavTree> {
    NavTreeLoader::new().load(source)
}

/// Load a tree from source text: a bare array, or a script whose
/// `NAVTREE` binding (or first array binding) holds the tree.
pub fn load_str(src: &str) -> DomainResult<NavTree> {
    if is_bare_literal(src) {
        return load(&parse_literal(src)?);
    }
    let script = Script::parse(src)?;
    let binding = script
        .bindings
        .iter()
        .find(|b| b.name == ROOT_BINDING)
        .or_else(|| script.first_array())
        .ok_or_else(|| DomainError::MissingBinding(ROOT_BINDING.to_string()))?;
    NavTreeLoader::new()
        .root_name(&binding.name)
        .load(&binding.value)
}

/// Walks nested tuples into an arena tree, expanding fragment references.
pub struct NavTreeLoader<'r> {
    resolver: &'r dyn FragmentResolver,
    root_name: String,
    strict: bool,
}

impl Default for NavTreeLoader<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl NavTreeLoader<'static> {
    pub fn new() -> Self {
        Self {
            resolver: &NoFragments,
            root_name: ROOT_BINDING.to_string(),
            strict: false,
        }
    }
}

impl<'r> NavTreeLoader<'r> {
    pub fn with_resolver<'s>(self, resolver: &'s dyn FragmentResolver) -> NavTreeLoader<'s> {
        NavTreeLoader {
            resolver,
            root_name: self.root_name,
            strict: self.strict,
        }
    }

    pub fn root_name(mut self, name: &str) -> Self {
        self.root_name = name.to_string();
        self
    }

    /// Fail on references the resolver cannot find instead of keeping them as leaves.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[instrument(level = "debug", skip(self, source), fields(root = %self.root_name))]
    pub fn load(&self, source: &Literal) -> DomainResult<NavTree> {
        let entries = source.as_array().ok_or_else(|| {
            DomainError::malformed(&[], format!("expected an array, found {}", source.kind()))
        })?;
        let mut tree = NavTree::with_root(&self.root_name);
        let root = tree.root();
        let mut expanding = vec![self.root_name.clone()];
        self.load_entries(&mut tree, root, entries, 1, &mut Vec::new(), &mut expanding)?;
        debug!("loaded {} entries, depth {}", tree.len(), tree.depth());
        Ok(tree)
    }

    fn load_entries(
        &self,
        tree: &mut NavTree,
        parent: NodeRef,
        entries: &[Literal],
        depth: usize,
        path: &mut Vec<usize>,
        expanding: &mut Vec<String>,
    ) -> DomainResult<()> {
        if depth > MAX_DEPTH && !entries.is_empty() {
            return Err(DomainError::malformed(
                path,
                format!("entries nested deeper than {MAX_DEPTH} levels"),
            ));
        }
        for (i, entry) in entries.iter().enumerate() {
            path.push(i);
            self.load_entry(tree, parent, entry, depth, path, expanding)?;
            path.pop();
        }
        Ok(())
    }

    fn load_entry(
        &self,
        tree: &mut NavTree,
        parent: NodeRef,
        entry: &Literal,
        depth: usize,
        path: &mut Vec<usize>,
        expanding: &mut Vec<String>,
    ) -> DomainResult<()> {
        let tuple = entry.as_array().ok_or_else(|| {
            DomainError::malformed(path, format!("expected a tuple, found {}", entry.kind()))
        })?;
        if !(2..=3).contains(&tuple.len()) {
            return Err(DomainError::malformed(
                path,
                format!("expected 2 or 3 elements, found {}", tuple.len()),
            ));
        }
        let label = tuple[0].as_str().ok_or_else(|| {
            DomainError::malformed(path, format!("label must be a string, found {}", tuple[0].kind()))
        })?;
        if label.trim().is_empty() {
            return Err(DomainError::malformed(path, "label is empty"));
        }
        let link = tuple[1].as_str().ok_or_else(|| {
            DomainError::malformed(path, format!("link must be a string, found {}", tuple[1].kind()))
        })?;

        let (shape, children): (Shape, Option<&[Literal]>) = match tuple.get(2) {
            None => (Shape::Pair, None),
            Some(Literal::Null) => (Shape::Null, None),
            Some(Literal::Array(items)) => (Shape::Inline, Some(items)),
            Some(Literal::Str(name)) => (Shape::Reference(name.clone()), None),
            Some(other) => {
                return Err(DomainError::malformed(
                    path,
                    format!("children must be null, an array or a string, found {}", other.kind()),
                ))
            }
        };
        trace!(label, link, ?shape, "entry");

        let node = tree.insert_node(
            NodeData {
                label: label.to_string(),
                link: link.to_string(),
                shape: shape.clone(),
            },
            parent,
        );

        if let Some(items) = children {
            path.push(2);
            self.load_entries(tree, node, items, depth + 1, path, expanding)?;
            path.pop();
        }
        if let Shape::Reference(name) = shape {
            self.expand_reference(tree, node, &name, depth + 1, expanding)?;
        }
        Ok(())
    }

    fn expand_reference(
        &self,
        tree: &mut NavTree,
        node: NodeRef,
        name: &str,
        depth: usize,
        expanding: &mut Vec<String>,
    ) -> DomainResult<()> {
        if expanding.iter().any(|n| n == name) {
            return Err(DomainError::CycleDetected(name.to_string()));
        }
        let Some(fragment) = self.resolver.resolve(name)? else {
            if self.strict {
                return Err(DomainError::UnresolvedReference(name.to_string()));
            }
            warn!("fragment not found, keeping leaf: {}", name);
            return Ok(());
        };
        let entries = fragment.as_array().ok_or_else(|| {
            DomainError::in_fragment(
                name,
                DomainError::malformed(&[], format!("expected an array, found {}", fragment.kind())),
            )
        })?;

        debug!("expanding fragment {}", name);
        expanding.push(name.to_string());
        // Element paths restart inside the fragment
        let result = self.load_entries(tree, node, entries, depth, &mut Vec::new(), expanding);
        expanding.pop();
        result.map_err(|e| match e {
            DomainError::CycleDetected(_) => e,
            e => DomainError::in_fragment(name, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::literal::parse_literal;
    use rstest::rstest;

    struct MapResolver(HashMap<String, Literal>);

    impl MapResolver {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), parse_literal(v).unwrap()))
                    .collect(),
            )
        }
    }

    impl FragmentResolver for MapResolver {
        fn resolve(&self, name: &str) -> DomainResult<Option<Literal>> {
            Ok(self.0.get(name).cloned())
        }
    }

    #[test]
    fn given_single_entry_when_loading_then_root_has_one_leaf_child() {
        let tree = load_str(r#"[["A","a.html",null]]"#).unwrap();
        let children = tree.children_of(tree.root()).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(tree.label_of(children[0]).unwrap(), "A");
        assert_eq!(tree.link_of(children[0]).unwrap(), "a.html");
        assert!(tree.children_of(children[0]).unwrap().is_empty());
    }

    #[test]
    fn given_null_pair_and_empty_children_when_traversing_then_all_are_leaves() {
        let tree = load_str(r#"[["A","a",null],["B","b"],["C","c",[]]]"#).unwrap();
        assert_eq!(tree.leaf_nodes().len(), 3);
        let shapes: Vec<_> = tree.iter().map(|(_, _, n)| n.data.shape.clone()).collect();
        assert_eq!(shapes, vec![Shape::Null, Shape::Pair, Shape::Inline]);
    }

    #[rstest]
    #[case(r#"["A","a",null]"#, "[0]", "expected a tuple")]
    #[case(r#"[["A"]]"#, "[0]", "expected 2 or 3 elements")]
    #[case(r#"[["A","a",null,null]]"#, "[0]", "expected 2 or 3 elements")]
    #[case(r#"[[1,"a",null]]"#, "[0]", "label must be a string")]
    #[case(r#"[["  ","a",null]]"#, "[0]", "label is empty")]
    #[case(r#"[["A",null,null]]"#, "[0]", "link must be a string")]
    #[case(r#"[["A","a",true]]"#, "[0]", "children must be")]
    #[case(r#"[["A","a",[["B","b",[["C"]]]]]]"#, "[0][2][0][2][0]", "expected 2 or 3")]
    fn given_malformed_tuple_when_loading_then_reports_path(
        #[case] src: &str,
        #[case] expected_path: &str,
        #[case] expected_reason: &str,
    ) {
        match load_str(src) {
            Err(DomainError::MalformedSource { path, reason }) => {
                assert_eq!(path, expected_path);
                assert!(reason.contains(expected_reason), "reason: {reason}");
            }
            other => panic!("expected MalformedSource, got {other:?}"),
        }
    }

    #[test]
    fn given_non_array_source_when_loading_then_malformed() {
        assert!(matches!(
            load(&Literal::Null),
            Err(DomainError::MalformedSource { .. })
        ));
    }

    #[test]
    fn given_script_without_navtree_when_loading_then_uses_first_array() {
        let tree = load_str("var MSG = 'x';\nvar doc_start = [ [ \"Overview\", \"doc_overview.html\", null ] ];")
            .unwrap();
        assert_eq!(tree.name(), "doc_start");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn given_script_without_arrays_when_loading_then_missing_binding() {
        assert_eq!(
            load_str("var MSG = 'x';").unwrap_err(),
            DomainError::MissingBinding("NAVTREE".to_string())
        );
    }

    #[test]
    fn given_reference_when_loading_with_resolver_then_expands_fragment() {
        let resolver = MapResolver::new(&[(
            "main_topics",
            r#"[["License","doc_license.html",null],["Getting started","doc_start.html","doc_start"]]"#,
        ), (
            "doc_start",
            r#"[["Overview","doc_overview.html",null]]"#,
        )]);
        let tree = NavTreeLoader::new()
            .with_resolver(&resolver)
            .load(&parse_literal(r#"[["Developer manual","main_topics.html","main_topics"]]"#).unwrap())
            .unwrap();

        let labels: Vec<_> = tree.iter().map(|(_, d, n)| (d, n.data.label.as_str())).collect();
        assert_eq!(
            labels,
            vec![
                (1, "Developer manual"),
                (2, "License"),
                (2, "Getting started"),
                (3, "Overview"),
            ]
        );
        let top = tree.children_of(tree.root()).unwrap()[0];
        assert_eq!(
            tree.shape_of(top).unwrap(),
            &Shape::Reference("main_topics".to_string())
        );
    }

    #[test]
    fn given_self_reference_when_loading_then_cycle_detected() {
        let resolver = MapResolver::new(&[("loop", r#"[["Again","a.html","loop"]]"#)]);
        let err = NavTreeLoader::new()
            .with_resolver(&resolver)
            .load(&parse_literal(r#"[["Start","s.html","loop"]]"#).unwrap())
            .unwrap_err();
        assert_eq!(err, DomainError::CycleDetected("loop".to_string()));
    }

    #[test]
    fn given_unknown_reference_when_strict_then_unresolved() {
        let source = parse_literal(r#"[["Start","s.html","nowhere"]]"#).unwrap();
        assert_eq!(
            NavTreeLoader::new().strict(true).load(&source).unwrap_err(),
            DomainError::UnresolvedReference("nowhere".to_string())
        );
        let tree = NavTreeLoader::new().load(&source).unwrap();
        assert_eq!(tree.leaf_nodes().len(), 1);
    }

    #[test]
    fn given_fragment_chain_deeper_than_limit_when_loading_then_malformed() {
        struct Chain;

        impl FragmentResolver for Chain {
            fn resolve(&self, name: &str) -> DomainResult<Option<Literal>> {
                let next = format!("{name}x");
                Ok(Some(Literal::Array(vec![Literal::Array(vec![
                    Literal::str("Deeper"),
                    Literal::str("deeper.html"),
                    Literal::str(next),
                ])])))
            }
        }

        let err = NavTreeLoader::new()
            .with_resolver(&Chain)
            .load(&parse_literal(r#"[["Start","s.html","f"]]"#).unwrap())
            .unwrap_err();

        match err.root_cause() {
            DomainError::MalformedSource { reason, .. } => {
                assert!(reason.contains("nested deeper than"), "reason: {reason}")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn given_tree_at_depth_limit_when_loading_then_succeeds() {
        let mut source = Literal::Null;
        for _ in 0..MAX_DEPTH {
            source = Literal::Array(vec![Literal::Array(vec![
                Literal::str("Level"),
                Literal::str("level.html"),
                source,
            ])]);
        }
        let tree = load(&source).unwrap();
        assert_eq!(tree.depth(), MAX_DEPTH);
        assert_eq!(parse_literal(&source.to_string()).unwrap(), source);

        let deeper = Literal::Array(vec![Literal::Array(vec![
            Literal::str("Level"),
            Literal::str("level.html"),
            source,
        ])]);
        assert!(matches!(
            load(&deeper),
            Err(DomainError::MalformedSource { .. })
        ));
    }

    #[test]
    fn given_malformed_fragment_when_loading_then_error_names_fragment() {
        let resolver = MapResolver::new(&[("frag", r#"[["ok","a",null],["bad"]]"#)]);
        let err = NavTreeLoader::new()
            .with_resolver(&resolver)
            .load(&parse_literal(r#"[["Start","s.html","frag"]]"#).unwrap())
            .unwrap_err();
        match err {
            DomainError::InFragment { name, source } => {
                assert_eq!(name, "frag");
                assert!(matches!(*source, DomainError::MalformedSource { ref path, .. } if path == "[1]"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
