//! Loader and traversal properties over the public domain API

use navtree::domain::{
    load, load_str, parse_literal, to_literal, DomainError, Literal, NavTreeLoader,
};
use rstest::rstest;

#[test]
fn given_single_entry_when_loading_then_matches_documented_example() {
    let tree = load_str(r#"[["A","a.html",null]]"#).unwrap();

    let top = tree.children_of(tree.root()).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(tree.label_of(top[0]).unwrap(), "A");
    assert_eq!(tree.link_of(top[0]).unwrap(), "a.html");
    assert!(tree.children_of(top[0]).unwrap().is_empty());
}

#[rstest]
#[case(r#"[["A","a.html",null]]"#)]
#[case(r#"[["A","a.html"],["B","b.html",[]]]"#)]
#[case(r#"[["A","",[["B","b.html",[["C","c.html#x",null]]],["D","d.html","frag"]]]]"#)]
#[case(r#"[]"#)]
fn given_valid_source_when_round_tripping_then_reproduces_it(#[case] src: &str) {
    let source = parse_literal(src).unwrap();
    let tree = load(&source).unwrap();

    let rendered = to_literal(&tree).to_string();

    assert_eq!(parse_literal(&rendered).unwrap(), source);
}

#[test]
fn given_tree_when_traversing_then_visits_every_node_once_in_order() {
    let src = r#"[["1","",[["1.1","",null],["1.2","",[["1.2.1","",null]]]]],["2",""],["3","",[]]]"#;
    let tree = load_str(src).unwrap();

    let labels: Vec<_> = tree
        .iter()
        .map(|(idx, _, _)| tree.label_of(idx).unwrap().to_string())
        .collect();

    assert_eq!(labels, vec!["1", "1.1", "1.2", "1.2.1", "2", "3"]);
    assert_eq!(labels.len(), tree.len());
}

#[test]
fn given_null_and_empty_children_when_traversing_then_behave_identically() {
    let with_null = load_str(r#"[["A","a",null]]"#).unwrap();
    let with_empty = load_str(r#"[["A","a",[]]]"#).unwrap();

    for tree in [&with_null, &with_empty] {
        let top = tree.children_of(tree.root()).unwrap()[0];
        assert!(tree.children_of(top).unwrap().is_empty());
        assert_eq!(tree.iter().count(), 1);
        assert_eq!(tree.leaf_nodes(), vec![top]);
    }
}

#[test]
fn given_wrong_shape_when_loading_then_malformed_source() {
    let err = load(&Literal::Array(vec![Literal::Array(vec![Literal::str("A")])])).unwrap_err();
    assert!(matches!(err, DomainError::MalformedSource { .. }));
}

#[test]
fn given_syntax_error_when_loading_text_then_reports_position() {
    let err = load_str("var NAVTREE = [ [ \"A\", \"a.html\" null ] ];").unwrap_err();
    assert!(matches!(err, DomainError::Syntax { line: 1, .. }));
}

#[test]
fn given_loaded_tree_when_shared_across_threads_then_readable() {
    let tree = std::sync::Arc::new(
        NavTreeLoader::new()
            .load(&parse_literal(r#"[["A","a.html",[["B","b.html"]]]]"#).unwrap())
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tree = tree.clone();
            std::thread::spawn(move || tree.iter().count())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}
