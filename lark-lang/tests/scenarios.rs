//! End-to-end checks against the packaged default syntax.

use lark_lang::{
    parse_source, Errors, Node, Positions, SourcePos, Syntax, Tree, TreeRef,
};

fn parse(source: &str) -> (TreeRef, Errors) {
    let positions = Positions::new();
    let errors = Errors::silent(positions.clone());
    let syntax = Syntax::built_in(&positions, &errors);
    let tree = parse_source("scenario", source, &positions, syntax, &errors)
        .unwrap_or_else(|| panic!("{source:?} did not produce a tree"));
    (tree, errors)
}

fn pos() -> SourcePos {
    SourcePos(0)
}

fn name(text: &str) -> TreeRef {
    Node::name(text, pos())
}

fn infix(op: &str, left: TreeRef, right: TreeRef) -> TreeRef {
    Node::infix(name(op), left, right, pos())
}

fn prefix(op: &str, operand: TreeRef) -> TreeRef {
    Node::prefix(name(op), operand, pos())
}

#[test]
fn addition_parses_and_renders() {
    let (tree, errors) = parse("42 + 13");

    assert_eq!(
        tree,
        infix("+", Node::natural(42, pos()), Node::natural(13, pos()))
    );
    assert_eq!(tree.text(), "42 + 13");
    assert!(errors.is_empty());
}

#[test]
fn write_with_negated_argument() {
    let (tree, errors) = parse("write -A, B");

    assert_eq!(
        tree,
        prefix("write", infix(",", prefix("-", name("a")), name("b")))
    );
    assert!(errors.is_empty());
}

#[test]
fn doubled_quotes_embed_the_quote_character() {
    let (tree, _) = parse("\"He said \"\"hi\"");

    assert_eq!(
        tree.kind,
        Tree::Text {
            value: "He said \"hi".into(),
            quote: '"'
        }
    );
}

#[test]
fn based_blob_packs_bytes() {
    let (tree, errors) = parse("$16#FF00$");

    assert_eq!(
        tree.kind,
        Tree::Blob {
            data: vec![0xFF, 0x00],
            base: 16
        }
    );
    assert!(errors.is_empty());
}

#[test]
fn indented_lines_join_the_opening_statement() {
    let source = "if a\n    b\n    c\nelse\n    d";
    let (tree, errors) = parse(source);

    let then_block = Node::block(
        name("\t"),
        name("\u{8}"),
        Some(name("\n")),
        [name("a"), name("b"), name("c")],
        pos(),
    );
    let else_block = Node::block(name("\t"), name("\u{8}"), None, [name("d")], pos());

    assert_eq!(
        tree,
        infix("else", prefix("if", then_block), else_block)
    );
    assert!(errors.is_empty());
}

#[test]
fn based_exponent_scales_by_the_base() {
    let (tree, errors) = parse("16#FF#E2");

    assert_eq!(
        tree.kind,
        Tree::Natural {
            value: 65280,
            base: Some(16)
        }
    );
    assert!(errors.is_empty());
}

#[test]
fn negative_literal_is_a_signed_leaf() {
    let (tree, _) = parse("-1");

    assert_eq!(tree.kind, Tree::Integer { value: -1, base: None });
}

#[test]
fn comma_list_inside_parentheses_collects_children() {
    let (tree, errors) = parse("(1,2,3)");

    match &tree.kind {
        Tree::Block {
            separator,
            children,
            ..
        } => {
            assert_eq!(
                separator.as_ref().and_then(|node| node.name_value()),
                Some(",")
            );
            let values: Vec<_> = children.iter().map(|child| child.kind.clone()).collect();
            assert_eq!(
                values,
                [
                    Tree::Natural { value: 1, base: None },
                    Tree::Natural { value: 2, base: None },
                    Tree::Natural { value: 3, base: None },
                ]
            );
        }
        other => panic!("expected block, got {other:?}"),
    }
    assert!(errors.is_empty());
}

#[test]
fn structural_queries_are_uniform() {
    let (tree, _) = parse("A + B * C");

    assert_eq!(tree.arity(), 3);
    assert_eq!(tree.child(0).unwrap().name_value(), Some("+"));
    assert_eq!(tree.child(1).unwrap().name_value(), Some("a"));
    assert_eq!(tree.child(2).unwrap().arity(), 3);

    let clone = tree.deep_clone();
    assert_eq!(clone, tree);
    assert_eq!(clone.text(), tree.text());
}
