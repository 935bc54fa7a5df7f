//! Parse, render, then scan again: the token sequence must survive the
//! trip, up to name normalization and canonical whitespace.

use std::sync::Arc;

use lark_lang::{parse_source, Errors, Positions, Scanner, Syntax, TokenKind, TreeRef};

fn tokenize(source: &str, syntax: &Arc<Syntax>) -> Vec<(TokenKind, Option<TreeRef>)> {
    let positions = Positions::new();
    let errors = Errors::silent(positions.clone());
    let mut scanner = Scanner::from_source(
        "tokens",
        source,
        positions,
        syntax.clone(),
        errors.clone(),
    );
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token();
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push((token.kind, token.value));
    }
    assert!(
        errors.is_empty(),
        "tokenizing {source:?} reported {:?}",
        errors.diagnostics()
    );
    tokens
}

fn assert_round_trip(source: &str) {
    let positions = Positions::new();
    let errors = Errors::silent(positions.clone());
    let syntax = Syntax::built_in(&positions, &errors);

    let tree = parse_source("input", source, &positions, syntax.clone(), &errors)
        .unwrap_or_else(|| panic!("{source:?} did not produce a tree"));
    assert!(
        errors.is_empty(),
        "parsing {source:?} reported {:?}",
        errors.diagnostics()
    );

    let rendered = tree.text();
    assert_eq!(
        tokenize(source, &syntax),
        tokenize(&rendered, &syntax),
        "token mismatch for {source:?}, rendered as {rendered:?}"
    );
}

#[test]
fn arithmetic_round_trips() {
    assert_round_trip("42 + 13");
    assert_round_trip("A + B * C");
    assert_round_trip("A * B + C / D - E");
}

#[test]
fn prefix_and_application_round_trip() {
    assert_round_trip("write -A, B");
    assert_round_trip("not done");
}

#[test]
fn blocks_round_trip() {
    assert_round_trip("(1, 2, 3)");
    assert_round_trip("[x; y]");
    assert_round_trip("f (x) + 1");
    assert_round_trip("{a b}");
}

#[test]
fn indentation_round_trips() {
    assert_round_trip("if\n    a\n    b\n    c\nelse\n    d");
    assert_round_trip("loop\n    x := x + 1\n    write x");
}

// An indent block absorbs the expression on its opening line, so that
// source form is not token-stable; rendering reaches a fixpoint instead.
#[test]
fn indented_statement_heads_reach_a_fixpoint() {
    let positions = Positions::new();
    let errors = Errors::silent(positions.clone());
    let syntax = Syntax::built_in(&positions, &errors);
    let source = "if a\n    b\n    c\nelse\n    d";

    let tree = parse_source("input", source, &positions, syntax.clone(), &errors)
        .expect("source should produce a tree");
    let rendered = tree.text();
    let reparsed = parse_source("rendered", rendered.clone(), &positions, syntax, &errors)
        .expect("rendered form should produce a tree");

    assert_eq!(reparsed, tree, "rendered as {rendered:?}");
    assert!(errors.is_empty());
}

#[test]
fn literals_round_trip() {
    assert_round_trip("16#FF#E2 + 1");
    assert_round_trip("1.5 * 2.0");
    assert_round_trip("$FF00$");
    assert_round_trip("$64#TWFu$");
    assert_round_trip("\"He said \"\"hi\"\"\"");
    assert_round_trip("'c'");
}

#[test]
fn long_text_round_trips() {
    assert_round_trip("say <<Hello, world>>");
}

#[test]
fn statement_sequences_round_trip() {
    assert_round_trip("A\nB\nC");
    assert_round_trip("x := 1; y := 2");
}
