//! The operator-precedence parser.
//!
//! A single recursive routine, [`Parser::parse_block`], turns the token
//! stream into trees. Operators and their priorities come entirely from
//! the syntax table: an explicit stack of pending frames holds infix left
//! sides and prefix applications until a lower-priority operator or the
//! end of the block reduces them. Odd priorities are right-associative,
//! even priorities left-associative, which is what the `& !1` mask in the
//! reduction test implements.
//!
//! The parser records diagnostics and keeps going; it always yields a
//! best-effort tree for whatever it consumed.

use std::fs;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use crate::errors::{AnnotatedError, Errors};
use crate::position::{Positions, SourcePos};
use crate::scanner::Scanner;
use crate::syntax::{Syntax, INDENT_NAME, NEWLINE_NAME, UNINDENT_NAME};
use crate::token::{Token, TokenKind};
use crate::tree::{LarkString, Node, Tree, TreeRef};

/// Structural errors found while parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseError {
    UnmatchedClose {
        name: String,
        position: SourcePos,
    },
    UnclosedBlock {
        opening: String,
        closing: String,
        position: SourcePos,
    },
    MismatchedSeparator {
        expected: String,
        found: String,
        position: SourcePos,
    },
    MissingOperand {
        operator: String,
        position: SourcePos,
    },
    MalformedDirective {
        found: String,
        position: SourcePos,
    },
}

impl AnnotatedError for ParseError {
    fn title() -> &'static str {
        "Syntax error"
    }

    fn description(&self) -> &'static str {
        match self {
            ParseError::UnmatchedClose { .. } => "Unmatched block closing",
            ParseError::UnclosedBlock { .. } => "Unclosed block",
            ParseError::MismatchedSeparator { .. } => "Mismatched separator in block",
            ParseError::MissingOperand { .. } => "Missing operand",
            ParseError::MalformedDirective { .. } => "Malformed syntax directive",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ParseError::UnmatchedClose { name, .. } => {
                Some(format!("{name:?} does not close any open block"))
            }
            ParseError::UnclosedBlock {
                opening, closing, ..
            } => Some(format!("{opening:?} expects {closing:?}")),
            ParseError::MismatchedSeparator {
                expected, found, ..
            } => Some(format!("expected {expected:?}, found {found:?}")),
            ParseError::MissingOperand { operator, .. } => {
                Some(format!("after {operator:?}"))
            }
            ParseError::MalformedDirective { found, .. } => Some(format!("found {found}")),
        }
    }

    fn position(&self) -> SourcePos {
        match self {
            ParseError::UnmatchedClose { position, .. }
            | ParseError::UnclosedBlock { position, .. }
            | ParseError::MismatchedSeparator { position, .. }
            | ParseError::MissingOperand { position, .. }
            | ParseError::MalformedDirective { position, .. } => *position,
        }
    }
}

/// One pending entry on the operator stack: either an infix waiting for
/// its right side, or a tree waiting to be applied as a prefix.
struct Frame {
    infix: Option<(LarkString, SourcePos)>,
    tree: TreeRef,
    priority: i32,
}

/// The parser for one source.
pub struct Parser {
    scanner: Scanner,
    syntax: Arc<Syntax>,
    errors: Errors,
    pending: Option<Token>,
}

impl Parser {
    pub fn new(scanner: Scanner) -> Self {
        let syntax = scanner.syntax().clone();
        let errors = scanner.errors().clone();
        Parser {
            scanner,
            syntax,
            errors,
            pending: None,
        }
    }

    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Parse the whole source. Returns `None` for empty input.
    pub fn parse(&mut self) -> Option<TreeRef> {
        let position = self.scanner.position();
        self.parse_block(None, None, self.syntax.default_priority, position, None)
    }

    fn next_token(&mut self) -> Token {
        match self.pending.take() {
            Some(token) => token,
            None => self.scanner.next_token(),
        }
    }

    fn peek_token(&mut self) -> &Token {
        let scanner = &mut self.scanner;
        self.pending.get_or_insert_with(|| scanner.next_token())
    }

    /// Parse one region: the whole source (no delimiters) or the inside
    /// of a block. Delimited invocations always return a Block node. An
    /// indent block may be seeded with the expression already parsed on
    /// its opening line, which becomes the block's first child.
    fn parse_block(
        &mut self,
        opening: Option<&str>,
        closing: Option<&str>,
        block_priority: i32,
        block_position: SourcePos,
        seed: Option<TreeRef>,
    ) -> Option<TreeRef> {
        // A local handle avoids borrowing `self` for table lookups; it is
        // refreshed when a `syntax` directive replaces the table.
        let mut syntax = self.syntax.clone();
        let mut statement_priority = syntax.statement_priority;
        let function_priority = syntax.function_priority;
        let default_priority = syntax.default_priority;

        let mut result: Option<TreeRef> = None;
        let mut result_priority = block_priority;
        let mut stack: SmallVec<[Frame; 8]> = SmallVec::new();
        let mut children: SmallVec<[TreeRef; 4]> = SmallVec::new();
        children.extend(seed);
        let mut separator: Option<(LarkString, SourcePos)> = None;
        let mut new_statement = true;

        loop {
            let token = self.next_token();
            let position = token.position;

            // The operand produced by this token and the priority it
            // binds at.
            let mut right: Option<TreeRef> = None;
            let mut right_priority = function_priority;

            match token.kind {
                TokenKind::Eof | TokenKind::Error => {
                    if let (Some(opening), Some(closing)) = (opening, closing) {
                        if closing != UNINDENT_NAME {
                            self.errors.record(&ParseError::UnclosedBlock {
                                opening: opening.to_string(),
                                closing: closing.to_string(),
                                position,
                            });
                        }
                    }
                    break;
                }

                TokenKind::Integer
                | TokenKind::Real
                | TokenKind::Text
                | TokenKind::Character
                | TokenKind::LongText
                | TokenKind::Blob => {
                    right = token.value.clone();
                }

                TokenKind::Newline => {
                    if result.is_none() {
                        continue;
                    }
                    let suppress = {
                        let peeked = self.peek_token();
                        match peeked.kind {
                            // A trailing separator before the closing is
                            // not a statement of its own.
                            TokenKind::Close | TokenKind::Unindent | TokenKind::Eof => true,
                            TokenKind::Name => peeked
                                .name()
                                .and_then(|name| syntax.infix_priority(name))
                                .is_some_and(|priority| priority < statement_priority),
                            _ => false,
                        }
                    };
                    if suppress {
                        continue;
                    }
                    let priority = syntax
                        .infix_priority(NEWLINE_NAME)
                        .unwrap_or(default_priority);
                    self.reduce(&mut stack, &mut result, &mut result_priority, priority);
                    if opening.is_some() && priority < statement_priority && stack.is_empty() {
                        self.separate(
                            NEWLINE_NAME,
                            position,
                            &mut separator,
                            &mut children,
                            &mut result,
                        );
                        result_priority = block_priority;
                        new_statement = true;
                        continue;
                    }
                    let left = match result.take() {
                        Some(left) => left,
                        None => continue,
                    };
                    stack.push(Frame {
                        infix: Some((NEWLINE_NAME.into(), position)),
                        tree: left,
                        priority,
                    });
                    new_statement = priority < statement_priority;
                    continue;
                }

                TokenKind::Open | TokenKind::Indent => {
                    let (open_name, close_name, is_indent) = if token.kind == TokenKind::Indent {
                        (
                            LarkString::from(INDENT_NAME),
                            LarkString::from(UNINDENT_NAME),
                            true,
                        )
                    } else {
                        let name: LarkString = token.name().unwrap_or_default().into();
                        match syntax.block_closing(&name) {
                            Some(close) => (name.clone(), close.into(), false),
                            None => {
                                self.errors.record(&ParseError::UnmatchedClose {
                                    name: name.to_string(),
                                    position,
                                });
                                continue;
                            }
                        }
                    };
                    let priority = syntax
                        .infix_priority(&open_name)
                        .unwrap_or(default_priority);
                    // An indent block continues the statement in
                    // progress: the expression already parsed on the
                    // opening line becomes its first child. A lone
                    // prefix operator instead takes the whole block as
                    // its operand.
                    let block_seed = if is_indent && !awaiting_prefix_operand(&result, &syntax) {
                        result.take()
                    } else {
                        None
                    };
                    let saved_indent = (!is_indent).then(|| self.scanner.open_paren());
                    let block = self.parse_block(
                        Some(open_name.as_str()),
                        Some(close_name.as_str()),
                        priority,
                        position,
                        block_seed,
                    );
                    if let Some(saved) = saved_indent {
                        self.scanner.close_paren(saved);
                    }
                    right = block;
                }

                TokenKind::Close | TokenKind::Unindent => {
                    let name = token.name().unwrap_or_default();
                    let matched = match closing {
                        Some(closing) => {
                            (token.kind == TokenKind::Unindent && closing == UNINDENT_NAME)
                                || name == closing
                        }
                        None => false,
                    };
                    if matched {
                        break;
                    }
                    self.errors.record(&ParseError::UnmatchedClose {
                        name: name.to_string(),
                        position,
                    });
                    continue;
                }

                TokenKind::Name | TokenKind::Symbol => {
                    let name: LarkString = token.name().unwrap_or_default().into();

                    // Child-syntax closings are plain names to the child
                    // table, so match them here rather than as CLOSE.
                    if closing == Some(name.as_str()) {
                        break;
                    }

                    if let Some(comment_closing) = syntax.comment_closing(&name) {
                        let comment_closing = comment_closing.to_string();
                        self.scanner.skip_to(&comment_closing);
                        continue;
                    }

                    if let Some(text_closing) = syntax.text_closing(&name) {
                        let text_closing: LarkString = text_closing.into();
                        let content = self.scanner.skip_to(&text_closing);
                        right = Some(Node::long_text(
                            Node::text(content, position),
                            Node::name(name.clone(), position),
                            Node::name(text_closing, position),
                        ));
                        right_priority = function_priority;
                    } else if name == "syntax" && new_statement {
                        self.read_inline_syntax();
                        syntax = self.syntax.clone();
                        statement_priority = syntax.statement_priority;
                        continue;
                    } else if let Some((child_closing, child_syntax)) = syntax.child_syntax(&name)
                    {
                        let child_closing: LarkString = child_closing.into();
                        let child_syntax = child_syntax.clone();
                        let priority = syntax
                            .infix_priority(&name)
                            .unwrap_or(default_priority);
                        let saved_syntax = self.syntax.clone();
                        self.syntax = child_syntax.clone();
                        self.scanner.set_syntax(child_syntax);
                        let block = self.parse_block(
                            Some(name.as_str()),
                            Some(child_closing.as_str()),
                            priority,
                            position,
                            None,
                        );
                        self.syntax = saved_syntax.clone();
                        self.scanner.set_syntax(saved_syntax);
                        right = block;
                    } else {
                        let infix_priority = syntax.infix_priority(&name);
                        let prefix_priority = syntax.prefix_priority(&name);
                        let postfix_priority = syntax.postfix_priority(&name);

                        // `A -B` reads minus as a prefix, `A - B` as an
                        // infix: asymmetric spacing selects the prefix.
                        let prefer_prefix = prefix_priority.is_some()
                            && token.space_before
                            && !token.space_after;
                        let is_infix =
                            result.is_some() && infix_priority.is_some() && !prefer_prefix;

                        if is_infix {
                            let priority = infix_priority.unwrap_or(default_priority);
                            self.reduce(&mut stack, &mut result, &mut result_priority, priority);
                            if opening.is_some()
                                && priority < statement_priority
                                && stack.is_empty()
                            {
                                self.separate(
                                    &name,
                                    position,
                                    &mut separator,
                                    &mut children,
                                    &mut result,
                                );
                                result_priority = block_priority;
                                new_statement = true;
                                continue;
                            }
                            let left = match result.take() {
                                Some(left) => left,
                                None => continue,
                            };
                            stack.push(Frame {
                                infix: Some((name, position)),
                                tree: left,
                                priority,
                            });
                            new_statement = priority < statement_priority;
                            continue;
                        }

                        if let (Some(priority), Some(_)) = (postfix_priority, result.as_ref()) {
                            self.reduce(&mut stack, &mut result, &mut result_priority, priority);
                            let operand = match result.take() {
                                Some(operand) => operand,
                                None => continue,
                            };
                            result = Some(Node::postfix(
                                operand,
                                Node::name(name, position),
                                position,
                            ));
                            result_priority = priority;
                            new_statement = false;
                            continue;
                        }

                        right = Some(Node::name(name, position));
                        right_priority = prefix_priority.unwrap_or(function_priority);
                    }
                }
            }

            let Some(right_tree) = right else {
                continue;
            };
            new_statement = false;
            match result.take() {
                None => {
                    result = Some(right_tree);
                    result_priority = right_priority;
                }
                Some(existing) => {
                    stack.push(Frame {
                        infix: None,
                        tree: existing,
                        priority: result_priority,
                    });
                    result = Some(right_tree);
                    result_priority = right_priority;
                }
            }
        }

        // Drain the pending stack.
        while let Some(frame) = stack.pop() {
            match result.take() {
                Some(tree) => {
                    result = Some(reduce_frame(frame, tree));
                }
                None => {
                    if let Some((operator, position)) = &frame.infix {
                        self.errors.record(&ParseError::MissingOperand {
                            operator: operator.to_string(),
                            position: *position,
                        });
                    }
                    result = Some(frame.tree);
                }
            }
        }

        let Some(opening) = opening else {
            return result;
        };
        let closing = closing.unwrap_or_default();
        if let Some(tree) = result.take() {
            children.push(tree);
        }
        trace!(opening, children = children.len(), "block parsed");
        Some(Node::block(
            Node::name(LarkString::from(opening), block_position),
            Node::name(LarkString::from(closing), block_position),
            separator.map(|(name, position)| Node::name(name, position)),
            children,
            block_position,
        ))
    }

    /// Pop and apply every pending frame that binds at least as tightly
    /// as `priority`. The `& !1` mask makes odd priorities
    /// right-associative.
    fn reduce(
        &mut self,
        stack: &mut SmallVec<[Frame; 8]>,
        result: &mut Option<TreeRef>,
        result_priority: &mut i32,
        priority: i32,
    ) {
        while stack
            .last()
            .is_some_and(|top| (top.priority & !1) >= priority)
        {
            let Some(frame) = stack.pop() else {
                break;
            };
            match result.take() {
                Some(tree) => {
                    *result_priority = frame.priority;
                    *result = Some(reduce_frame(frame, tree));
                }
                None => {
                    if let Some((operator, position)) = &frame.infix {
                        self.errors.record(&ParseError::MissingOperand {
                            operator: operator.to_string(),
                            position: *position,
                        });
                    }
                    *result = Some(frame.tree);
                }
            }
        }
    }

    /// Close the current sub-expression of a block: record or verify the
    /// separator and append the expression to the children.
    fn separate(
        &mut self,
        name: &str,
        position: SourcePos,
        separator: &mut Option<(LarkString, SourcePos)>,
        children: &mut SmallVec<[TreeRef; 4]>,
        result: &mut Option<TreeRef>,
    ) {
        match separator {
            None => *separator = Some((name.into(), position)),
            Some((expected, _)) if expected.as_str() != name => {
                self.errors.record(&ParseError::MismatchedSeparator {
                    expected: expected.to_string(),
                    found: name.to_string(),
                    position,
                });
            }
            _ => {}
        }
        if let Some(tree) = result.take() {
            children.push(tree);
        }
    }

    /// Handle the in-source `syntax` directive: `syntax "file"` or
    /// `syntax` followed by a block of entries. The active table is
    /// cloned before mutation so that sharers are unaffected.
    fn read_inline_syntax(&mut self) {
        let token = self.next_token();
        let mut table = (*self.syntax).clone();
        match token.kind {
            TokenKind::Text => {
                let path = token
                    .value
                    .as_deref()
                    .and_then(|node| node.text_value())
                    .unwrap_or_default()
                    .to_string();
                match fs::read_to_string(&path) {
                    Ok(text) => {
                        let mut scanner = Scanner::from_source(
                            path,
                            text,
                            self.scanner.positions().clone(),
                            Arc::new(table.clone()),
                            self.errors.clone(),
                        );
                        table.read_entries(&mut scanner, None);
                    }
                    Err(_) => {
                        self.errors.record(&crate::syntax::ConfigError::UnreadableFile {
                            path,
                            position: token.position,
                        });
                    }
                }
            }
            TokenKind::Open | TokenKind::Indent => {
                let closing: LarkString = if token.kind == TokenKind::Indent {
                    UNINDENT_NAME.into()
                } else {
                    let name = token.name().unwrap_or_default();
                    self.syntax.block_closing(name).unwrap_or_default().into()
                };
                table.read_entries(&mut self.scanner, Some(closing.as_str()));
            }
            _ => {
                self.errors.record(&ParseError::MalformedDirective {
                    found: token.to_string(),
                    position: token.position,
                });
                return;
            }
        }
        let table = Arc::new(table);
        self.syntax = table.clone();
        self.scanner.set_syntax(table);
    }
}

/// True when the pending result is a lone prefix operator name, still
/// waiting for its operand.
fn awaiting_prefix_operand(result: &Option<TreeRef>, syntax: &Syntax) -> bool {
    result
        .as_deref()
        .and_then(|node| node.name_value())
        .is_some_and(|name| syntax.prefix_priority(name).is_some())
}

/// Apply `left` to `operand`: a Name becomes a Prefix application, other
/// trees juxtapose as Pfix. Negating a numeric literal folds in place.
fn apply(left: TreeRef, operand: TreeRef) -> TreeRef {
    let position = left.position;
    if left.is_name() {
        if left.name_value() == Some("-") {
            if let Some(negated) = negate_literal(&operand, position) {
                return negated;
            }
        }
        Node::prefix(left, operand, position)
    } else {
        Node::pfix(left, operand, position)
    }
}

fn reduce_frame(frame: Frame, tree: TreeRef) -> TreeRef {
    match frame.infix {
        Some((operator, position)) => Node::infix(
            Node::name(operator, position),
            frame.tree,
            tree,
            position,
        ),
        None => apply(frame.tree, tree),
    }
}

/// `-` applied to a numeric literal produces a signed literal instead of
/// a Prefix node.
fn negate_literal(operand: &TreeRef, position: SourcePos) -> Option<TreeRef> {
    match &operand.kind {
        Tree::Natural { value, base } => {
            if *value <= i64::MAX as u64 {
                Some(match base {
                    Some(base) => Node::based_integer(-(*value as i64), *base, position),
                    None => Node::integer(-(*value as i64), position),
                })
            } else {
                Some(Node::real(-(*value as f64), position))
            }
        }
        Tree::Integer { value, base } => Some(match base {
            Some(base) => Node::based_integer(-*value, *base, position),
            None => Node::integer(-*value, position),
        }),
        Tree::Real { value, base } => Some(match base {
            Some(base) => Node::based_real(-*value, *base, position),
            None => Node::real(-*value, position),
        }),
        _ => None,
    }
}

/// Parse an in-memory source with the given syntax, collecting errors in
/// the sink. Convenience wrapper used by tests and the CLI.
pub fn parse_source(
    name: impl Into<String>,
    text: impl Into<String>,
    positions: &Positions,
    syntax: Arc<Syntax>,
    errors: &Errors,
) -> Option<TreeRef> {
    let scanner = Scanner::from_source(name, text, positions.clone(), syntax, errors.clone());
    Parser::new(scanner).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(source: &str) -> TreeRef {
        let positions = Positions::new();
        let errors = Errors::silent(positions.clone());
        let syntax = Arc::new(Syntax::for_tests());
        parse_source("test", source, &positions, syntax, &errors)
            .expect("source should produce a tree")
    }

    fn parsed_with_errors(source: &str) -> (Option<TreeRef>, Errors) {
        let positions = Positions::new();
        let errors = Errors::silent(positions.clone());
        let syntax = Arc::new(Syntax::for_tests());
        let tree = parse_source("test", source, &positions, syntax, &errors);
        (tree, errors)
    }

    fn pos() -> SourcePos {
        SourcePos(0)
    }

    fn name(text: &str) -> TreeRef {
        Node::name(text, pos())
    }

    fn nat(value: u64) -> TreeRef {
        Node::natural(value, pos())
    }

    fn infix(op: &str, left: TreeRef, right: TreeRef) -> TreeRef {
        Node::infix(name(op), left, right, pos())
    }

    fn prefix(op: &str, operand: TreeRef) -> TreeRef {
        Node::prefix(name(op), operand, pos())
    }

    fn paren_block(separator: Option<&str>, children: Vec<TreeRef>) -> TreeRef {
        Node::block(name("("), name(")"), separator.map(name), children, pos())
    }

    fn indent_block(separator: Option<&str>, children: Vec<TreeRef>) -> TreeRef {
        Node::block(
            name(INDENT_NAME),
            name(UNINDENT_NAME),
            separator.map(name),
            children,
            pos(),
        )
    }

    #[test]
    fn simple_infix() {
        assert_eq!(parsed("42 + 13"), infix("+", nat(42), nat(13)));
    }

    #[test]
    fn priorities_nest_the_tighter_operator() {
        assert_eq!(
            parsed("A + B * C"),
            infix("+", name("a"), infix("*", name("b"), name("c")))
        );
        assert_eq!(
            parsed("A * B + C"),
            infix("+", infix("*", name("a"), name("b")), name("c"))
        );
    }

    #[test]
    fn even_priority_is_left_associative() {
        assert_eq!(
            parsed("A + B + C"),
            infix("+", infix("+", name("a"), name("b")), name("c"))
        );
    }

    #[test]
    fn odd_priority_is_right_associative() {
        assert_eq!(
            parsed("A ^ B ^ C"),
            infix("^", name("a"), infix("^", name("b"), name("c")))
        );
    }

    #[test]
    fn prefix_binds_through_application() {
        assert_eq!(
            parsed("write -A, B"),
            prefix(
                "write",
                infix(",", prefix("-", name("a")), name("b"))
            )
        );
    }

    #[test]
    fn spaced_minus_is_infix() {
        assert_eq!(parsed("A - B"), infix("-", name("a"), name("b")));
    }

    #[test]
    fn negated_literal_folds() {
        assert_eq!(parsed("-1"), Node::integer(-1, pos()));
        assert_eq!(
            parsed("A - -1"),
            infix("-", name("a"), Node::integer(-1, pos()))
        );
    }

    #[test]
    fn newline_is_an_infix_at_top_level() {
        assert_eq!(parsed("A\nB"), infix("\n", name("a"), name("b")));
    }

    #[test]
    fn newline_is_suppressed_before_low_priority_infix() {
        assert_eq!(parsed("A\nelse B"), infix("else", name("a"), name("b")));
    }

    #[test]
    fn parenthesized_list_collects_children() {
        assert_eq!(
            parsed("(1,2,3)"),
            paren_block(Some(","), vec![nat(1), nat(2), nat(3)])
        );
    }

    #[test]
    fn single_expression_block() {
        assert_eq!(parsed("(42)"), paren_block(None, vec![nat(42)]));
    }

    #[test]
    fn empty_block() {
        assert_eq!(parsed("()"), paren_block(None, vec![]));
    }

    #[test]
    fn mismatched_separator_is_reported() {
        let (tree, errors) = parsed_with_errors("(1, 2; 3)");

        assert_eq!(
            tree.unwrap(),
            paren_block(Some(","), vec![nat(1), nat(2), nat(3)])
        );
        assert_eq!(errors.count(), 1);
    }

    #[test]
    fn indent_block_absorbs_the_heading_expression() {
        let source = "if a\n    b\n    c\nelse\n    d";

        assert_eq!(
            parsed(source),
            infix(
                "else",
                prefix(
                    "if",
                    indent_block(Some("\n"), vec![name("a"), name("b"), name("c")])
                ),
                indent_block(None, vec![name("d")])
            )
        );
    }

    #[test]
    fn indent_block_is_the_operand_of_a_lone_prefix() {
        let source = "if\n    a\n    b";

        assert_eq!(
            parsed(source),
            prefix("if", indent_block(Some("\n"), vec![name("a"), name("b")]))
        );
    }

    #[test]
    fn parenthesized_block_is_an_ordinary_operand() {
        assert_eq!(
            parsed("f (x) + 1"),
            prefix("f", infix("+", paren_block(None, vec![name("x")]), nat(1)))
        );
    }

    #[test]
    fn postfix_operator() {
        assert_eq!(
            parsed("A + B %"),
            infix(
                "+",
                name("a"),
                Node::postfix(name("b"), name("%"), pos())
            )
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            parsed("A // ignore me\nB"),
            infix("\n", name("a"), name("b"))
        );
        assert_eq!(parsed("A /* mid */ + B"), infix("+", name("a"), name("b")));
    }

    #[test]
    fn long_text_becomes_a_delimited_leaf() {
        let tree = parsed("say << hello >>");

        match &tree.kind {
            Tree::Prefix { left, right } => {
                assert_eq!(left.name_value(), Some("say"));
                match &right.kind {
                    Tree::LongText { value, opening, closing } => {
                        assert_eq!(value.text_value(), Some(" hello "));
                        assert_eq!(opening.name_value(), Some("<<"));
                        assert_eq!(closing.name_value(), Some(">>"));
                    }
                    other => panic!("expected long text, got {other:?}"),
                }
            }
            other => panic!("expected prefix, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_close_is_reported() {
        let (tree, errors) = parsed_with_errors("A )");

        assert_eq!(tree.unwrap(), name("a"));
        assert_eq!(errors.count(), 1);
    }

    #[test]
    fn unclosed_block_is_reported() {
        let (tree, errors) = parsed_with_errors("(A");

        assert_eq!(tree.unwrap(), paren_block(None, vec![name("a")]));
        assert_eq!(errors.count(), 1);
    }

    #[test]
    fn missing_operand_is_reported() {
        let (tree, errors) = parsed_with_errors("A +");

        assert_eq!(tree.unwrap(), name("a"));
        assert_eq!(errors.count(), 1);
    }

    #[test]
    fn inline_syntax_directive_extends_the_table() {
        let source = "syntax\n    INFIX 350 @\nA @ B";

        assert_eq!(parsed(source), infix("@", name("a"), name("b")));
    }

    #[test]
    fn child_syntax_region_uses_its_own_table() {
        let mut parent = Syntax::for_tests();
        let mut child = Syntax::new();
        child.add_block("(", ")", 10);
        parent.add_child("data", "enddata", Arc::new(child));

        let positions = Positions::new();
        let errors = Errors::silent(positions.clone());
        let tree = parse_source(
            "test",
            "data 1 2 enddata",
            &positions,
            Arc::new(parent),
            &errors,
        )
        .unwrap();

        // Inside the region, juxtaposition applies because the child
        // table has no operators at all.
        match &tree.kind {
            Tree::Block { opening, children, .. } => {
                assert_eq!(opening.name_value(), Some("data"));
                assert_eq!(children.len(), 1);
                assert!(matches!(children[0].kind, Tree::Pfix { .. }));
            }
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn blob_and_based_literals_parse_as_leaves() {
        let blob = parsed("$16#FF00$");
        assert_eq!(
            blob.kind,
            Tree::Blob {
                data: vec![0xFF, 0x00],
                base: 16
            }
        );

        let based = parsed("16#FF#E2");
        assert_eq!(
            based.kind,
            Tree::Natural {
                value: 65280,
                base: Some(16)
            }
        );
    }
}
