//! The syntax table: operator priorities and delimiter sets.
//!
//! A table is loaded from a plain-text description that is tokenized by
//! the scanner itself, using the very table being built. Section keywords
//! (`INFIX`, `PREFIX`, `POSTFIX`, `BLOCK`, `COMMENT`, `TEXT`, `SYNTAX`)
//! steer a small state machine; an integer token sets the priority for the
//! entries that follow it. Odd priorities are right-associative, even ones
//! left-associative.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{AnnotatedError, Errors};
use crate::position::{Positions, SourcePos};
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use crate::tree::{normalize_name, LarkString, Tree};

/// Name of the synthetic indent block opening.
pub const INDENT_NAME: &str = "\t";
/// Name of the synthetic indent block closing.
pub const UNINDENT_NAME: &str = "\u{8}";
/// Name of the newline separator.
pub const NEWLINE_NAME: &str = "\n";

/// The packaged default syntax description.
pub const DEFAULT_SYNTAX: &str = include_str!("../syntax/lark.syntax");

/// Configuration errors from syntax or style descriptions.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    UnreadableFile {
        path: String,
        position: SourcePos,
    },
    MalformedEntry {
        found: String,
        position: SourcePos,
    },
    DuplicateEquals {
        position: SourcePos,
    },
}

impl AnnotatedError for ConfigError {
    fn title() -> &'static str {
        "Configuration error"
    }

    fn description(&self) -> &'static str {
        match self {
            ConfigError::UnreadableFile { .. } => "Cannot read description file",
            ConfigError::MalformedEntry { .. } => "Malformed description entry",
            ConfigError::DuplicateEquals { .. } => "Duplicate '=' in style entry",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ConfigError::UnreadableFile { path, .. } => Some(path.clone()),
            ConfigError::MalformedEntry { found, .. } => Some(format!("found {found}")),
            ConfigError::DuplicateEquals { .. } => None,
        }
    }

    fn position(&self) -> SourcePos {
        match self {
            ConfigError::UnreadableFile { position, .. }
            | ConfigError::MalformedEntry { position, .. }
            | ConfigError::DuplicateEquals { position } => *position,
        }
    }
}

/// Priorities and delimiter sets for one language level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Syntax {
    filename: Option<String>,
    known: Vec<LarkString>,
    infixes: Vec<(LarkString, i32)>,
    prefixes: Vec<(LarkString, i32)>,
    postfixes: Vec<(LarkString, i32)>,
    comments: Vec<(LarkString, LarkString)>,
    texts: Vec<(LarkString, LarkString)>,
    blocks: Vec<(LarkString, LarkString)>,
    block_closings: Vec<LarkString>,
    children: Vec<(LarkString, LarkString, Arc<Syntax>)>,
    pub default_priority: i32,
    pub statement_priority: i32,
    pub function_priority: i32,
}

impl Syntax {
    pub fn new() -> Self {
        Syntax {
            filename: None,
            known: Vec::new(),
            infixes: Vec::new(),
            prefixes: Vec::new(),
            postfixes: Vec::new(),
            comments: Vec::new(),
            texts: Vec::new(),
            blocks: Vec::new(),
            block_closings: Vec::new(),
            children: Vec::new(),
            default_priority: 0,
            statement_priority: 100,
            function_priority: 20,
        }
    }

    /// Load a table from an in-memory description.
    pub fn from_source(
        name: impl Into<String>,
        text: impl Into<String>,
        positions: &Positions,
        errors: &Errors,
    ) -> Self {
        let name = name.into();
        let mut syntax = Syntax::new();
        syntax.filename = Some(name.clone());
        let mut scanner = Scanner::from_source(
            name,
            text,
            positions.clone(),
            Arc::new(syntax.clone()),
            errors.clone(),
        );
        syntax.read_entries(&mut scanner, None);
        syntax
    }

    /// Load a table from a description file.
    pub fn from_file(
        path: impl AsRef<Path>,
        positions: &Positions,
        errors: &Errors,
    ) -> io::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(Syntax::from_source(
            path.to_string_lossy().into_owned(),
            text,
            positions,
            errors,
        ))
    }

    /// The packaged default syntax.
    pub fn built_in(positions: &Positions, errors: &Errors) -> Arc<Self> {
        Arc::new(Syntax::from_source(
            "lark.syntax",
            DEFAULT_SYNTAX,
            positions,
            errors,
        ))
    }

    /// Read description entries from an already-open scanner, stopping at
    /// end of input or at the closing delimiter of the enclosing region.
    /// Used both by the file loaders and by the in-source `syntax`
    /// directive.
    pub fn read_entries(&mut self, scanner: &mut Scanner, until: Option<&str>) {
        let mut section: Option<EntryKind> = None;
        let mut priority: i32 = self.default_priority;
        let mut opener: Option<LarkString> = None;
        let mut child_table: Option<Arc<Syntax>> = None;

        loop {
            let token = scanner.next_token();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Newline | TokenKind::Indent => continue,
                TokenKind::Unindent | TokenKind::Close => {
                    let matched = match until {
                        Some(closing) => {
                            token.kind == TokenKind::Unindent || token.name() == Some(closing)
                        }
                        None => false,
                    };
                    if matched {
                        break;
                    }
                    continue;
                }
                TokenKind::Integer => {
                    if let Some(Tree::Natural { value, .. }) =
                        token.value.as_deref().map(|node| &node.kind)
                    {
                        priority = *value as i32;
                    }
                    continue;
                }
                TokenKind::Name => {
                    let spelling = token.name().unwrap_or_default().to_string();
                    if let Some(comment_closing) = self.comment_closing(&spelling) {
                        let comment_closing = comment_closing.to_string();
                        scanner.skip_to(&comment_closing);
                        continue;
                    }
                    match spelling.as_str() {
                        "infix" => {
                            section = Some(EntryKind::Infix);
                            opener = None;
                            continue;
                        }
                        "prefix" => {
                            section = Some(EntryKind::Prefix);
                            opener = None;
                            continue;
                        }
                        "postfix" => {
                            section = Some(EntryKind::Postfix);
                            opener = None;
                            continue;
                        }
                        "comment" => {
                            section = Some(EntryKind::Comment);
                            opener = None;
                            continue;
                        }
                        "text" => {
                            section = Some(EntryKind::Text);
                            opener = None;
                            continue;
                        }
                        "block" => {
                            section = Some(EntryKind::Block);
                            opener = None;
                            continue;
                        }
                        "syntax" => {
                            section = Some(EntryKind::Child);
                            opener = None;
                            child_table = None;
                            continue;
                        }
                        "statement" => {
                            self.statement_priority = priority;
                            continue;
                        }
                        "function" => {
                            self.function_priority = priority;
                            continue;
                        }
                        "default" => {
                            self.default_priority = priority;
                            continue;
                        }
                        _ => {}
                    }
                    let spelling = special_spelling(&spelling);
                    self.entry(
                        spelling,
                        section,
                        priority,
                        &mut opener,
                        &mut child_table,
                        scanner,
                        &token,
                    );
                }
                TokenKind::Symbol | TokenKind::Open => {
                    let spelling: LarkString = token.name().unwrap_or_default().into();
                    if let Some(comment_closing) = self.comment_closing(&spelling) {
                        let comment_closing = comment_closing.to_string();
                        scanner.skip_to(&comment_closing);
                        continue;
                    }
                    self.entry(
                        spelling,
                        section,
                        priority,
                        &mut opener,
                        &mut child_table,
                        scanner,
                        &token,
                    );
                }
                TokenKind::Text | TokenKind::Character => {
                    let raw = token
                        .value
                        .as_deref()
                        .and_then(|node| node.text_value())
                        .unwrap_or_default()
                        .to_string();
                    if section == Some(EntryKind::Child) && child_table.is_none() && opener.is_none()
                    {
                        // First quoted item of a SYNTAX entry names the file.
                        match Syntax::from_file(&raw, scanner.positions(), scanner.errors()) {
                            Ok(table) => child_table = Some(Arc::new(table)),
                            Err(_) => {
                                scanner.errors().record(&ConfigError::UnreadableFile {
                                    path: raw,
                                    position: token.position,
                                });
                                child_table = Some(Arc::new(Syntax::new()));
                            }
                        }
                        continue;
                    }
                    self.entry(
                        normalize_name(&raw),
                        section,
                        priority,
                        &mut opener,
                        &mut child_table,
                        scanner,
                        &token,
                    );
                }
                _ => {
                    scanner.errors().record(&ConfigError::MalformedEntry {
                        found: token.to_string(),
                        position: token.position,
                    });
                }
            }
            // The description is tokenized with the table being built, so
            // push the updated table back into the scanner.
            scanner.set_syntax(Arc::new(self.clone()));
        }

        debug!(
            file = self.filename.as_deref().unwrap_or("<inline>"),
            infixes = self.infixes.len(),
            prefixes = self.prefixes.len(),
            postfixes = self.postfixes.len(),
            blocks = self.blocks.len(),
            "syntax loaded"
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn entry(
        &mut self,
        spelling: LarkString,
        section: Option<EntryKind>,
        priority: i32,
        opener: &mut Option<LarkString>,
        child_table: &mut Option<Arc<Syntax>>,
        scanner: &mut Scanner,
        token: &Token,
    ) {
        let Some(section) = section else {
            scanner.errors().record(&ConfigError::MalformedEntry {
                found: token.to_string(),
                position: token.position,
            });
            return;
        };
        match section {
            EntryKind::Infix => self.add_infix(&spelling, priority),
            EntryKind::Prefix => self.add_prefix(&spelling, priority),
            EntryKind::Postfix => self.add_postfix(&spelling, priority),
            EntryKind::Comment | EntryKind::Text | EntryKind::Block | EntryKind::Child => {
                match opener.take() {
                    None => *opener = Some(spelling),
                    Some(opening) => match section {
                        EntryKind::Comment => self.add_comment(&opening, &spelling),
                        EntryKind::Text => self.add_text(&opening, &spelling),
                        EntryKind::Block => self.add_block(&opening, &spelling, priority),
                        EntryKind::Child => {
                            let Some(table) = child_table.clone() else {
                                scanner.errors().record(&ConfigError::MalformedEntry {
                                    found: token.to_string(),
                                    position: token.position,
                                });
                                return;
                            };
                            self.add_child(&opening, &spelling, table);
                        }
                        _ => unreachable!(),
                    },
                }
            }
        }
    }

    pub fn add_infix(&mut self, name: &str, priority: i32) {
        insert_priority(&mut self.infixes, name, priority);
        insert_name(&mut self.known, name);
    }

    pub fn add_prefix(&mut self, name: &str, priority: i32) {
        insert_priority(&mut self.prefixes, name, priority);
        insert_name(&mut self.known, name);
    }

    pub fn add_postfix(&mut self, name: &str, priority: i32) {
        insert_priority(&mut self.postfixes, name, priority);
        insert_name(&mut self.known, name);
    }

    pub fn add_comment(&mut self, opening: &str, closing: &str) {
        insert_pair(&mut self.comments, opening, closing);
        insert_name(&mut self.known, opening);
        insert_name(&mut self.known, closing);
    }

    pub fn add_text(&mut self, opening: &str, closing: &str) {
        insert_pair(&mut self.texts, opening, closing);
        insert_name(&mut self.known, opening);
        insert_name(&mut self.known, closing);
    }

    /// Register a block pair. The opening also receives the current
    /// priority as its infix priority, which is what the parser uses when
    /// it recurses into the block.
    pub fn add_block(&mut self, opening: &str, closing: &str, priority: i32) {
        insert_pair(&mut self.blocks, opening, closing);
        insert_name(&mut self.block_closings, closing);
        insert_priority(&mut self.infixes, opening, priority);
        insert_name(&mut self.known, opening);
        insert_name(&mut self.known, closing);
    }

    pub fn add_child(&mut self, opening: &str, closing: &str, table: Arc<Syntax>) {
        let opening_key: LarkString = opening.into();
        match self
            .children
            .binary_search_by(|(key, _, _)| key.as_str().cmp(opening))
        {
            Ok(index) => self.children[index] = (opening_key, closing.into(), table),
            Err(index) => self
                .children
                .insert(index, (opening_key, closing.into(), table)),
        }
        insert_name(&mut self.known, opening);
        insert_name(&mut self.known, closing);
    }

    pub fn infix_priority(&self, name: &str) -> Option<i32> {
        lookup_priority(&self.infixes, name)
    }

    pub fn prefix_priority(&self, name: &str) -> Option<i32> {
        lookup_priority(&self.prefixes, name)
    }

    pub fn postfix_priority(&self, name: &str) -> Option<i32> {
        lookup_priority(&self.postfixes, name)
    }

    /// True for a known operator spelling, or for a strict prefix of one.
    /// The strict-prefix rule is what lets the scanner extend symbols
    /// greedily.
    pub fn is_operator(&self, name: &str) -> bool {
        match self
            .known
            .binary_search_by(|key| key.as_str().cmp(name))
        {
            Ok(_) => true,
            Err(index) => self
                .known
                .get(index)
                .is_some_and(|key| key.starts_with(name)),
        }
    }

    pub fn is_block_opening(&self, name: &str) -> bool {
        lookup_pair(&self.blocks, name).is_some()
    }

    pub fn is_block_closing(&self, name: &str) -> bool {
        self.block_closings
            .binary_search_by(|key| key.as_str().cmp(name))
            .is_ok()
    }

    /// The closing delimiter of a block opening.
    pub fn block_closing(&self, opening: &str) -> Option<&str> {
        lookup_pair(&self.blocks, opening)
    }

    /// The closing delimiter of a comment opening.
    pub fn comment_closing(&self, opening: &str) -> Option<&str> {
        lookup_pair(&self.comments, opening)
    }

    /// The closing delimiter of a long-text opening.
    pub fn text_closing(&self, opening: &str) -> Option<&str> {
        lookup_pair(&self.texts, opening)
    }

    /// The closing delimiter and table of a child-syntax opening.
    pub fn child_syntax(&self, opening: &str) -> Option<(&str, &Arc<Syntax>)> {
        self.children
            .binary_search_by(|(key, _, _)| key.as_str().cmp(opening))
            .ok()
            .map(|index| {
                let (_, closing, table) = &self.children[index];
                (closing.as_str(), table)
            })
    }

    /// A small fixed table for unit tests, spelled out instead of loaded
    /// so that scanner tests do not depend on the loader.
    pub fn for_tests() -> Self {
        let mut syntax = Syntax::new();
        syntax.statement_priority = 100;
        syntax.function_priority = 20;
        syntax.add_infix(NEWLINE_NAME, 10);
        syntax.add_infix(";", 20);
        syntax.add_infix(",", 30);
        syntax.add_infix("else", 35);
        syntax.add_infix("=", 200);
        syntax.add_infix("..", 300);
        syntax.add_infix("^", 311);
        syntax.add_infix("+", 310);
        syntax.add_infix("-", 310);
        syntax.add_infix("*", 320);
        syntax.add_infix("/", 320);
        syntax.add_prefix("if", 40);
        syntax.add_prefix("not", 400);
        syntax.add_prefix("-", 410);
        syntax.add_postfix("%", 420);
        syntax.add_block(INDENT_NAME, UNINDENT_NAME, 5);
        syntax.add_block("(", ")", 10);
        syntax.add_block("[", "]", 10);
        syntax.add_block("{", "}", 10);
        syntax.add_comment("//", NEWLINE_NAME);
        syntax.add_comment("/*", "*/");
        syntax.add_text("<<", ">>");
        syntax
    }
}

impl Default for Syntax {
    fn default() -> Self {
        Syntax::new()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum EntryKind {
    Infix,
    Prefix,
    Postfix,
    Comment,
    Text,
    Block,
    Child,
}

/// `NEWLINE`, `INDENT` and `UNINDENT` in a description stand for the
/// synthetic token names.
fn special_spelling(spelling: &str) -> LarkString {
    match spelling {
        "newline" => NEWLINE_NAME.into(),
        "indent" => INDENT_NAME.into(),
        "unindent" => UNINDENT_NAME.into(),
        _ => spelling.into(),
    }
}

fn insert_name(names: &mut Vec<LarkString>, name: &str) {
    if let Err(index) = names.binary_search_by(|key| key.as_str().cmp(name)) {
        names.insert(index, name.into());
    }
}

fn insert_priority(map: &mut Vec<(LarkString, i32)>, name: &str, priority: i32) {
    match map.binary_search_by(|(key, _)| key.as_str().cmp(name)) {
        Ok(index) => map[index].1 = priority,
        Err(index) => map.insert(index, (name.into(), priority)),
    }
}

fn insert_pair(map: &mut Vec<(LarkString, LarkString)>, opening: &str, closing: &str) {
    match map.binary_search_by(|(key, _)| key.as_str().cmp(opening)) {
        Ok(index) => map[index].1 = closing.into(),
        Err(index) => map.insert(index, (opening.into(), closing.into())),
    }
}

fn lookup_priority(map: &[(LarkString, i32)], name: &str) -> Option<i32> {
    map.binary_search_by(|(key, _)| key.as_str().cmp(name))
        .ok()
        .map(|index| map[index].1)
}

fn lookup_pair<'a>(map: &'a [(LarkString, LarkString)], opening: &str) -> Option<&'a str> {
    map.binary_search_by(|(key, _)| key.as_str().cmp(opening))
        .ok()
        .map(|index| map[index].1.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(description: &str) -> Syntax {
        let positions = Positions::new();
        let errors = Errors::silent(positions.clone());
        let syntax = Syntax::from_source("test.syntax", description, &positions, &errors);
        assert!(errors.is_empty(), "load reported {:?}", errors.diagnostics());
        syntax
    }

    #[test]
    fn sections_assign_priorities() {
        let syntax = load("INFIX\n 300 '+' '-'\n 400 '*'\nPREFIX\n 500 not\n");

        assert_eq!(syntax.infix_priority("+"), Some(300));
        assert_eq!(syntax.infix_priority("-"), Some(300));
        assert_eq!(syntax.infix_priority("*"), Some(400));
        assert_eq!(syntax.prefix_priority("not"), Some(500));
        assert_eq!(syntax.infix_priority("not"), None);
    }

    #[test]
    fn delimiters_pair_up() {
        let syntax = load("BLOCK\n 10 '(' ')'\nCOMMENT\n \"//\" NEWLINE\nTEXT\n \"<<\" \">>\"\n");

        assert_eq!(syntax.block_closing("("), Some(")"));
        assert!(syntax.is_block_opening("("));
        assert!(syntax.is_block_closing(")"));
        assert_eq!(syntax.comment_closing("//"), Some("\n"));
        assert_eq!(syntax.text_closing("<<"), Some(">>"));
        assert_eq!(syntax.infix_priority("("), Some(10));
    }

    #[test]
    fn distinguished_priorities_use_the_current_priority() {
        let syntax = load("INFIX\n 90 STATEMENT\nPREFIX\n 25 FUNCTION\n 0 DEFAULT\n");

        assert_eq!(syntax.statement_priority, 90);
        assert_eq!(syntax.function_priority, 25);
        assert_eq!(syntax.default_priority, 0);
    }

    #[test]
    fn operator_prefixes_are_recognized() {
        let mut syntax = Syntax::new();
        syntax.add_infix("<=", 240);

        assert!(syntax.is_operator("<="));
        assert!(syntax.is_operator("<"));
        assert!(!syntax.is_operator(">"));
        assert!(!syntax.is_operator("<=="));
    }

    #[test]
    fn the_packaged_description_loads_cleanly() {
        let syntax = load(DEFAULT_SYNTAX);

        assert_eq!(syntax.statement_priority, 100);
        assert_eq!(syntax.function_priority, 20);
        assert_eq!(syntax.infix_priority(NEWLINE_NAME), Some(10));
        assert_eq!(syntax.infix_priority(","), Some(30));
        assert_eq!(syntax.prefix_priority("-"), Some(410));
        assert_eq!(syntax.postfix_priority("%"), Some(420));
        assert_eq!(syntax.block_closing(INDENT_NAME), Some(UNINDENT_NAME));
        assert_eq!(syntax.block_closing("{"), Some("}"));
        assert_eq!(syntax.comment_closing("/*"), Some("*/"));
        assert_eq!(syntax.text_closing("<<"), Some(">>"));
    }

    #[test]
    fn spellings_are_normalized_for_lookup() {
        let syntax = load("INFIX\n 250 And_Then\n");

        assert_eq!(syntax.infix_priority("andthen"), Some(250));
        assert_eq!(syntax.infix_priority("And_Then"), None);
    }
}
