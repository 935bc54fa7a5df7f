//! Rendering trees back to source form.
//!
//! Every variant has a built-in canonical form. A style sheet can replace
//! the form of any variant: it maps a format key (a variant name such as
//! `infix`, or a keyword such as `left`, `opcode`, `space`) to a sequence
//! of items, each a quoted literal or another key. Styles are loaded from
//! the same token stream format as everything else.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::errors::Errors;
use crate::position::Positions;
use crate::scanner::Scanner;
use crate::syntax::{ConfigError, Syntax, INDENT_NAME, NEWLINE_NAME};
use crate::token::TokenKind;
use crate::tree::{name_is_operator, LarkString, Node, Tree};

/// The packaged default style description.
pub const DEFAULT_STYLE: &str = include_str!("../syntax/lark.style");

/// One item in a style entry.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleItem {
    Literal(String),
    Key(LarkString),
}

/// A loaded style sheet: format key to item sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
    entries: Vec<(LarkString, Vec<StyleItem>)>,
}

impl Style {
    pub fn new() -> Self {
        Style::default()
    }

    pub fn add(&mut self, key: &str, items: Vec<StyleItem>) {
        match self
            .entries
            .binary_search_by(|(entry, _)| entry.as_str().cmp(key))
        {
            Ok(index) => self.entries[index].1 = items,
            Err(index) => self.entries.insert(index, (key.into(), items)),
        }
    }

    pub fn items(&self, key: &str) -> Option<&[StyleItem]> {
        self.entries
            .binary_search_by(|(entry, _)| entry.as_str().cmp(key))
            .ok()
            .map(|index| self.entries[index].1.as_slice())
    }

    /// Load a style sheet from text. Entries have the form
    /// `key = item item …` and end at a newline or unindent.
    pub fn from_source(
        name: impl Into<String>,
        text: impl Into<String>,
        positions: &Positions,
        errors: &Errors,
    ) -> Self {
        let mut style = Style::new();
        let mut scanner = Scanner::from_source(
            name,
            text,
            positions.clone(),
            Arc::new(Syntax::new()),
            errors.clone(),
        );

        let mut key: Option<LarkString> = None;
        let mut items: Vec<StyleItem> = Vec::new();
        let mut saw_equals = false;
        loop {
            let token = scanner.next_token();
            match token.kind {
                TokenKind::Eof | TokenKind::Newline | TokenKind::Unindent => {
                    if let Some(key) = key.take() {
                        style.add(&key, std::mem::take(&mut items));
                    }
                    saw_equals = false;
                    if token.kind == TokenKind::Eof {
                        break;
                    }
                }
                TokenKind::Indent => {}
                TokenKind::Symbol if token.name() == Some("=") && key.is_some() => {
                    if saw_equals {
                        errors.record(&ConfigError::DuplicateEquals {
                            position: token.position,
                        });
                    }
                    saw_equals = true;
                }
                TokenKind::Text | TokenKind::Character => {
                    let literal = token
                        .value
                        .as_deref()
                        .and_then(|node| node.text_value())
                        .unwrap_or_default()
                        .to_string();
                    if key.is_none() {
                        key = Some(literal.as_str().into());
                    } else {
                        items.push(StyleItem::Literal(literal));
                    }
                }
                TokenKind::Name | TokenKind::Symbol => {
                    let word: LarkString = token.name().unwrap_or_default().into();
                    if key.is_none() {
                        key = Some(word);
                    } else {
                        items.push(StyleItem::Key(word));
                    }
                }
                _ => {
                    errors.record(&ConfigError::MalformedEntry {
                        found: token.to_string(),
                        position: token.position,
                    });
                }
            }
        }
        style
    }

    pub fn from_file(
        path: impl AsRef<Path>,
        positions: &Positions,
        errors: &Errors,
    ) -> io::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(Style::from_source(
            path.to_string_lossy().into_owned(),
            text,
            positions,
            errors,
        ))
    }
}

/// Tree walker writing through a pluggable sink.
pub struct Renderer<'w> {
    out: &'w mut dyn Write,
    style: Style,
    indent: usize,
    pending_newline: bool,
    pending_space: bool,
    pending_separator: bool,
    last_char: Option<char>,
}

impl<'w> Renderer<'w> {
    pub fn new(out: &'w mut dyn Write, style: Style) -> Self {
        Renderer {
            out,
            style,
            indent: 0,
            pending_newline: false,
            pending_space: false,
            pending_separator: false,
            last_char: None,
        }
    }

    /// A renderer using only the built-in forms.
    pub fn unstyled(out: &'w mut dyn Write) -> Self {
        Renderer::new(out, Style::new())
    }

    /// Render a whole tree through the sink.
    pub fn render(&mut self, node: &Node) -> io::Result<()> {
        self.node(node)?;
        if self.pending_newline {
            self.pending_newline = false;
            self.write_char('\n')?;
        }
        self.pending_space = false;
        self.pending_separator = false;
        Ok(())
    }

    fn node(&mut self, node: &Node) -> io::Result<()> {
        if let Some(items) = self.style.items(node.type_name()) {
            let items = items.to_vec();
            return self.items(&items, node);
        }
        self.builtin(node)
    }

    fn items(&mut self, items: &[StyleItem], node: &Node) -> io::Result<()> {
        for item in items {
            match item {
                StyleItem::Literal(text) => self.emit(text)?,
                StyleItem::Key(key) => self.key(key, node)?,
            }
        }
        Ok(())
    }

    fn key(&mut self, key: &str, node: &Node) -> io::Result<()> {
        // A key with its own style entry expands recursively, except for
        // the node's own type name, which would never terminate.
        if key != node.type_name() {
            if let Some(items) = self.style.items(key) {
                let items = items.to_vec();
                return self.items(&items, node);
            }
        }
        match key {
            "self" => self.builtin(node),
            "space" => {
                self.pending_space = true;
                Ok(())
            }
            "separator" => {
                self.pending_separator = true;
                Ok(())
            }
            "cr" | "newline" => {
                self.pending_newline = true;
                Ok(())
            }
            "indent" => {
                self.indent += 1;
                Ok(())
            }
            "unindent" => {
                self.indent = self.indent.saturating_sub(1);
                Ok(())
            }
            "indents" => {
                for _ in 0..self.indent {
                    self.emit("    ")?;
                }
                Ok(())
            }
            "left" => match &node.kind {
                Tree::Prefix { left, .. }
                | Tree::Postfix { left, .. }
                | Tree::Pfix { left, .. }
                | Tree::Infix { left, .. } => self.node(left),
                _ => Ok(()),
            },
            "right" => match &node.kind {
                Tree::Prefix { right, .. }
                | Tree::Postfix { right, .. }
                | Tree::Pfix { right, .. }
                | Tree::Infix { right, .. } => self.node(right),
                _ => Ok(()),
            },
            "opcode" => match &node.kind {
                Tree::Infix { opcode, .. } => self.node(opcode),
                _ => Ok(()),
            },
            "child" => match &node.kind {
                Tree::Block { opening, .. } => {
                    let one_per_line = opening.name_value() == Some(INDENT_NAME);
                    self.block_children(node, one_per_line)
                }
                Tree::LongText { value, .. } => self.emit_raw_text(value),
                _ => Ok(()),
            },
            // Underscored spellings arrive underscore-stripped from the
            // loader's name normalization; accept both.
            "opening" | "block_opening" | "blockopening" => match &node.kind {
                Tree::Block { opening, .. } | Tree::LongText { opening, .. } => {
                    self.delimiter(opening)
                }
                _ => Ok(()),
            },
            "closing" | "block_closing" | "blockclosing" => match &node.kind {
                Tree::Block { closing, .. } | Tree::LongText { closing, .. } => {
                    self.delimiter(closing)
                }
                _ => Ok(()),
            },
            "block_separator" | "blockseparator" => match &node.kind {
                Tree::Block { separator, .. } => match separator {
                    Some(separator) => self.node(separator),
                    None => {
                        self.pending_space = true;
                        Ok(())
                    }
                },
                _ => Ok(()),
            },
            other => self.emit(other),
        }
    }

    /// The built-in canonical form of each variant.
    fn builtin(&mut self, node: &Node) -> io::Result<()> {
        match &node.kind {
            Tree::Natural { value, base } => match base {
                Some(base) => {
                    let digits = to_base(*value, *base);
                    self.emit(&format!("{base}#{digits}"))
                }
                None => self.emit(&value.to_string()),
            },
            Tree::Integer { value, base } => {
                if *value < 0 {
                    self.emit("-")?;
                }
                let magnitude = value.unsigned_abs();
                match base {
                    Some(base) => {
                        let digits = to_base(magnitude, *base);
                        self.emit(&format!("{base}#{digits}"))
                    }
                    None => self.emit(&magnitude.to_string()),
                }
            }
            Tree::Real { value, base } => {
                let _ = base;
                let mut text = value.to_string();
                if !text.contains('.') && !text.contains('e') && !text.contains("inf") {
                    text.push_str(".0");
                }
                self.emit(&text)
            }
            Tree::Text { value, quote } => {
                let quote = *quote;
                let mut text = String::new();
                text.push(quote);
                for c in value.chars() {
                    text.push(c);
                    if c == quote {
                        text.push(quote);
                    }
                }
                text.push(quote);
                self.emit(&text)
            }
            Tree::Name { value } => self.emit(&value.clone()),
            Tree::Blob { data, base } => {
                let base = *base;
                let mut text = String::from("$");
                match base {
                    64 => {
                        text.push_str("64#");
                        text.push_str(&to_base64(data));
                    }
                    2 | 4 | 8 => {
                        text.push_str(&format!("{base}#"));
                        let bits_per_digit = base.trailing_zeros();
                        for byte in data {
                            let byte = u32::from(*byte);
                            let mut shift = 8;
                            while shift >= bits_per_digit {
                                shift -= bits_per_digit;
                                let digit = (byte >> shift) & ((1 << bits_per_digit) - 1);
                                text.push(digit_char(digit));
                            }
                        }
                    }
                    _ => {
                        for byte in data {
                            text.push_str(&format!("{byte:02X}"));
                        }
                    }
                }
                text.push('$');
                self.emit(&text)
            }
            Tree::LongText {
                value,
                opening,
                closing,
            } => {
                self.delimiter(opening)?;
                self.emit_raw_text(value)?;
                self.delimiter(closing)
            }
            Tree::Prefix { left, right } => {
                self.node(left)?;
                if left.name_value().is_some_and(|name| !name_is_operator(name)) {
                    self.pending_space = true;
                } else {
                    self.pending_separator = true;
                }
                self.node(right)
            }
            Tree::Postfix { left, right } => {
                self.node(left)?;
                if right.name_value().is_some_and(|name| !name_is_operator(name)) {
                    self.pending_space = true;
                } else {
                    self.pending_separator = true;
                }
                self.node(right)
            }
            Tree::Pfix { left, right } => {
                self.node(left)?;
                self.pending_space = true;
                self.node(right)
            }
            Tree::Infix {
                opcode,
                left,
                right,
            } => {
                self.node(left)?;
                if opcode.name_value() == Some(NEWLINE_NAME) {
                    self.pending_newline = true;
                } else {
                    self.pending_space = true;
                    self.node(opcode)?;
                    self.pending_space = true;
                }
                self.node(right)
            }
            Tree::Block { .. } => self.block(node),
        }
    }

    fn block(&mut self, node: &Node) -> io::Result<()> {
        let Tree::Block {
            opening, closing, ..
        } = &node.kind
        else {
            return Ok(());
        };
        let indented = opening.name_value() == Some(INDENT_NAME);
        if indented {
            self.indent += 1;
            self.pending_newline = true;
            self.block_children(node, true)?;
            self.indent = self.indent.saturating_sub(1);
            self.pending_newline = true;
            Ok(())
        } else {
            self.delimiter(opening)?;
            self.block_children(node, false)?;
            self.delimiter(closing)
        }
    }

    /// Render a block's children. Indent blocks place one child per
    /// line; other blocks join children with their separator, or with a
    /// single space when none was recorded.
    fn block_children(&mut self, node: &Node, one_per_line: bool) -> io::Result<()> {
        let Tree::Block {
            separator,
            children,
            ..
        } = &node.kind
        else {
            return Ok(());
        };
        for (index, child) in children.iter().enumerate() {
            if index > 0 {
                if one_per_line {
                    self.pending_newline = true;
                } else {
                    match separator {
                        Some(separator) if separator.name_value() == Some(NEWLINE_NAME) => {
                            self.pending_newline = true;
                        }
                        Some(separator) => {
                            self.node(separator)?;
                            self.pending_space = true;
                        }
                        None => self.pending_space = true,
                    }
                }
            }
            self.node(child)?;
        }
        Ok(())
    }

    /// Render a delimiter name; the synthetic indent names print nothing.
    fn delimiter(&mut self, name: &Node) -> io::Result<()> {
        match name.name_value() {
            Some("\t") | Some("\u{8}") | None => Ok(()),
            Some(text) => {
                let text = text.to_string();
                self.emit(&text)
            }
        }
    }

    /// Long text content is emitted verbatim, bypassing separators.
    fn emit_raw_text(&mut self, value: &Node) -> io::Result<()> {
        if let Some(text) = value.text_value() {
            let text = text.to_string();
            self.emit(&text)?;
        }
        Ok(())
    }

    /// Write text through the pending-separator state machine.
    fn emit(&mut self, text: &str) -> io::Result<()> {
        for c in text.chars() {
            self.emit_char(c)?;
        }
        Ok(())
    }

    fn emit_char(&mut self, c: char) -> io::Result<()> {
        if self.pending_newline {
            self.pending_newline = false;
            self.pending_space = false;
            self.pending_separator = false;
            self.write_char('\n')?;
            for _ in 0..self.indent {
                self.write_str("    ")?;
            }
        } else if self.pending_space {
            self.pending_space = false;
            self.pending_separator = false;
            if self.last_char.is_some() {
                self.write_char(' ')?;
            }
        } else if self.pending_separator {
            self.pending_separator = false;
            // A separator only materializes when the adjacent characters
            // would otherwise fuse into one token.
            let fuses = match self.last_char {
                Some(last) => {
                    (last.is_alphanumeric() || last == '_')
                        && (c.is_alphanumeric() || c == '_')
                        || last.is_ascii_punctuation() && c.is_ascii_punctuation()
                }
                None => false,
            };
            if fuses {
                self.write_char(' ')?;
            }
        }
        self.write_char(c)
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.last_char = text.chars().last().or(self.last_char);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> io::Result<()> {
        let mut buffer = [0u8; 4];
        self.out.write_all(c.encode_utf8(&mut buffer).as_bytes())?;
        self.last_char = Some(c);
        Ok(())
    }
}

fn digit_char(digit: u32) -> char {
    char::from_digit(digit, 36)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('?')
}

fn to_base(mut value: u64, base: u8) -> String {
    let base = base.clamp(2, 36) as u64;
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(digit_char((value % base) as u32));
        value /= base;
    }
    digits.iter().rev().collect()
}

const BASE64_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn to_base64(data: &[u8]) -> String {
    let mut out = String::new();
    for chunk in data.chunks(3) {
        let mut word = 0u32;
        for (index, byte) in chunk.iter().enumerate() {
            word |= (*byte as u32) << (16 - 8 * index);
        }
        for index in 0..4 {
            if index <= chunk.len() {
                let digit = (word >> (18 - 6 * index)) & 0x3F;
                out.push(BASE64_ALPHABET[digit as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourcePos;

    fn pos() -> SourcePos {
        SourcePos(0)
    }

    fn rendered(node: &Node) -> String {
        node.text()
    }

    #[test]
    fn infix_renders_with_spaces() {
        let tree = Node::infix(
            Node::name("+", pos()),
            Node::natural(42, pos()),
            Node::natural(13, pos()),
            pos(),
        );

        assert_eq!(rendered(&tree), "42 + 13");
    }

    #[test]
    fn based_natural_renders_with_base() {
        assert_eq!(rendered(&Node::based_natural(65280, 16, pos())), "16#FF00");
    }

    #[test]
    fn negative_integer_renders_with_sign() {
        assert_eq!(rendered(&Node::integer(-1, pos())), "-1");
    }

    #[test]
    fn real_always_shows_a_fraction() {
        assert_eq!(rendered(&Node::real(2.0, pos())), "2.0");
        assert_eq!(rendered(&Node::real(1.5, pos())), "1.5");
    }

    #[test]
    fn text_doubles_embedded_quotes() {
        assert_eq!(
            rendered(&Node::text("He said \"hi", pos())),
            "\"He said \"\"hi\""
        );
        assert_eq!(rendered(&Node::character("a", pos())), "'a'");
    }

    #[test]
    fn blob_renders_as_hex() {
        assert_eq!(
            rendered(&Node::blob(vec![0xFF, 0x00], 16, pos())),
            "$FF00$"
        );
    }

    #[test]
    fn base64_blob_round_trips_alphabet() {
        assert_eq!(
            rendered(&Node::blob(b"Man".to_vec(), 64, pos())),
            "$64#TWFu$"
        );
    }

    #[test]
    fn prefix_spacing_depends_on_operator_shape() {
        let word = Node::prefix(Node::name("write", pos()), Node::name("x", pos()), pos());
        assert_eq!(rendered(&word), "write x");

        let symbol = Node::prefix(Node::name("-", pos()), Node::name("x", pos()), pos());
        assert_eq!(rendered(&symbol), "-x");
    }

    #[test]
    fn block_renders_children_with_separator() {
        let block = Node::block(
            Node::name("(", pos()),
            Node::name(")", pos()),
            Some(Node::name(",", pos())),
            [
                Node::natural(1, pos()),
                Node::natural(2, pos()),
                Node::natural(3, pos()),
            ],
            pos(),
        );

        assert_eq!(rendered(&block), "(1, 2, 3)");
    }

    #[test]
    fn block_without_separator_renders_single_space() {
        let block = Node::block(
            Node::name("{", pos()),
            Node::name("}", pos()),
            None,
            [Node::name("a", pos()), Node::name("b", pos())],
            pos(),
        );

        assert_eq!(rendered(&block), "{a b}");
    }

    #[test]
    fn indent_block_renders_indented_lines() {
        let block = Node::block(
            Node::name("\t", pos()),
            Node::name("\u{8}", pos()),
            Some(Node::name("\n", pos())),
            [Node::name("b", pos()), Node::name("c", pos())],
            pos(),
        );
        let tree = Node::prefix(Node::name("loop", pos()), block, pos());

        assert_eq!(rendered(&tree), "loop\n    b\n    c\n");
    }

    #[test]
    fn style_overrides_variant_rendering() {
        let positions = Positions::new();
        let errors = Errors::silent(positions.clone());
        let style = Style::from_source(
            "test.style",
            "infix = \"[\" left \"|\" opcode \"|\" right \"]\"",
            &positions,
            &errors,
        );
        let tree = Node::infix(
            Node::name("+", pos()),
            Node::natural(1, pos()),
            Node::natural(2, pos()),
            pos(),
        );

        let mut out = Vec::new();
        Renderer::new(&mut out, style).render(&tree).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "[1|+|2]");
        assert!(errors.is_empty());
    }

    #[test]
    fn duplicate_equals_is_a_configuration_error() {
        let positions = Positions::new();
        let errors = Errors::silent(positions.clone());
        let _ = Style::from_source("bad.style", "infix = left = right", &positions, &errors);

        assert_eq!(errors.count(), 1);
    }

    #[test]
    fn long_text_renders_delimited() {
        let tree = Node::long_text(
            Node::text("Hello", pos()),
            Node::name("<<", pos()),
            Node::name(">>", pos()),
        );

        assert_eq!(rendered(&tree), "<<Hello>>");
    }
}
