//! The scanner: bytes in, tokens out.
//!
//! Five families of tokens are built in: numbers (with based literals),
//! names, symbols, quoted text and blobs. Indentation is significant and
//! surfaces as synthetic INDENT / UNINDENT / NEWLINE tokens. What counts
//! as a comment, a long text or a block delimiter is not decided here: the
//! parser drives those decisions through the syntax table and the
//! [`Scanner::skip_to`] helper.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use tracing::trace;

use crate::errors::{AnnotatedError, Errors};
use crate::position::{Positions, SourcePos};
use crate::syntax::{Syntax, UNINDENT_NAME};
use crate::token::{Token, TokenKind};
use crate::tree::{is_valid_name, normalize_name, Node};

/// Lexical errors. They are recorded in the error sink and scanning
/// continues with a best-effort token.
#[derive(Clone, Debug, PartialEq)]
pub enum ScanError {
    InvalidBase {
        base: u64,
        position: SourcePos,
    },
    BlobBase {
        base: u64,
        position: SourcePos,
    },
    NumberIsBlob {
        position: SourcePos,
    },
    DoubledUnderscore {
        position: SourcePos,
    },
    MixedIndentation {
        position: SourcePos,
    },
    UnindentMismatch {
        column: u32,
        indent: u32,
        position: SourcePos,
    },
    UnterminatedText {
        position: SourcePos,
    },
    UnterminatedComment {
        closing: String,
        position: SourcePos,
    },
    TruncatedBlob {
        position: SourcePos,
    },
    MalformedName {
        name: String,
        position: SourcePos,
    },
    InvalidUtf8 {
        position: SourcePos,
    },
    StrayCharacter {
        byte: u8,
        position: SourcePos,
    },
}

impl AnnotatedError for ScanError {
    fn title() -> &'static str {
        "Lexical error"
    }

    fn description(&self) -> &'static str {
        match self {
            ScanError::InvalidBase { .. } => "Invalid numeric base",
            ScanError::BlobBase { .. } => "Invalid blob base",
            ScanError::NumberIsBlob { .. } => "Base 64 is reserved for blobs",
            ScanError::DoubledUnderscore { .. } => "Underscores must be single",
            ScanError::MixedIndentation { .. } => "Mixed tabs and spaces in indentation",
            ScanError::UnindentMismatch { .. } => "Unindent does not match any indentation level",
            ScanError::UnterminatedText { .. } => "Unterminated text",
            ScanError::UnterminatedComment { .. } => "Unterminated comment",
            ScanError::TruncatedBlob { .. } => "Blob digits do not fill whole bytes",
            ScanError::MalformedName { .. } => "Malformed name",
            ScanError::InvalidUtf8 { .. } => "Invalid UTF-8 sequence",
            ScanError::StrayCharacter { .. } => "Stray character",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ScanError::InvalidBase { base, .. } => {
                Some(format!("base {base} is not in 2..36 or 64"))
            }
            ScanError::BlobBase { base, .. } => {
                Some(format!("blob base {base} is not 2, 4, 8, 16 or 64"))
            }
            ScanError::UnindentMismatch { column, indent, .. } => {
                Some(format!("column {column} does not match indentation {indent}"))
            }
            ScanError::UnterminatedComment { closing, .. } => {
                Some(format!("expected {closing:?} before end of input"))
            }
            ScanError::MalformedName { name, .. } => Some(format!("{name:?}")),
            ScanError::StrayCharacter { byte, .. } => Some(format!("byte {byte:#04x}")),
            _ => None,
        }
    }

    fn position(&self) -> SourcePos {
        match self {
            ScanError::InvalidBase { position, .. }
            | ScanError::BlobBase { position, .. }
            | ScanError::NumberIsBlob { position }
            | ScanError::DoubledUnderscore { position }
            | ScanError::MixedIndentation { position }
            | ScanError::UnindentMismatch { position, .. }
            | ScanError::UnterminatedText { position }
            | ScanError::UnterminatedComment { position, .. }
            | ScanError::TruncatedBlob { position }
            | ScanError::MalformedName { position, .. }
            | ScanError::InvalidUtf8 { position }
            | ScanError::StrayCharacter { position, .. } => *position,
        }
    }
}

/// The scanner state for one source.
pub struct Scanner {
    text: Vec<u8>,
    offset: usize,
    start: SourcePos,
    positions: Positions,
    syntax: Arc<Syntax>,
    errors: Errors,
    column: u32,
    indent: u32,
    indents: Vec<u32>,
    pending_unindents: u32,
    indent_char: u8,
    checking_indent: bool,
    setting_indent: bool,
    had_space_before: bool,
    had_space_after: bool,
    at_bof: bool,
    at_eof: bool,
}

impl Scanner {
    /// Scan an in-memory source, registering it with the position registry.
    pub fn from_source(
        name: impl Into<String>,
        text: impl Into<String>,
        positions: Positions,
        syntax: Arc<Syntax>,
        errors: Errors,
    ) -> Self {
        let text = text.into();
        let start = positions.open_buffer(name, text.clone());
        Scanner {
            text: text.into_bytes(),
            offset: 0,
            start,
            positions,
            syntax,
            errors,
            column: 0,
            indent: 0,
            indents: Vec::new(),
            pending_unindents: 0,
            indent_char: 0,
            checking_indent: true,
            setting_indent: false,
            had_space_before: false,
            had_space_after: false,
            at_bof: true,
            at_eof: false,
        }
    }

    /// Scan a file.
    pub fn from_file(
        path: impl AsRef<Path>,
        positions: Positions,
        syntax: Arc<Syntax>,
        errors: Errors,
    ) -> io::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(Scanner::from_source(
            path.to_string_lossy().into_owned(),
            text,
            positions,
            syntax,
            errors,
        ))
    }

    /// Scan from an arbitrary reader. The stream is consumed up front so
    /// that the registry can serve line information afterwards.
    pub fn from_reader(
        name: impl Into<String>,
        reader: &mut dyn Read,
        positions: Positions,
        syntax: Arc<Syntax>,
        errors: Errors,
    ) -> io::Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Scanner::from_source(name, text, positions, syntax, errors))
    }

    pub fn syntax(&self) -> &Arc<Syntax> {
        &self.syntax
    }

    /// Swap the active syntax; used for child-syntax regions and while a
    /// syntax description is being loaded.
    pub fn set_syntax(&mut self, syntax: Arc<Syntax>) {
        self.syntax = syntax;
    }

    pub fn positions(&self) -> &Positions {
        &self.positions
    }

    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Whether whitespace immediately preceded the last token.
    pub fn had_space_before(&self) -> bool {
        self.had_space_before
    }

    /// Whether whitespace immediately follows the last token.
    pub fn had_space_after(&self) -> bool {
        self.had_space_after
    }

    /// Position of the next unconsumed byte.
    pub fn position(&self) -> SourcePos {
        SourcePos(self.start.0 + self.offset as u32)
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.offset).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.text.get(self.offset)?;
        self.offset += 1;
        Some(byte)
    }

    fn unget(&mut self) {
        debug_assert!(self.offset > 0);
        self.offset -= 1;
    }

    /// Called by the parser when an explicit block opens: the next line
    /// start establishes a fresh indentation baseline. Returns the indent
    /// to restore on [`Scanner::close_paren`].
    pub fn open_paren(&mut self) -> u32 {
        self.setting_indent = true;
        self.indent
    }

    /// Restore the indentation baseline saved by [`Scanner::open_paren`].
    pub fn close_paren(&mut self, saved: u32) {
        while let Some(top) = self.indents.last().copied() {
            if top < saved {
                break;
            }
            self.indents.pop();
        }
        self.indent = saved;
        self.setting_indent = false;
        self.pending_unindents = 0;
    }

    fn synthetic(&self, kind: TokenKind, name: &str) -> Token {
        let position = self.position();
        Token::with_value(kind, "", position, Node::name(name, position))
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Token {
        self.had_space_before = false;
        self.had_space_after = false;

        if self.pending_unindents > 0 {
            self.pending_unindents -= 1;
            return self.synthetic(TokenKind::Unindent, UNINDENT_NAME);
        }
        if self.at_eof {
            return Token::eof(self.position());
        }

        loop {
            let Some(byte) = self.next_byte() else {
                if let Some(outer) = self.indents.pop() {
                    self.indent = outer;
                    self.pending_unindents = self.indents.len() as u32;
                    self.indents.clear();
                    return self.synthetic(TokenKind::Unindent, UNINDENT_NAME);
                }
                self.at_eof = true;
                return Token::eof(self.position());
            };

            if self.checking_indent {
                match byte {
                    b' ' | b'\t' => {
                        if self.indent_char == 0 {
                            self.indent_char = byte;
                        } else if self.indent_char != byte {
                            self.errors.record(&ScanError::MixedIndentation {
                                position: self.position(),
                            });
                        }
                        self.column += 1;
                        self.had_space_before = true;
                        continue;
                    }
                    b'\n' => {
                        // Blank line: restart the count.
                        self.column = 0;
                        continue;
                    }
                    _ => {
                        self.unget();
                        self.checking_indent = false;
                        if let Some(token) = self.resolve_indentation() {
                            return token;
                        }
                        continue;
                    }
                }
            }

            match byte {
                b' ' | b'\t' => {
                    self.had_space_before = true;
                }
                b'\n' => {
                    self.checking_indent = true;
                    self.column = 0;
                    self.had_space_before = true;
                }
                _ => {
                    let start = SourcePos(self.start.0 + (self.offset - 1) as u32);
                    self.at_bof = false;
                    let mut token = match byte {
                        b'0'..=b'9' => self.scan_number(byte, start),
                        b'$' => self.scan_blob(start),
                        b'\'' | b'"' => self.scan_text(byte, start),
                        _ if is_name_start(byte) => self.scan_name(byte, start),
                        _ if byte.is_ascii_punctuation() => self.scan_symbol(byte, start),
                        _ => {
                            self.errors.record(&ScanError::StrayCharacter {
                                byte,
                                position: start,
                            });
                            Token::new(TokenKind::Error, (byte as char).to_string(), start)
                        }
                    };
                    self.had_space_after = matches!(self.peek(), Some(b' ' | b'\t' | b'\n'));
                    token.space_before = self.had_space_before;
                    token.space_after = self.had_space_after;
                    trace!(token = %token, "scanned");
                    return token;
                }
            }
        }
    }

    /// Compare the counted column against the indentation stack; emits the
    /// synthetic token for this line start, or nothing at the very start
    /// of the source.
    fn resolve_indentation(&mut self) -> Option<Token> {
        if self.setting_indent {
            self.setting_indent = false;
            self.indents.push(self.indent);
            self.indent = self.column;
            return Some(self.synthetic(TokenKind::Newline, "\n"));
        }
        if self.column > self.indent {
            self.indents.push(self.indent);
            self.indent = self.column;
            return Some(self.synthetic(TokenKind::Indent, "\t"));
        }
        if self.column < self.indent {
            let mut levels = 0u32;
            while self.column < self.indent {
                match self.indents.pop() {
                    Some(outer) => {
                        self.indent = outer;
                        levels += 1;
                    }
                    None => {
                        self.indent = self.column;
                        break;
                    }
                }
            }
            if self.indent != self.column {
                self.errors.record(&ScanError::UnindentMismatch {
                    column: self.column,
                    indent: self.indent,
                    position: self.position(),
                });
                self.indent = self.column;
            }
            self.pending_unindents = levels.saturating_sub(1);
            return Some(self.synthetic(TokenKind::Unindent, UNINDENT_NAME));
        }
        if self.at_bof {
            return None;
        }
        Some(self.synthetic(TokenKind::Newline, "\n"))
    }

    /// Scan a number: `base#digits[.digits][#][Eexp]` with single
    /// underscores for grouping.
    fn scan_number(&mut self, first: u8, start: SourcePos) -> Token {
        let mut source = String::new();
        source.push(first as char);
        let mut base: u64 = 10;
        let mut explicit_base = false;
        let mut closed_base = false;
        let mut natural: u64 = (first - b'0') as u64;
        let mut real: f64 = natural as f64;
        let mut is_real = false;

        self.scan_digit_run(10, &mut source, &mut natural, &mut real);

        if self.peek() == Some(b'#') && natural >= 2 {
            self.next_byte();
            source.push('#');
            explicit_base = true;
            base = natural;
            if base == 64 {
                self.errors.record(&ScanError::NumberIsBlob { position: start });
                base = 16;
            } else if base > 36 {
                self.errors.record(&ScanError::InvalidBase {
                    base,
                    position: start,
                });
                base = 16;
            }
            natural = 0;
            real = 0.0;
            self.scan_digit_run(base, &mut source, &mut natural, &mut real);
        }

        if self.peek() == Some(b'.') {
            self.next_byte();
            let fraction_digit = self
                .peek()
                .and_then(digit_value)
                .is_some_and(|value| (value as u64) < base);
            if fraction_digit {
                is_real = true;
                source.push('.');
                let mut scale = 1.0 / base as f64;
                let mut last_underscore = false;
                while let Some(byte) = self.peek() {
                    if byte == b'_' {
                        if last_underscore {
                            self.errors.record(&ScanError::DoubledUnderscore {
                                position: self.position(),
                            });
                        }
                        last_underscore = true;
                        self.next_byte();
                        source.push('_');
                        continue;
                    }
                    match digit_value(byte) {
                        Some(value) if (value as u64) < base => {
                            last_underscore = false;
                            self.next_byte();
                            source.push(byte as char);
                            real += value as f64 * scale;
                            scale /= base as f64;
                        }
                        _ => break,
                    }
                }
                if last_underscore {
                    self.unget();
                    source.pop();
                }
            } else {
                // `1..3` and friends: the dot belongs to what follows.
                self.unget();
            }
        }

        if explicit_base && self.peek() == Some(b'#') {
            self.next_byte();
            source.push('#');
            closed_base = true;
        }

        let exponent_possible = !explicit_base || closed_base || base < 15;
        if let (true, Some(marker @ (b'e' | b'E'))) = (exponent_possible, self.peek()) {
            let mark = self.offset;
            self.next_byte();
            let mut negative = false;
            match self.peek() {
                Some(b'-') => {
                    negative = true;
                    self.next_byte();
                }
                Some(b'+') => {
                    self.next_byte();
                }
                _ => {}
            }
            if self.peek().is_some_and(|byte| byte.is_ascii_digit()) {
                source.push(marker as char);
                if negative {
                    source.push('-');
                }
                let mut exponent: u32 = 0;
                while let Some(byte) = self.peek() {
                    if byte.is_ascii_digit() {
                        self.next_byte();
                        source.push(byte as char);
                        exponent = exponent.saturating_mul(10).saturating_add((byte - b'0') as u32);
                    } else {
                        break;
                    }
                }
                if negative {
                    is_real = true;
                    real /= (base as f64).powi(exponent as i32);
                } else if is_real {
                    real *= (base as f64).powi(exponent as i32);
                } else {
                    match base
                        .checked_pow(exponent)
                        .and_then(|power| natural.checked_mul(power))
                    {
                        Some(scaled) => {
                            natural = scaled;
                            real = natural as f64;
                        }
                        None => {
                            is_real = true;
                            real *= (base as f64).powi(exponent as i32);
                        }
                    }
                }
            } else {
                // Not an exponent: `2E` where E is a name, or `1e+x`.
                self.offset = mark;
            }
        }

        if is_real {
            let value = if explicit_base {
                Node::based_real(real, base as u8, start)
            } else {
                Node::real(real, start)
            };
            Token::with_value(TokenKind::Real, source, start, value)
        } else {
            let value = if explicit_base {
                Node::based_natural(natural, base as u8, start)
            } else {
                Node::natural(natural, start)
            };
            Token::with_value(TokenKind::Integer, source, start, value)
        }
    }

    fn scan_digit_run(
        &mut self,
        base: u64,
        source: &mut String,
        natural: &mut u64,
        real: &mut f64,
    ) {
        let mut last_underscore = false;
        while let Some(byte) = self.peek() {
            if byte == b'_' {
                if last_underscore {
                    self.errors.record(&ScanError::DoubledUnderscore {
                        position: self.position(),
                    });
                }
                last_underscore = true;
                self.next_byte();
                source.push('_');
                continue;
            }
            match digit_value(byte) {
                Some(value) if (value as u64) < base => {
                    last_underscore = false;
                    self.next_byte();
                    source.push(byte as char);
                    *natural = natural
                        .saturating_mul(base)
                        .saturating_add(value as u64);
                    *real = *real * base as f64 + value as f64;
                }
                _ => break,
            }
        }
        if last_underscore {
            self.unget();
            source.pop();
        }
    }

    /// Scan a blob: `$` then an optional `base#` prefix and digits; bases
    /// 2, 4, 8 and 16 pack bits, base 64 uses the standard alphabet.
    fn scan_blob(&mut self, start: SourcePos) -> Token {
        let mut source = String::from("$");
        let mut base: u64 = 16;

        let mark = self.offset;
        let mut prefix: u64 = 0;
        let mut prefix_text = String::new();
        while let Some(byte) = self.peek() {
            if byte.is_ascii_digit() {
                self.next_byte();
                prefix_text.push(byte as char);
                prefix = prefix.saturating_mul(10).saturating_add((byte - b'0') as u64);
            } else {
                break;
            }
        }
        if !prefix_text.is_empty() && self.peek() == Some(b'#') {
            self.next_byte();
            source.push_str(&prefix_text);
            source.push('#');
            if matches!(prefix, 2 | 4 | 8 | 16 | 64) {
                base = prefix;
            } else {
                self.errors.record(&ScanError::BlobBase {
                    base: prefix,
                    position: start,
                });
            }
        } else {
            self.offset = mark;
        }

        let mut data = Vec::new();
        let mut bits: u32 = 0;
        let mut bit_count: u32 = 0;
        let bits_per_digit = if base == 64 { 6 } else { base.trailing_zeros() };
        let mut last_underscore = false;
        while let Some(byte) = self.peek() {
            let digit = if base == 64 {
                base64_value(byte)
            } else {
                digit_value(byte).filter(|value| (*value as u64) < base)
            };
            match byte {
                b' ' | b'\t' | b'\n' => {
                    self.next_byte();
                    source.push(byte as char);
                }
                b'_' => {
                    if last_underscore {
                        self.errors.record(&ScanError::DoubledUnderscore {
                            position: self.position(),
                        });
                    }
                    last_underscore = true;
                    self.next_byte();
                    source.push('_');
                }
                b'=' if base == 64 => {
                    self.next_byte();
                    source.push('=');
                }
                b'$' => {
                    self.next_byte();
                    source.push('$');
                    break;
                }
                _ => match digit {
                    Some(value) => {
                        last_underscore = false;
                        self.next_byte();
                        source.push(byte as char);
                        bits = (bits << bits_per_digit) | value as u32;
                        bit_count += bits_per_digit;
                        if bit_count >= 8 {
                            bit_count -= 8;
                            data.push((bits >> bit_count) as u8);
                            bits &= (1 << bit_count) - 1;
                        }
                    }
                    None => break,
                },
            }
        }
        if bit_count != 0 && base != 64 {
            self.errors.record(&ScanError::TruncatedBlob { position: start });
        }

        let value = Node::blob(data, base as u8, start);
        Token::with_value(TokenKind::Blob, source, start, value)
    }

    /// Scan a name and classify it against the block delimiters.
    fn scan_name(&mut self, first: u8, start: SourcePos) -> Token {
        let mut bytes = vec![first];
        while let Some(byte) = self.peek() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte >= 0x80 {
                self.next_byte();
                bytes.push(byte);
            } else {
                break;
            }
        }
        let raw = match String::from_utf8(bytes) {
            Ok(raw) => raw,
            Err(error) => {
                self.errors.record(&ScanError::InvalidUtf8 { position: start });
                String::from_utf8_lossy(error.as_bytes()).into_owned()
            }
        };
        if !is_valid_name(&raw) {
            self.errors.record(&ScanError::MalformedName {
                name: raw.clone(),
                position: start,
            });
        }
        let normalized = normalize_name(&raw);
        let kind = self.delimiter_kind(&normalized);
        Token::with_value(kind, raw, start, Node::name(normalized, start))
    }

    /// Scan a symbol: the longest punctuation run that remains a prefix of
    /// a known operator. A single character always forms a token.
    fn scan_symbol(&mut self, first: u8, start: SourcePos) -> Token {
        let mut text = String::new();
        text.push(first as char);
        while let Some(byte) = self.peek() {
            if !byte.is_ascii_punctuation() || matches!(byte, b'\'' | b'"' | b'$') {
                break;
            }
            let mut candidate = text.clone();
            candidate.push(byte as char);
            if !self.syntax.is_operator(&candidate) {
                break;
            }
            self.next_byte();
            text = candidate;
        }
        let kind = self.delimiter_kind(&text);
        let value = Node::name(text.clone(), start);
        Token::with_value(kind, text, start, value)
    }

    fn delimiter_kind(&self, name: &str) -> TokenKind {
        if self.syntax.is_block_opening(name) {
            TokenKind::Open
        } else if self.syntax.is_block_closing(name) {
            TokenKind::Close
        } else if name.chars().next().is_some_and(|c| c.is_ascii_punctuation()) {
            TokenKind::Symbol
        } else {
            TokenKind::Name
        }
    }

    /// Scan quoted text; a doubled quote embeds the quote character.
    fn scan_text(&mut self, quote: u8, start: SourcePos) -> Token {
        let mut source = String::new();
        source.push(quote as char);
        let mut bytes = Vec::new();
        loop {
            match self.next_byte() {
                None => {
                    self.errors.record(&ScanError::UnterminatedText { position: start });
                    break;
                }
                Some(byte) if byte == quote => {
                    source.push(quote as char);
                    if self.peek() == Some(quote) {
                        self.next_byte();
                        source.push(quote as char);
                        bytes.push(quote);
                    } else {
                        break;
                    }
                }
                Some(byte) => {
                    source.push(byte as char);
                    bytes.push(byte);
                }
            }
        }
        let value = match String::from_utf8(bytes) {
            Ok(value) => value,
            Err(error) => {
                self.errors.record(&ScanError::InvalidUtf8 { position: start });
                String::from_utf8_lossy(error.as_bytes()).into_owned()
            }
        };
        let kind = if quote == b'\'' {
            TokenKind::Character
        } else {
            TokenKind::Text
        };
        let node = Node::quoted_text(value, quote as char, start);
        Token::with_value(kind, source, start, node)
    }

    /// Consume input until `closing` is matched, returning the skipped
    /// bytes without the closing sequence. Partial matches backtrack, so
    /// `/** /` does not close `**/`. Indentation accounting stays live so
    /// that comment lines do not disturb the surrounding block structure.
    pub fn skip_to(&mut self, closing: &str) -> String {
        let closing_bytes = closing.as_bytes();
        let mut skipped: Vec<u8> = Vec::new();
        loop {
            let Some(byte) = self.next_byte() else {
                if closing != "\n" {
                    self.errors.record(&ScanError::UnterminatedComment {
                        closing: closing.to_string(),
                        position: self.position(),
                    });
                }
                break;
            };
            if self.checking_indent {
                if byte == b' ' || byte == b'\t' {
                    self.column += 1;
                } else {
                    self.checking_indent = false;
                }
            }
            if byte == b'\n' {
                self.checking_indent = true;
                self.column = 0;
            }
            skipped.push(byte);
            if skipped.ends_with(closing_bytes) {
                skipped.truncate(skipped.len() - closing_bytes.len());
                break;
            }
        }
        String::from_utf8_lossy(&skipped).into_owned()
    }
}

fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte >= 0x80
}

fn digit_value(byte: u8) -> Option<u32> {
    match byte {
        b'0'..=b'9' => Some((byte - b'0') as u32),
        b'A'..=b'Z' => Some((byte - b'A') as u32 + 10),
        b'a'..=b'z' => Some((byte - b'a') as u32 + 10),
        _ => None,
    }
}

fn base64_value(byte: u8) -> Option<u32> {
    match byte {
        b'A'..=b'Z' => Some((byte - b'A') as u32),
        b'a'..=b'z' => Some((byte - b'a') as u32 + 26),
        b'0'..=b'9' => Some((byte - b'0') as u32 + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}
