//! Tokens produced by the scanner.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::position::SourcePos;
use crate::tree::TreeRef;

/// The kinds of tokens the scanner can produce.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Eof,
    Integer,
    Real,
    Text,
    Character,
    LongText,
    Name,
    Symbol,
    Blob,
    Newline,
    Open,
    Close,
    Indent,
    Unindent,
    Error,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let label = match self {
            TokenKind::Eof => "EOF",
            TokenKind::Integer => "INTEGER",
            TokenKind::Real => "REAL",
            TokenKind::Text => "TEXT",
            TokenKind::Character => "CHARACTER",
            TokenKind::LongText => "LONGTEXT",
            TokenKind::Name => "NAME",
            TokenKind::Symbol => "SYMBOL",
            TokenKind::Blob => "BLOB",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Open => "OPEN",
            TokenKind::Close => "CLOSE",
            TokenKind::Indent => "INDENT",
            TokenKind::Unindent => "UNINDENT",
            TokenKind::Error => "ERROR",
        };
        write!(f, "{label}")
    }
}

/// One token: kind, verbatim source form, position, and the scanned value
/// as a leaf tree when the kind has one.
///
/// For NAME, SYMBOL, OPEN and CLOSE tokens the value carries the
/// *normalized* spelling (underscores stripped, ASCII lowercased); the
/// source form keeps the original bytes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub source: String,
    pub position: SourcePos,
    pub value: Option<TreeRef>,
    /// Whitespace immediately before the token.
    #[serde(default)]
    pub space_before: bool,
    /// Whitespace immediately after the token.
    #[serde(default)]
    pub space_after: bool,
}

impl Token {
    pub fn new(kind: TokenKind, source: impl Into<String>, position: SourcePos) -> Self {
        Token {
            kind,
            source: source.into(),
            position,
            value: None,
            space_before: false,
            space_after: false,
        }
    }

    pub fn with_value(
        kind: TokenKind,
        source: impl Into<String>,
        position: SourcePos,
        value: TreeRef,
    ) -> Self {
        Token {
            kind,
            source: source.into(),
            position,
            value: Some(value),
            space_before: false,
            space_after: false,
        }
    }

    pub fn eof(position: SourcePos) -> Self {
        Token::new(TokenKind::Eof, "", position)
    }

    /// The normalized name of a NAME / SYMBOL / OPEN / CLOSE / NEWLINE /
    /// INDENT / UNINDENT token.
    pub fn name(&self) -> Option<&str> {
        self.value.as_deref().and_then(|node| node.name_value())
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.source.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} {:?}", self.kind, self.source)
        }
    }
}
