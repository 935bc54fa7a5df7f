/**
The Lark syntax frontend.

Lark parses source text into a uniform tree of a dozen node shapes, driven
entirely by a configurable syntax table: operator priorities, block,
comment and text delimiters, and even nested sub-syntaxes come from a
description file rather than from code. The [`renderer`] walks trees back
to source form under an optional style sheet.

The usual pipeline is [`Positions`] and [`Errors`] for the session,
[`Syntax`] for the language, a [`Scanner`] over the source, and a
[`Parser`] producing a [`TreeRef`].
*/
pub mod errors;
pub mod parser;
pub mod position;
pub mod renderer;
pub mod scanner;
pub mod syntax;
pub mod token;
pub mod tree;

#[cfg(feature = "audit")]
pub mod audit;

pub use errors::{AnnotatedError, Diagnostic, Errors};
pub use parser::{parse_source, ParseError, Parser};
pub use position::{PositionInfo, Positions, SourcePos};
pub use renderer::{Renderer, Style, StyleItem, DEFAULT_STYLE};
pub use scanner::{ScanError, Scanner};
pub use syntax::{ConfigError, Syntax, DEFAULT_SYNTAX};
pub use token::{Token, TokenKind};
pub use tree::{is_valid_name, normalize_name, LarkString, Node, Tree, TreeRef};
