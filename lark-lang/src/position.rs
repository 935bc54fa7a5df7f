//! Source positions and the per-session registry that maps them back to
//! files, lines and columns.
//!
//! A position is an opaque counter that grows by one for every byte the
//! scanner consumes, across all sources opened in the session. The registry
//! remembers where each source started and keeps its text so that a
//! position can be turned into human-readable information at any time.

use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// An opaque source position, valid within the session that produced it.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SourcePos(pub u32);

impl SourcePos {
    pub const NONE: SourcePos = SourcePos(u32::MAX);
}

impl Display for SourcePos {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Information recovered from a [`SourcePos`] by the registry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionInfo {
    pub file: String,
    pub offset: u32,
    pub line: u32,
    pub column: u32,
    pub line_offset: u32,
    pub line_length: u32,
}

struct SourceRecord {
    name: String,
    start: u32,
    text: String,
}

struct PositionsInner {
    position: u32,
    sources: Vec<SourceRecord>,
}

/// The position registry for one parse session.
///
/// Cheap to clone: all clones share the same records, so a scanner, a
/// parser and an error sink can carry the registry without borrowing from
/// each other.
#[derive(Clone)]
pub struct Positions {
    inner: Rc<RefCell<PositionsInner>>,
}

impl Positions {
    pub fn new() -> Self {
        Positions {
            inner: Rc::new(RefCell::new(PositionsInner {
                position: 0,
                sources: Vec::new(),
            })),
        }
    }

    /// Read `path` and register it, returning its starting position.
    pub fn open_file<P: AsRef<Path>>(&self, path: P) -> io::Result<SourcePos> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(self.open_buffer(path.to_string_lossy().into_owned(), text))
    }

    /// Register an in-memory source, returning its starting position. The
    /// registry reserves one position per byte of the source, so the next
    /// registration starts strictly after this one.
    pub fn open_buffer(&self, name: impl Into<String>, text: impl Into<String>) -> SourcePos {
        let mut inner = self.inner.borrow_mut();
        let start = inner.position;
        let text = text.into();
        inner.position = start + text.len() as u32 + 1;
        inner.sources.push(SourceRecord {
            name: name.into(),
            start,
            text,
        });
        SourcePos(start)
    }

    /// The position the next consumed byte will have.
    pub fn current(&self) -> SourcePos {
        SourcePos(self.inner.borrow().position)
    }

    /// Advance by one byte, returning the position that was consumed.
    pub fn step(&self) -> SourcePos {
        let mut inner = self.inner.borrow_mut();
        let position = inner.position;
        inner.position += 1;
        SourcePos(position)
    }

    /// Map a position back to file, line and column information.
    ///
    /// Returns `None` for positions before the first registered source or
    /// for [`SourcePos::NONE`].
    pub fn info(&self, position: SourcePos) -> Option<PositionInfo> {
        if position == SourcePos::NONE {
            return None;
        }
        let inner = self.inner.borrow();
        let record = inner
            .sources
            .iter()
            .rev()
            .find(|record| record.start <= position.0)?;
        let offset = (position.0 - record.start).min(record.text.len() as u32);

        let mut line = 1u32;
        let mut line_offset = 0u32;
        for (index, byte) in record.text.bytes().enumerate() {
            if index as u32 >= offset {
                break;
            }
            if byte == b'\n' {
                line += 1;
                line_offset = index as u32 + 1;
            }
        }
        let line_length = record.text[line_offset as usize..]
            .bytes()
            .position(|byte| byte == b'\n')
            .unwrap_or(record.text.len() - line_offset as usize) as u32;

        Some(PositionInfo {
            file: record.name.clone(),
            offset,
            line,
            column: offset - line_offset,
            line_offset,
            line_length,
        })
    }

    /// The text of the line containing `position`.
    pub fn source_line(&self, position: SourcePos) -> Option<String> {
        let info = self.info(position)?;
        let inner = self.inner.borrow();
        let record = inner
            .sources
            .iter()
            .rev()
            .find(|record| record.start <= position.0)?;
        let start = info.line_offset as usize;
        let end = start + info.line_length as usize;
        record.text.get(start..end).map(str::to_string)
    }
}

impl Default for Positions {
    fn default() -> Self {
        Positions::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_advance_monotonically() {
        let positions = Positions::new();
        let first = positions.open_buffer("one", "abc");
        let second = positions.open_buffer("two", "d");

        assert_eq!(first, SourcePos(0));
        assert!(second > first);
        assert!(positions.current() > second);
        assert!(positions.step() >= second);
    }

    #[test]
    fn info_finds_line_and_column() {
        let positions = Positions::new();
        positions.open_buffer("test", "first\nsecond\nthird\n");

        let info = positions.info(SourcePos(8)).unwrap();

        assert_eq!(info.file, "test");
        assert_eq!(info.line, 2);
        assert_eq!(info.column, 2);
        assert_eq!(info.line_offset, 6);
        assert_eq!(info.line_length, 6);
        assert_eq!(
            positions.source_line(SourcePos(8)).as_deref(),
            Some("second")
        );
    }

    #[test]
    fn info_uses_latest_matching_record() {
        let positions = Positions::new();
        positions.open_buffer("one", "aaaa");
        let second = positions.open_buffer("two", "bb\nbb");

        let info = positions.info(SourcePos(second.0 + 3)).unwrap();

        assert_eq!(info.file, "two");
        assert_eq!(info.line, 2);
        assert_eq!(info.column, 0);
    }

    #[test]
    fn info_before_first_record_is_none() {
        let positions = Positions::new();

        assert!(positions.info(SourcePos(0)).is_none());
        assert!(positions.info(SourcePos::NONE).is_none());
    }
}
