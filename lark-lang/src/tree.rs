//! The uniform parse tree.
//!
//! Every node is one of a closed set of variants: four leaf shapes
//! (numbers, text, names, blobs), delimited long text, the three operator
//! shapes (prefix, postfix, infix) plus plain juxtaposition, and blocks.
//! Nodes are shared through [`TreeRef`] (an atomically reference-counted
//! handle), so a parent owns its children and a tree can be handed across
//! threads once built. Mutating operations go through `&mut TreeRef` and
//! work in place when the handle is the only owner, copying otherwise.

use std::fmt::{self, Display, Formatter};
use std::io::{self, Write};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use smartstring::{LazyCompact, SmartString};
use tracing::trace;

use crate::position::SourcePos;
use crate::renderer::Renderer;

/// Compact string storage for names and text payloads.
pub type LarkString = SmartString<LazyCompact>;

/// Shared handle to a tree node.
pub type TreeRef = Arc<Node>;

/// A tree node: a source position plus the variant payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub position: SourcePos,
    pub kind: Tree,
    #[cfg(feature = "audit")]
    #[serde(skip, default)]
    audit: crate::audit::Registration,
}

/// The closed variant set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tree {
    Natural {
        value: u64,
        base: Option<u8>,
    },
    /// Signed integers only arise from negating a Natural literal.
    Integer {
        value: i64,
        base: Option<u8>,
    },
    Real {
        value: f64,
        base: Option<u8>,
    },
    /// Quoted text; `quote` is `'"'` for TEXT and `'\''` for CHARACTER.
    Text {
        value: LarkString,
        quote: char,
    },
    Name {
        value: LarkString,
    },
    Blob {
        data: Vec<u8>,
        base: u8,
    },
    /// Text bracketed by configured delimiters, e.g. `<<Hello>>`.
    LongText {
        value: TreeRef,
        opening: TreeRef,
        closing: TreeRef,
    },
    /// Operator applied before its operand; `left` is a Name.
    Prefix {
        left: TreeRef,
        right: TreeRef,
    },
    /// Operator applied after its operand; `right` is a Name.
    Postfix {
        left: TreeRef,
        right: TreeRef,
    },
    /// Juxtaposition of two trees, neither of which is a Name.
    Pfix {
        left: TreeRef,
        right: TreeRef,
    },
    Infix {
        opcode: TreeRef,
        left: TreeRef,
        right: TreeRef,
    },
    Block {
        opening: TreeRef,
        closing: TreeRef,
        separator: Option<TreeRef>,
        children: SmallVec<[TreeRef; 4]>,
    },
}

/// Check a byte sequence against the name syntax: punctuation-only, or
/// alphanumeric with no leading, doubled or trailing underscore.
pub fn is_valid_name(text: &str) -> bool {
    let mut chars = text.chars();
    let first = match chars.next() {
        Some(first) => first,
        None => return false,
    };
    if first.is_ascii_punctuation() {
        return text.chars().all(|c| c.is_ascii_punctuation());
    }
    if !first.is_alphabetic() {
        return false;
    }
    let mut had_underscore = false;
    for c in chars {
        if c == '_' {
            if had_underscore {
                return false;
            }
            had_underscore = true;
        } else if c.is_alphanumeric() {
            had_underscore = false;
        } else {
            return false;
        }
    }
    !had_underscore
}

/// The normalized spelling used for syntax table lookups: underscores
/// stripped, ASCII letters lowercased.
pub fn normalize_name(text: &str) -> LarkString {
    text.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// True if the name is an operator spelling such as `+` or `-=`.
pub fn name_is_operator(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_punctuation())
}

impl Node {
    #[track_caller]
    fn make(position: SourcePos, kind: Tree) -> TreeRef {
        trace!(type_name = kind.type_name(), %position, "new node");
        Arc::new(Node {
            position,
            kind,
            #[cfg(feature = "audit")]
            audit: crate::audit::Registration::new(),
        })
    }

    #[track_caller]
    pub fn natural(value: u64, position: SourcePos) -> TreeRef {
        Node::make(position, Tree::Natural { value, base: None })
    }

    #[track_caller]
    pub fn based_natural(value: u64, base: u8, position: SourcePos) -> TreeRef {
        Node::make(
            position,
            Tree::Natural {
                value,
                base: Some(base),
            },
        )
    }

    #[track_caller]
    pub fn integer(value: i64, position: SourcePos) -> TreeRef {
        Node::make(position, Tree::Integer { value, base: None })
    }

    #[track_caller]
    pub fn based_integer(value: i64, base: u8, position: SourcePos) -> TreeRef {
        Node::make(
            position,
            Tree::Integer {
                value,
                base: Some(base),
            },
        )
    }

    #[track_caller]
    pub fn real(value: f64, position: SourcePos) -> TreeRef {
        Node::make(position, Tree::Real { value, base: None })
    }

    #[track_caller]
    pub fn based_real(value: f64, base: u8, position: SourcePos) -> TreeRef {
        Node::make(
            position,
            Tree::Real {
                value,
                base: Some(base),
            },
        )
    }

    #[track_caller]
    pub fn text(value: impl Into<LarkString>, position: SourcePos) -> TreeRef {
        Node::make(
            position,
            Tree::Text {
                value: value.into(),
                quote: '"',
            },
        )
    }

    #[track_caller]
    pub fn character(value: impl Into<LarkString>, position: SourcePos) -> TreeRef {
        Node::make(
            position,
            Tree::Text {
                value: value.into(),
                quote: '\'',
            },
        )
    }

    #[track_caller]
    pub fn quoted_text(value: impl Into<LarkString>, quote: char, position: SourcePos) -> TreeRef {
        Node::make(
            position,
            Tree::Text {
                value: value.into(),
                quote,
            },
        )
    }

    #[track_caller]
    pub fn name(value: impl Into<LarkString>, position: SourcePos) -> TreeRef {
        let value = value.into();
        debug_assert!(
            is_valid_name(&value) || value == "\n" || value == "\t" || value == "\u{8}",
            "invalid name {value:?}"
        );
        Node::make(position, Tree::Name { value })
    }

    #[track_caller]
    pub fn blob(data: Vec<u8>, base: u8, position: SourcePos) -> TreeRef {
        Node::make(position, Tree::Blob { data, base })
    }

    #[track_caller]
    pub fn long_text(value: TreeRef, opening: TreeRef, closing: TreeRef) -> TreeRef {
        let position = value.position;
        Node::make(
            position,
            Tree::LongText {
                value,
                opening,
                closing,
            },
        )
    }

    #[track_caller]
    pub fn prefix(operator: TreeRef, operand: TreeRef, position: SourcePos) -> TreeRef {
        Node::make(
            position,
            Tree::Prefix {
                left: operator,
                right: operand,
            },
        )
    }

    #[track_caller]
    pub fn postfix(operand: TreeRef, operator: TreeRef, position: SourcePos) -> TreeRef {
        Node::make(
            position,
            Tree::Postfix {
                left: operand,
                right: operator,
            },
        )
    }

    #[track_caller]
    pub fn pfix(left: TreeRef, right: TreeRef, position: SourcePos) -> TreeRef {
        Node::make(position, Tree::Pfix { left, right })
    }

    #[track_caller]
    pub fn infix(opcode: TreeRef, left: TreeRef, right: TreeRef, position: SourcePos) -> TreeRef {
        Node::make(
            position,
            Tree::Infix {
                opcode,
                left,
                right,
            },
        )
    }

    #[track_caller]
    pub fn block(
        opening: TreeRef,
        closing: TreeRef,
        separator: Option<TreeRef>,
        children: impl IntoIterator<Item = TreeRef>,
        position: SourcePos,
    ) -> TreeRef {
        Node::make(
            position,
            Tree::Block {
                opening,
                closing,
                separator,
                children: children.into_iter().collect(),
            },
        )
    }

    /// The name this node's renderer style entry is looked up under.
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Number of child slots: fixed per variant, dynamic for blocks.
    pub fn arity(&self) -> usize {
        match &self.kind {
            Tree::Natural { .. }
            | Tree::Integer { .. }
            | Tree::Real { .. }
            | Tree::Text { .. }
            | Tree::Name { .. }
            | Tree::Blob { .. } => 0,
            Tree::LongText { .. } => 3,
            Tree::Prefix { .. } | Tree::Postfix { .. } | Tree::Pfix { .. } => 2,
            Tree::Infix { .. } => 3,
            Tree::Block { children, .. } => children.len(),
        }
    }

    /// Child at `index`, following the slot order of [`Node::arity`].
    pub fn child(&self, index: usize) -> Option<&TreeRef> {
        match &self.kind {
            Tree::Natural { .. }
            | Tree::Integer { .. }
            | Tree::Real { .. }
            | Tree::Text { .. }
            | Tree::Name { .. }
            | Tree::Blob { .. } => None,
            Tree::LongText {
                value,
                opening,
                closing,
            } => [value, opening, closing].get(index).copied(),
            Tree::Prefix { left, right }
            | Tree::Postfix { left, right }
            | Tree::Pfix { left, right } => [left, right].get(index).copied(),
            Tree::Infix {
                opcode,
                left,
                right,
            } => [opcode, left, right].get(index).copied(),
            Tree::Block { children, .. } => children.get(index),
        }
    }

    /// Length of the dynamic payload: bytes for text, names and blobs,
    /// children for blocks, zero elsewhere.
    pub fn size(&self) -> usize {
        match &self.kind {
            Tree::Text { value, .. } | Tree::Name { value } => value.len(),
            Tree::Blob { data, .. } => data.len(),
            Tree::Block { children, .. } => children.len(),
            _ => 0,
        }
    }

    /// The payload of a Name node.
    pub fn name_value(&self) -> Option<&str> {
        match &self.kind {
            Tree::Name { value } => Some(value),
            _ => None,
        }
    }

    /// The payload of a Text node.
    pub fn text_value(&self) -> Option<&str> {
        match &self.kind {
            Tree::Text { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_name(&self) -> bool {
        matches!(self.kind, Tree::Name { .. })
    }

    /// Deep copy: a new node whose children are themselves deep copies.
    pub fn deep_clone(self: &TreeRef) -> TreeRef {
        let kind = match &self.kind {
            Tree::LongText {
                value,
                opening,
                closing,
            } => Tree::LongText {
                value: value.deep_clone(),
                opening: opening.deep_clone(),
                closing: closing.deep_clone(),
            },
            Tree::Prefix { left, right } => Tree::Prefix {
                left: left.deep_clone(),
                right: right.deep_clone(),
            },
            Tree::Postfix { left, right } => Tree::Postfix {
                left: left.deep_clone(),
                right: right.deep_clone(),
            },
            Tree::Pfix { left, right } => Tree::Pfix {
                left: left.deep_clone(),
                right: right.deep_clone(),
            },
            Tree::Infix {
                opcode,
                left,
                right,
            } => Tree::Infix {
                opcode: opcode.deep_clone(),
                left: left.deep_clone(),
                right: right.deep_clone(),
            },
            Tree::Block {
                opening,
                closing,
                separator,
                children,
            } => Tree::Block {
                opening: opening.deep_clone(),
                closing: closing.deep_clone(),
                separator: separator.as_ref().map(|s| s.deep_clone()),
                children: children.iter().map(|c| c.deep_clone()).collect(),
            },
            leaf => leaf.clone(),
        };
        Node::make(self.position, kind)
    }

    /// Shallow copy: a new header whose children are shared.
    pub fn copy(self: &TreeRef) -> TreeRef {
        Arc::new(Node::clone(self))
    }

    /// Render this tree in its built-in source form.
    pub fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        Renderer::unstyled(out).render(self)
    }

    /// Render into an in-memory string.
    pub fn text(&self) -> String {
        let mut bytes = Vec::new();
        self.render(&mut bytes)
            .expect("rendering to memory cannot fail");
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Binary serialization, declared but not yet implemented.
    pub fn freeze(&self, _out: &mut dyn Write) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "tree freezing is not implemented",
        ))
    }

    /// Binary deserialization, declared but not yet implemented.
    pub fn thaw(_input: &mut dyn io::Read) -> io::Result<TreeRef> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "tree thawing is not implemented",
        ))
    }
}

impl Tree {
    pub fn type_name(&self) -> &'static str {
        match self {
            Tree::Natural { .. } => "natural",
            Tree::Integer { .. } => "integer",
            Tree::Real { .. } => "real",
            Tree::Text { quote: '\'', .. } => "character",
            Tree::Text { .. } => "text",
            Tree::Name { .. } => "name",
            Tree::Blob { .. } => "blob",
            Tree::LongText { .. } => "longtext",
            Tree::Prefix { .. } => "prefix",
            Tree::Postfix { .. } => "postfix",
            Tree::Pfix { .. } => "pfix",
            Tree::Infix { .. } => "infix",
            Tree::Block { .. } => "block",
        }
    }
}

// Equality is structural: positions do not participate, so trees parsed
// from different offsets still compare equal in tests and table lookups.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Replace the child slot at `index`, in place when `node` is uniquely
/// owned. Returns false if the variant has no such slot.
pub fn set_child(node: &mut TreeRef, index: usize, child: TreeRef) -> bool {
    let inner = Arc::make_mut(node);
    let slot = match &mut inner.kind {
        Tree::LongText {
            value,
            opening,
            closing,
        } => [value, opening, closing].into_iter().nth(index),
        Tree::Prefix { left, right } | Tree::Postfix { left, right } | Tree::Pfix { left, right } => {
            [left, right].into_iter().nth(index)
        }
        Tree::Infix {
            opcode,
            left,
            right,
        } => [opcode, left, right].into_iter().nth(index),
        Tree::Block { children, .. } => children.get_mut(index),
        _ => None,
    };
    match slot {
        Some(slot) => {
            *slot = child;
            true
        }
        None => false,
    }
}

/// Append bytes to a Text or Name payload. No-op on other variants.
pub fn append_text(node: &mut TreeRef, suffix: &str) {
    if let Tree::Text { value, .. } | Tree::Name { value } = &mut Arc::make_mut(node).kind {
        value.push_str(suffix);
    }
}

/// Append raw bytes to a Blob payload. No-op on other variants.
pub fn append_blob(node: &mut TreeRef, suffix: &[u8]) {
    if let Tree::Blob { data, .. } = &mut Arc::make_mut(node).kind {
        data.extend_from_slice(suffix);
    }
}

/// Keep only `length` payload items starting at `first`, clamped to the
/// payload size. Applies to Text, Name, Blob and Block payloads.
pub fn range(node: &mut TreeRef, first: usize, length: usize) {
    match &mut Arc::make_mut(node).kind {
        Tree::Text { value, .. } | Tree::Name { value } => {
            let first = first.min(value.len());
            let end = (first + length).min(value.len());
            *value = value[first..end].into();
        }
        Tree::Blob { data, .. } => {
            let first = first.min(data.len());
            let end = (first + length).min(data.len());
            *data = data[first..end].to_vec();
        }
        Tree::Block { children, .. } => {
            let first = first.min(children.len());
            let end = (first + length).min(children.len());
            *children = children[first..end].iter().cloned().collect();
        }
        _ => {}
    }
}

/// Append one child to a Block. No-op on other variants.
pub fn block_push(node: &mut TreeRef, child: TreeRef) {
    if let Tree::Block { children, .. } = &mut Arc::make_mut(node).kind {
        children.push(child);
    }
}

/// Set a Block's separator name. No-op on other variants.
pub fn block_set_separator(node: &mut TreeRef, separator: TreeRef) {
    if let Tree::Block { separator: slot, .. } = &mut Arc::make_mut(node).kind {
        *slot = Some(separator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> SourcePos {
        SourcePos(0)
    }

    #[test]
    fn valid_names() {
        assert!(is_valid_name("Hello"));
        assert!(is_valid_name("Big_Number"));
        assert!(is_valid_name("R19"));
        assert!(is_valid_name("+"));
        assert!(is_valid_name("-->"));

        assert!(!is_valid_name(""));
        assert!(!is_valid_name("_leading"));
        assert!(!is_valid_name("doubled__underscore"));
        assert!(!is_valid_name("trailing_"));
        assert!(!is_valid_name("+a"));
        assert!(!is_valid_name("9lives"));
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_name("Joe_Dalton"), "joedalton");
        assert_eq!(normalize_name("JOEDALTON"), "joedalton");
        assert_eq!(normalize_name("-->"), "-->");
    }

    #[test]
    fn arity_per_variant() {
        let a = Node::name("a", pos());
        let b = Node::name("b", pos());
        let plus = Node::name("+", pos());

        assert_eq!(Node::natural(42, pos()).arity(), 0);
        assert_eq!(Node::real(1.5, pos()).arity(), 0);
        assert_eq!(Node::text("hi", pos()).arity(), 0);
        assert_eq!(a.arity(), 0);
        assert_eq!(Node::blob(vec![1, 2], 16, pos()).arity(), 0);
        assert_eq!(Node::prefix(plus.clone(), a.clone(), pos()).arity(), 2);
        assert_eq!(
            Node::infix(plus.clone(), a.clone(), b.clone(), pos()).arity(),
            3
        );

        let open = Node::name("(", pos());
        let close = Node::name(")", pos());
        let block = Node::block(open, close, None, [a, b], pos());
        assert_eq!(block.arity(), 2);
    }

    #[test]
    fn clone_is_deep_copy_is_shallow() {
        let a = Node::name("a", pos());
        let b = Node::name("b", pos());
        let plus = Node::name("+", pos());
        let tree = Node::infix(plus, a, b, pos());

        let deep = tree.deep_clone();
        let shallow = tree.copy();

        assert_eq!(deep, tree);
        assert_eq!(shallow, tree);
        assert!(!Arc::ptr_eq(&deep, &tree));
        assert!(!Arc::ptr_eq(tree.child(1).unwrap(), deep.child(1).unwrap()));
        assert!(Arc::ptr_eq(
            tree.child(1).unwrap(),
            shallow.child(1).unwrap()
        ));
        assert_eq!(deep.text(), tree.text());
    }

    #[test]
    fn set_child_does_not_affect_prior_clones() {
        let a = Node::name("a", pos());
        let b = Node::name("b", pos());
        let plus = Node::name("+", pos());
        let mut tree = Node::infix(plus, a, b, pos());
        let clone = tree.deep_clone();

        assert!(set_child(&mut tree, 2, Node::name("c", pos())));

        assert_eq!(tree.child(2).unwrap().name_value(), Some("c"));
        assert_eq!(clone.child(2).unwrap().name_value(), Some("b"));
    }

    #[test]
    fn shared_nodes_are_copied_on_write() {
        let original = Node::text("start", pos());
        let mut shared = original.clone();

        append_text(&mut shared, " more");

        assert_eq!(original.text_value(), Some("start"));
        assert_eq!(shared.text_value(), Some("start more"));

        // A uniquely owned handle mutates without reallocating the node.
        let mut unique = Node::text("solo", pos());
        append_text(&mut unique, "!");
        assert_eq!(unique.text_value(), Some("solo!"));
    }

    #[test]
    fn range_truncates_payloads() {
        let mut text = Node::text("abcdef", pos());
        range(&mut text, 1, 3);
        assert_eq!(text.text_value(), Some("bcd"));

        let mut blob = Node::blob(vec![1, 2, 3, 4], 16, pos());
        range(&mut blob, 2, 10);
        assert_eq!(blob.size(), 2);
    }

    #[test]
    fn blocks_grow_and_take_a_separator_in_place() {
        let open = Node::name("(", pos());
        let close = Node::name(")", pos());
        let mut block = Node::block(open, close, None, [], pos());
        let shared = block.clone();

        block_push(&mut block, Node::natural(1, pos()));
        block_push(&mut block, Node::natural(2, pos()));
        block_set_separator(&mut block, Node::name(",", pos()));

        assert_eq!(block.arity(), 2);
        assert_eq!(block.text(), "(1, 2)");
        // The handle that was shared before the mutation is untouched.
        assert_eq!(shared.arity(), 0);
        assert_eq!(shared.text(), "()");
    }

    #[test]
    fn trees_serialize_through_serde() {
        let tree = Node::infix(
            Node::name("+", pos()),
            Node::natural(1, pos()),
            Node::natural(2, pos()),
            pos(),
        );

        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.contains("infix"));

        let back: TreeRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn text_of_constructed_trees_is_non_empty() {
        let trees = [
            Node::natural(42, pos()),
            Node::real(2.5, pos()),
            Node::text("hi", pos()),
            Node::name("x", pos()),
            Node::blob(vec![0xFF], 16, pos()),
        ];
        for tree in trees {
            assert!(!tree.text().is_empty());
        }
    }

}
