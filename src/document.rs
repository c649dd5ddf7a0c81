//! Structured (rich-text) documents.
//!
//! A [`Document`] is an ordered list of top-level [`Node`]s. A node is either a
//! block (paragraph, heading, list, link, ...) holding child nodes, or a leaf
//! holding a text payload and a set of independent style [`Marks`]:
//!
//! ```text
//! Document
//! ├─ Block(paragraph)
//! │   ├─ Leaf("Hello ", {})
//! │   └─ Leaf("world", {BOLD})
//! └─ Block(bulleted-list)
//!     └─ Block(list-item)
//!         └─ Leaf("", {})          <- placeholder for "no content yet"
//! ```
//!
//! ## Invariants
//!
//! - Every block has at least one child. Constructors and deserialization insert
//!   an empty leaf when a block would otherwise be empty.
//! - Rule application only ever replaces leaf text (see `engine/transform.rs`);
//!   block kinds, nesting and marks are never touched.
//!
//! The JSON form mirrors the usual rich-text editor shape: blocks are
//! `{"type": "paragraph", "children": [...]}` and leaves are
//! `{"text": "...", "bold": true}` with unset marks omitted.

use serde::{Deserialize, Serialize};

use crate::score::is_space;

bitflags::bitflags! {
    /// Independent style flags carried by a leaf.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Marks: u8 {
        const BOLD      = 1 << 0;
        const ITALIC    = 1 << 1;
        const UNDERLINE = 1 << 2;
        const CODE      = 1 << 3;
    }
}

/// Kind tag of a block node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    HeadingThree,
    Blockquote,
    CodeBlock,
    BulletedList,
    NumberedList,
    ListItem,
    Link { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NodeRepr", into = "NodeRepr")]
pub enum Node {
    Block { kind: BlockKind, children: Vec<Node> },
    Leaf { text: String, marks: Marks },
}

impl Node {
    /// A block of `kind`; an empty `children` list gets the empty-leaf placeholder.
    pub fn block(kind: BlockKind, mut children: Vec<Node>) -> Self {
        if children.is_empty() {
            children.push(Node::text(""));
        }
        Node::Block { kind, children }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Leaf { text: text.into(), marks: Marks::empty() }
    }

    pub fn styled(text: impl Into<String>, marks: Marks) -> Self {
        Node::Leaf { text: text.into(), marks }
    }

    /// A paragraph holding a single unstyled leaf.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::block(BlockKind::Paragraph, vec![Node::text(text)])
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Concatenation of every leaf's text below this node, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Leaf { text, .. } => out.push_str(text),
            Node::Block { children, .. } => children.iter().for_each(|c| c.collect_text(out)),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Block { children, .. } => children.iter().map(Node::leaf_count).sum(),
        }
    }

    /// True when both trees have identical kinds, nesting and marks; leaf
    /// text is ignored.
    pub fn same_shape(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Leaf { marks: a, .. }, Node::Leaf { marks: b, .. }) => a == b,
            (Node::Block { kind: ka, children: ca }, Node::Block { kind: kb, children: cb }) => {
                ka == kb && ca.len() == cb.len() && ca.iter().zip(cb).all(|(a, b)| a.same_shape(b))
            }
            _ => false,
        }
    }
}

/// An ordered sequence of top-level nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Document { nodes }
    }

    pub fn empty() -> Self {
        Document::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Import plain text: paragraphs are separated by a blank line
    /// (`\n\n` or `\r\n\r\n`). Always yields at least one paragraph.
    pub fn from_plain_text(text: &str) -> Self {
        let paragraphs = regex!(r"\r?\n\r?\n").split(text).map(Node::paragraph).collect();
        Document { nodes: paragraphs }
    }

    /// Plain-text projection: each top-level node's text, joined with `\n`.
    ///
    /// An empty document projects to the empty string.
    pub fn plain_text(&self) -> String {
        self.nodes.iter().map(Node::text_content).collect::<Vec<_>>().join("\n")
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().map(Node::leaf_count).sum()
    }

    pub fn same_shape(&self, other: &Document) -> bool {
        self.nodes.len() == other.nodes.len() && self.nodes.iter().zip(&other.nodes).all(|(a, b)| a.same_shape(b))
    }

    pub fn stats(&self) -> TextStats {
        TextStats::of(&self.plain_text())
    }
}

/// Word and character counts shown next to an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        if text.is_empty() {
            return TextStats::default();
        }
        TextStats { words: text.split(is_space).filter(|w| !w.is_empty()).count(), characters: text.chars().count() }
    }
}

// --- JSON representation ------------------------------------------------------

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum NodeRepr {
    Block(BlockRepr),
    Leaf(LeafRepr),
}

#[derive(Serialize, Deserialize)]
struct BlockRepr {
    #[serde(rename = "type")]
    kind: BlockTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    children: Vec<Node>,
}

#[derive(Serialize, Deserialize)]
struct LeafRepr {
    text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    code: bool,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum BlockTag {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    HeadingThree,
    Blockquote,
    CodeBlock,
    BulletedList,
    NumberedList,
    ListItem,
    Link,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl From<NodeRepr> for Node {
    fn from(repr: NodeRepr) -> Self {
        match repr {
            NodeRepr::Leaf(leaf) => {
                let mut marks = Marks::empty();
                marks.set(Marks::BOLD, leaf.bold);
                marks.set(Marks::ITALIC, leaf.italic);
                marks.set(Marks::UNDERLINE, leaf.underline);
                marks.set(Marks::CODE, leaf.code);
                Node::Leaf { text: leaf.text, marks }
            }
            NodeRepr::Block(block) => {
                let kind = match block.kind {
                    BlockTag::Paragraph => BlockKind::Paragraph,
                    BlockTag::HeadingOne => BlockKind::HeadingOne,
                    BlockTag::HeadingTwo => BlockKind::HeadingTwo,
                    BlockTag::HeadingThree => BlockKind::HeadingThree,
                    BlockTag::Blockquote => BlockKind::Blockquote,
                    BlockTag::CodeBlock => BlockKind::CodeBlock,
                    BlockTag::BulletedList => BlockKind::BulletedList,
                    BlockTag::NumberedList => BlockKind::NumberedList,
                    BlockTag::ListItem => BlockKind::ListItem,
                    BlockTag::Link => BlockKind::Link { url: block.url.unwrap_or_default() },
                };
                Node::block(kind, block.children)
            }
        }
    }
}

impl From<Node> for NodeRepr {
    fn from(node: Node) -> Self {
        match node {
            Node::Leaf { text, marks } => NodeRepr::Leaf(LeafRepr {
                text,
                bold: marks.contains(Marks::BOLD),
                italic: marks.contains(Marks::ITALIC),
                underline: marks.contains(Marks::UNDERLINE),
                code: marks.contains(Marks::CODE),
            }),
            Node::Block { kind, children } => {
                let (kind, url) = match kind {
                    BlockKind::Paragraph => (BlockTag::Paragraph, None),
                    BlockKind::HeadingOne => (BlockTag::HeadingOne, None),
                    BlockKind::HeadingTwo => (BlockTag::HeadingTwo, None),
                    BlockKind::HeadingThree => (BlockTag::HeadingThree, None),
                    BlockKind::Blockquote => (BlockTag::Blockquote, None),
                    BlockKind::CodeBlock => (BlockTag::CodeBlock, None),
                    BlockKind::BulletedList => (BlockTag::BulletedList, None),
                    BlockKind::NumberedList => (BlockTag::NumberedList, None),
                    BlockKind::ListItem => (BlockTag::ListItem, None),
                    BlockKind::Link { url } => (BlockTag::Link, Some(url)),
                };
                NodeRepr::Block(BlockRepr { kind, url, children })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        Document::new(vec![
            Node::block(BlockKind::HeadingOne, vec![Node::text("Title")]),
            Node::block(
                BlockKind::Paragraph,
                vec![Node::text("Hello "), Node::styled("world", Marks::BOLD | Marks::ITALIC)],
            ),
            Node::block(
                BlockKind::BulletedList,
                vec![
                    Node::block(BlockKind::ListItem, vec![Node::text("one")]),
                    Node::block(BlockKind::ListItem, vec![]),
                ],
            ),
        ])
    }

    #[test]
    fn empty_block_gets_placeholder_leaf() {
        let node = Node::block(BlockKind::Paragraph, vec![]);
        assert_eq!(node, Node::Block { kind: BlockKind::Paragraph, children: vec![Node::text("")] });
    }

    #[test]
    fn plain_text_joins_top_level_blocks_with_newlines() {
        assert_eq!(sample().plain_text(), "Title\nHello world\none");
        assert_eq!(Document::empty().plain_text(), "");
    }

    #[test]
    fn leaf_count_includes_placeholders() {
        assert_eq!(sample().leaf_count(), 5);
    }

    #[test]
    fn plain_text_import_splits_on_blank_lines() {
        let doc = Document::from_plain_text("First para\nstill first\r\n\r\nSecond");
        assert_eq!(doc.nodes, vec![Node::paragraph("First para\nstill first"), Node::paragraph("Second")]);

        let empty = Document::from_plain_text("");
        assert_eq!(empty.nodes, vec![Node::paragraph("")]);
    }

    #[test]
    fn json_shape_matches_editor_format() {
        let doc = Document::new(vec![Node::block(
            BlockKind::Link { url: "https://example.com".into() },
            vec![Node::styled("site", Marks::UNDERLINE)],
        )]);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "type": "link",
                "url": "https://example.com",
                "children": [{ "text": "site", "underline": true }]
            }])
        );
    }

    #[test]
    fn json_import_fills_empty_blocks_and_reads_marks() {
        let raw = r#"[
            {"type": "heading-two", "children": []},
            {"type": "paragraph", "children": [{"text": "x", "code": true, "bold": true}]}
        ]"#;
        let doc: Document = serde_json::from_str(raw).unwrap();
        assert_eq!(
            doc.nodes,
            vec![
                Node::block(BlockKind::HeadingTwo, vec![Node::text("")]),
                Node::block(BlockKind::Paragraph, vec![Node::styled("x", Marks::CODE | Marks::BOLD)]),
            ]
        );
    }

    #[test]
    fn same_shape_ignores_text_only() {
        let a = sample();
        let mut b = sample();
        if let Node::Block { children, .. } = &mut b.nodes[0] {
            children[0] = Node::text("Another title");
        }
        assert!(a.same_shape(&b));

        let mut c = sample();
        if let Node::Block { children, .. } = &mut c.nodes[1] {
            children[1] = Node::text("world");
        }
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn text_stats_count_words_and_chars() {
        assert_eq!(TextStats::of(""), TextStats { words: 0, characters: 0 });
        assert_eq!(TextStats::of("  two\twords \n"), TextStats { words: 2, characters: 13 });
        assert_eq!(sample().stats(), TextStats { words: 4, characters: 21 });
    }
}
