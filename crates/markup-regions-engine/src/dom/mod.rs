//! Arena-backed markup tree.
//!
//! The tree is the "live" side of the anchoring system: selections point into
//! it as [`Position`]s, the splitter and highlighter mutate it, and the
//! anchorer translates between it and portable anchors.
//!
//! Nodes are never freed. Detaching a node only unlinks it from its parent,
//! so a [`NodeId`] stays valid for the lifetime of its [`Document`].

pub mod parse;
pub mod serialize;

use std::cmp::Ordering;

/// Index of a node inside its [`Document`] arena
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("Node {0:?} is not a text node")]
    NotText(NodeId),
    #[error("Node {0:?} is not an element")]
    NotElement(NodeId),
    #[error("Node {reference:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, reference: NodeId },
    #[error("Inserting {child:?} under {parent:?} would create a cycle")]
    HierarchyViolation { parent: NodeId, child: NodeId },
    #[error("Offset {offset} out of range for {node:?} (length {len})")]
    OffsetOutOfRange {
        node: NodeId,
        offset: usize,
        len: usize,
    },
}

/// A live boundary point.
///
/// For text nodes `offset` counts chars into the text. For elements it is a
/// child index, so `(element, 0)` sits before the first child.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A live range between two boundary points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range inside a single text node
    pub fn within(node: NodeId, start: usize, end: usize) -> Self {
        Self::new(Position::new(node, start), Position::new(node, end))
    }
}

/// Owned markup tree with a synthetic `#document` top node.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

pub const DOCUMENT_TAG: &str = "#document";

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Element {
                    tag: DOCUMENT_TAG.to_string(),
                    attrs: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The synthetic node every parsed fragment hangs off
    pub fn top(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn check(&self, node: NodeId) -> Result<(), DomError> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(DomError::UnknownNode(node))
        }
    }

    pub fn create_element(
        &mut self,
        tag: impl Into<String>,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.into(),
            attrs,
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment(text.into()))
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|n| &n.kind)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index_in_parent(node)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(NodeKind::Text(_)))
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(NodeKind::Element { .. }))
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node) {
            Some(NodeKind::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Length of a text node in chars; zero for anything else
    pub fn char_len(&self, node: NodeId) -> usize {
        self.text(node).map(|t| t.chars().count()).unwrap_or(0)
    }

    pub fn set_text(&mut self, node: NodeId, value: impl Into<String>) -> Result<(), DomError> {
        self.check(node)?;
        match &mut self.nodes[node.0].kind {
            NodeKind::Text(text) => {
                *text = value.into();
                Ok(())
            }
            _ => Err(DomError::NotText(node)),
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match self.kind(node) {
            Some(NodeKind::Element { tag, .. }) => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match self.kind(node) {
            Some(NodeKind::Element { attrs, .. }) => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn set_attr(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        self.check(node)?;
        let value = value.into();
        match &mut self.nodes[node.0].kind {
            NodeKind::Element { attrs, .. } => {
                match attrs.iter_mut().find(|(n, _)| n == name) {
                    Some(slot) => slot.1 = value,
                    None => attrs.push((name.to_string(), value)),
                }
                Ok(())
            }
            _ => Err(DomError::NotElement(node)),
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.check(node)?;
        match &mut self.nodes[node.0].kind {
            NodeKind::Element { attrs, .. } => {
                attrs.retain(|(n, _)| n != name);
                Ok(())
            }
            _ => Err(DomError::NotElement(node)),
        }
    }

    /// Whether the element's whitespace-separated `class` list contains `class`
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// Inclusive ancestry test: a node contains itself
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Unlink `node` from its parent. A no-op for nodes already detached.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        self.check(node)?;
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
        Ok(())
    }

    /// Insert `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. The child is detached from its old parent first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check(parent)?;
        self.check(child)?;
        if !self.is_element(parent) {
            return Err(DomError::NotElement(parent));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyViolation { parent, child });
        }

        self.detach(child)?;

        let index = match reference {
            Some(reference) => self.nodes[parent.0]
                .children
                .iter()
                .position(|&c| c == reference)
                .ok_or(DomError::NotAChild { parent, reference })?,
            None => self.nodes[parent.0].children.len(),
        };

        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Split a text node at a char offset. The original node keeps the head;
    /// the tail becomes a new text node placed right after it.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let text = self.text(node).ok_or(DomError::NotText(node))?;
        let len = text.chars().count();
        if offset > len {
            return Err(DomError::OffsetOutOfRange { node, offset, len });
        }

        let byte = char_to_byte(text, offset);
        let tail = text[byte..].to_string();
        let head = text[..byte].to_string();

        self.set_text(node, head)?;
        let tail_node = self.create_text(tail);
        if let Some(parent) = self.parent(node) {
            let next = self.next_sibling(node);
            self.insert_before(parent, tail_node, next)?;
        }
        Ok(tail_node)
    }

    /// Pre-order traversal of `node` and everything below it
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        let stack = if node.0 < self.nodes.len() {
            vec![node]
        } else {
            Vec::new()
        };
        Descendants { doc: self, stack }
    }

    /// Text nodes under `node` in document order
    pub fn text_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.descendants(node).filter(|&n| self.is_text(n)).collect()
    }

    /// Linearized text of the subtree
    pub fn text_content(&self, node: NodeId) -> String {
        self.descendants(node)
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Child-index path from the top node, used for ordering
    pub fn tree_position(&self, node: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(index) = self.index_in_parent(current) {
            path.push(index);
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }

    fn boundary_key(&self, pos: Position) -> Vec<usize> {
        let mut key = self.tree_position(pos.node);
        key.push(pos.offset);
        key
    }

    /// Document order of two boundary points
    pub fn compare_positions(&self, a: Position, b: Position) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }
        self.boundary_key(a).cmp(&self.boundary_key(b))
    }

    /// Deepest node containing both `a` and `b`
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let mut current = Some(a);
        while let Some(n) = current {
            if self.contains(n, b) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// Text nodes that have at least one char inside `range`, paired with the
    /// covered char span of each
    pub fn covered_text(&self, range: &TextRange) -> Vec<(NodeId, std::ops::Range<usize>)> {
        let scope = self
            .common_ancestor(range.start.node, range.end.node)
            .unwrap_or_else(|| self.top());
        let start_key = self.boundary_key(range.start);
        let end_key = self.boundary_key(range.end);

        self.text_nodes(scope)
            .into_iter()
            .filter_map(|node| {
                let len = self.char_len(node);
                if self.boundary_key(Position::new(node, len)) <= start_key
                    || self.boundary_key(Position::new(node, 0)) >= end_key
                {
                    return None;
                }
                let lo = if range.start.node == node {
                    range.start.offset
                } else {
                    0
                };
                let hi = if range.end.node == node {
                    range.end.offset.min(len)
                } else {
                    len
                };
                (lo < hi).then_some((node, lo..hi))
            })
            .collect()
    }

    /// The text a range covers
    pub fn range_text(&self, range: &TextRange) -> String {
        self.covered_text(range)
            .into_iter()
            .filter_map(|(node, span)| {
                self.text(node)
                    .map(|t| t.chars().skip(span.start).take(span.len()).collect::<String>())
            })
            .collect()
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(node).iter().rev().copied());
        Some(node)
    }
}

pub(crate) fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
