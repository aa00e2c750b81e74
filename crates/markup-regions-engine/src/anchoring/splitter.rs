//! Boundary splitting.
//!
//! Wrapping a highlight around an exact span needs both ends of the span to
//! sit on node edges. [`split_boundaries`] splits the text nodes under each
//! endpoint so that holds, touching nothing else.

use std::cmp::Ordering;

use crate::dom::{Document, DomError, NodeId, Position, TextRange};

/// One text node split performed by [`split_boundaries_tracked`].
///
/// Live boundary points taken before the split can be carried across it
/// with [`SplitPoint::map`], the way a browser updates live ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPoint {
    pub node: NodeId,
    pub offset: usize,
    pub tail: NodeId,
    /// Parent of `node` and the index `tail` was inserted at
    pub parent: Option<(NodeId, usize)>,
}

impl SplitPoint {
    /// Where `pos` lives after this split
    pub fn map(&self, pos: Position) -> Position {
        if pos.node == self.node && pos.offset > self.offset {
            return Position::new(self.tail, pos.offset - self.offset);
        }
        match self.parent {
            Some((parent, index)) if pos.node == parent && pos.offset >= index => {
                Position::new(parent, pos.offset + 1)
            }
            _ => pos,
        }
    }

    pub fn map_range(&self, range: TextRange) -> TextRange {
        TextRange::new(self.map(range.start), self.map(range.end))
    }
}

/// Split text nodes so both endpoints of `range` fall on node boundaries.
///
/// Returns the equivalent range over the split nodes: the start becomes
/// offset 0 of its node and the end becomes the full length of its node.
/// Endpoints already on a boundary (and element endpoints) are left alone,
/// so splitting an aligned range is a no-op. A reversed range is ordered
/// first.
pub fn split_boundaries(doc: &mut Document, range: TextRange) -> Result<TextRange, DomError> {
    split_boundaries_tracked(doc, range, &mut Vec::new())
}

/// [`split_boundaries`], appending every split it performs to `splits` in
/// the order they happened.
pub fn split_boundaries_tracked(
    doc: &mut Document,
    range: TextRange,
    splits: &mut Vec<SplitPoint>,
) -> Result<TextRange, DomError> {
    let TextRange { mut start, mut end } = range;
    if doc.compare_positions(start, end) == Ordering::Greater {
        std::mem::swap(&mut start, &mut end);
    }

    // End first so a start in the same node keeps a valid offset
    if needs_split(doc, end) {
        split_at(doc, end, splits)?;
    }

    if needs_split(doc, start) {
        let point = split_at(doc, start, splits)?;
        end = point.map(end);
        start = Position::new(point.tail, 0);
    }

    Ok(TextRange { start, end })
}

fn split_at(
    doc: &mut Document,
    pos: Position,
    splits: &mut Vec<SplitPoint>,
) -> Result<SplitPoint, DomError> {
    let tail = doc.split_text(pos.node, pos.offset)?;
    let parent = doc.parent(tail).zip(doc.index_in_parent(tail));
    let point = SplitPoint {
        node: pos.node,
        offset: pos.offset,
        tail,
        parent,
    };
    splits.push(point);
    Ok(point)
}

/// True when `pos` sits strictly inside a text node
pub fn needs_split(doc: &Document, pos: Position) -> bool {
    doc.is_text(pos.node) && pos.offset > 0 && pos.offset < doc.char_len(pos.node)
}
