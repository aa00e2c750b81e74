use std::cmp::Ordering;

use crate::anchoring::path::{LogicalChild, NodePath, locate, logical_children};
use crate::anchoring::splitter::{SplitPoint, split_boundaries_tracked};
use crate::dom::{Document, NodeId, Position, TextRange};

/// Portable description of a range, independent of live node references.
///
/// Offsets are char offsets into the logical text run each path names, and
/// are only meaningful against the document render that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Anchor {
    pub start: NodePath,
    pub start_offset: usize,
    pub end: NodePath,
    pub end_offset: usize,
}

impl Anchor {
    pub fn new(start: NodePath, start_offset: usize, end: NodePath, end_offset: usize) -> Self {
        Self {
            start,
            start_offset,
            end,
            end_offset,
        }
    }

    /// Exact tuple comparison used for region lookup
    pub fn matches(
        &self,
        start: &NodePath,
        start_offset: usize,
        end: &NodePath,
        end_offset: usize,
    ) -> bool {
        self.start == *start
            && self.start_offset == start_offset
            && self.end == *end
            && self.end_offset == end_offset
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AnchorResolutionError {
    #[error("Empty path cannot address a text run")]
    EmptyPath,
    #[error("Path {path} step {depth} is {index} but only {len} logical children exist")]
    StepOutOfRange {
        path: NodePath,
        depth: usize,
        index: usize,
        len: usize,
    },
    #[error("Path {path} step {depth} lands on text before the path ends")]
    NotAnElement { path: NodePath, depth: usize },
    #[error("Path {path} ends on an element instead of text")]
    NotText { path: NodePath },
    #[error("Offset {offset} exceeds text run length {len} at {path}")]
    OffsetOutOfRange {
        path: NodePath,
        offset: usize,
        len: usize,
    },
    #[error("Anchor resolves to an end before its start")]
    Inverted,
}

/// Result of capturing one live range
#[derive(Debug, Clone, PartialEq)]
pub enum Captured {
    /// The range intersected the root. `range` is the boundary-split live
    /// range the anchor describes.
    Anchored { anchor: Anchor, range: TextRange },
    /// The range missed the root (or covered no text). Handed back untouched
    /// so the caller can restore its selection.
    Rejected(TextRange),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Bias {
    /// Prefer the start of the later node at a seam
    Forward,
    /// Prefer the end of the earlier node at a seam
    Backward,
}

/// Converts between live ranges and [`Anchor`]s relative to a root.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeAnchorer {
    marker_class: String,
    adjust_selection: bool,
}

impl RangeAnchorer {
    pub fn new(marker_class: impl Into<String>) -> Self {
        Self {
            marker_class: marker_class.into(),
            adjust_selection: false,
        }
    }

    /// Snap partial-word endpoints out to whole words while capturing
    pub fn with_word_snapping(mut self, enabled: bool) -> Self {
        self.adjust_selection = enabled;
        self
    }

    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    /// Capture each live range as an anchor, splitting the tree at its
    /// boundaries. Ranges are consumed lazily, one per `next` call.
    pub fn capture<'a, I>(
        &'a self,
        doc: &'a mut Document,
        root: NodeId,
        ranges: I,
    ) -> Capture<'a, I::IntoIter>
    where
        I: IntoIterator<Item = TextRange>,
    {
        Capture {
            anchorer: self,
            doc,
            root,
            ranges: ranges.into_iter(),
            splits: Vec::new(),
        }
    }

    fn capture_one(
        &self,
        doc: &mut Document,
        root: NodeId,
        range: TextRange,
        splits: &mut Vec<SplitPoint>,
    ) -> Captured {
        // Carry the range across splits made for earlier ranges
        let range = splits.iter().fold(range, |r, point| point.map_range(r));
        match self.clip(doc, root, range) {
            Some(clipped) => match self.anchor_for(doc, root, clipped, splits) {
                Some(captured) => captured,
                None => Captured::Rejected(range),
            },
            None => {
                log::debug!("Selection {range:?} does not intersect root {root:?}");
                Captured::Rejected(range)
            }
        }
    }

    fn anchor_for(
        &self,
        doc: &mut Document,
        root: NodeId,
        clipped: TextRange,
        splits: &mut Vec<SplitPoint>,
    ) -> Option<Captured> {
        let split = split_boundaries_tracked(doc, clipped, splits).ok()?;
        let (start, start_offset) = locate(
            doc,
            root,
            split.start.node,
            split.start.offset,
            &self.marker_class,
        )?;
        let (end, end_offset) = locate(
            doc,
            root,
            split.end.node,
            split.end.offset,
            &self.marker_class,
        )?;

        let anchor = Anchor::new(start, start_offset, end, end_offset);
        log::debug!("Captured anchor {anchor:?}");
        Some(Captured::Anchored {
            anchor,
            range: split,
        })
    }

    /// Order, truncate to `root`, move to text positions and drop empty
    /// ranges. `None` means the range is rejected.
    fn clip(&self, doc: &Document, root: NodeId, range: TextRange) -> Option<TextRange> {
        let (mut start, mut end) = (range.start, range.end);
        if doc.compare_positions(start, end) == Ordering::Greater {
            std::mem::swap(&mut start, &mut end);
        }

        let start_inside = doc.contains(root, start.node);
        let end_inside = doc.contains(root, end.node);
        match (start_inside, end_inside) {
            (false, false) => return None,
            (false, true) => start = Position::new(root, 0),
            (true, false) => end = Position::new(root, doc.children(root).len()),
            (true, true) => {}
        }

        let mut start = text_position(doc, root, start, Bias::Forward)?;
        let mut end = text_position(doc, root, end, Bias::Backward)?;

        if self.adjust_selection {
            start = snap_to_word(doc, start, Bias::Backward);
            end = snap_to_word(doc, end, Bias::Forward);
        }

        let clipped = TextRange::new(start, end);
        if doc.compare_positions(start, end) != Ordering::Less
            || doc.range_text(&clipped).is_empty()
        {
            return None;
        }
        Some(clipped)
    }

    /// Re-locate an anchor inside the current tree under `root`.
    pub fn resolve(
        &self,
        doc: &Document,
        root: NodeId,
        anchor: &Anchor,
    ) -> Result<TextRange, AnchorResolutionError> {
        let start = self.resolve_point(
            doc,
            root,
            &anchor.start,
            anchor.start_offset,
            Bias::Forward,
        )?;
        let end = self.resolve_point(
            doc,
            root,
            &anchor.end,
            anchor.end_offset,
            Bias::Backward,
        )?;

        if doc.compare_positions(start, end) == Ordering::Greater {
            return Err(AnchorResolutionError::Inverted);
        }
        Ok(TextRange::new(start, end))
    }

    fn resolve_point(
        &self,
        doc: &Document,
        root: NodeId,
        path: &NodePath,
        offset: usize,
        bias: Bias,
    ) -> Result<Position, AnchorResolutionError> {
        let (last, parents) = path
            .steps()
            .split_last()
            .ok_or(AnchorResolutionError::EmptyPath)?;

        let mut container = root;
        for (depth, &index) in parents.iter().enumerate() {
            match self.child_at(doc, container, path, depth, index)? {
                LogicalChild::Element(element) => container = element,
                LogicalChild::Text(_) => {
                    return Err(AnchorResolutionError::NotAnElement {
                        path: path.clone(),
                        depth,
                    });
                }
            }
        }

        match self.child_at(doc, container, path, parents.len(), *last)? {
            LogicalChild::Text(run) => point_in_run(doc, &run, path, offset, bias),
            LogicalChild::Element(_) => Err(AnchorResolutionError::NotText { path: path.clone() }),
        }
    }

    fn child_at(
        &self,
        doc: &Document,
        container: NodeId,
        path: &NodePath,
        depth: usize,
        index: usize,
    ) -> Result<LogicalChild, AnchorResolutionError> {
        let mut children = logical_children(doc, container, &self.marker_class);
        let len = children.len();
        if index >= len {
            return Err(AnchorResolutionError::StepOutOfRange {
                path: path.clone(),
                depth,
                index,
                len,
            });
        }
        Ok(children.swap_remove(index))
    }
}

fn point_in_run(
    doc: &Document,
    run: &[NodeId],
    path: &NodePath,
    offset: usize,
    bias: Bias,
) -> Result<Position, AnchorResolutionError> {
    let total: usize = run.iter().map(|&n| doc.char_len(n)).sum();
    if offset > total {
        return Err(AnchorResolutionError::OffsetOutOfRange {
            path: path.clone(),
            offset,
            len: total,
        });
    }

    let mut before = 0;
    for &node in run {
        let len = doc.char_len(node);
        let hit = match bias {
            Bias::Forward => offset >= before && offset < before + len,
            Bias::Backward => offset > before && offset <= before + len,
        };
        if hit {
            return Ok(Position::new(node, offset - before));
        }
        before += len;
    }

    // Only the run's outer edges are left: offset 0 going backward, or the
    // full length going forward
    let fallback = match bias {
        Bias::Forward => run.last().map(|&n| Position::new(n, doc.char_len(n))),
        Bias::Backward => run.first().map(|&n| Position::new(n, 0)),
    };
    fallback.ok_or(AnchorResolutionError::NotText { path: path.clone() })
}

/// Move a boundary point onto a text node, looking forward for starts and
/// backward for ends. `None` when no text lies in that direction under root.
fn text_position(doc: &Document, root: NodeId, pos: Position, bias: Bias) -> Option<Position> {
    if doc.is_text(pos.node) {
        return Some(pos);
    }

    let texts = doc.text_nodes(root);
    match bias {
        Bias::Forward => texts
            .into_iter()
            .find(|&t| doc.compare_positions(Position::new(t, 0), pos) != Ordering::Less)
            .map(|t| Position::new(t, 0)),
        Bias::Backward => texts
            .into_iter()
            .rev()
            .map(|t| Position::new(t, doc.char_len(t)))
            .find(|&p| doc.compare_positions(p, pos) != Ordering::Greater),
    }
}

/// Widen a text position to the nearest word edge inside its own node.
/// `Backward` moves a start left, `Forward` moves an end right.
fn snap_to_word(doc: &Document, pos: Position, direction: Bias) -> Position {
    let Some(text) = doc.text(pos.node) else {
        return pos;
    };
    let chars: Vec<char> = text.chars().collect();
    let is_word = |i: usize| chars.get(i).is_some_and(|c| c.is_alphanumeric());

    let mut offset = pos.offset.min(chars.len());
    if offset == 0 || offset == chars.len() || !(is_word(offset - 1) && is_word(offset)) {
        return Position::new(pos.node, offset);
    }
    match direction {
        Bias::Backward => {
            while offset > 0 && is_word(offset - 1) {
                offset -= 1;
            }
        }
        Bias::Forward => {
            while offset < chars.len() && is_word(offset) {
                offset += 1;
            }
        }
    }
    Position::new(pos.node, offset)
}

/// Lazy capture over a sequence of live ranges.
///
/// Each input range is consumed exactly once; the sequence cannot be
/// restarted. Ranges still waiting are kept live across the splits earlier
/// ranges cause.
pub struct Capture<'a, I> {
    anchorer: &'a RangeAnchorer,
    doc: &'a mut Document,
    root: NodeId,
    ranges: I,
    splits: Vec<SplitPoint>,
}

impl<I> Iterator for Capture<'_, I>
where
    I: Iterator<Item = TextRange>,
{
    type Item = Captured;

    fn next(&mut self) -> Option<Captured> {
        let range = self.ranges.next()?;
        Some(self.anchorer.capture_one(self.doc, self.root, range, &mut self.splits))
    }
}
