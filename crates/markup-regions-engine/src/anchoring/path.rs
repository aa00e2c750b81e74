//! Structural addresses over the logical view of a tree.
//!
//! The logical view hides everything a highlight pass can introduce:
//!
//! - marker elements are transparent, their children count as children of
//!   the marker's parent
//! - comments are skipped
//! - consecutive text nodes collapse into one text run
//!
//! So a path taken from a split, partly highlighted tree addresses the same
//! place in a fresh render of that document. The last step of a path always
//! names a text run; the anchor offset is a char offset into that run.

use std::fmt;
use std::str::FromStr;

use crate::dom::{Document, NodeId, NodeKind};

/// Child-index path from a root to a logical text run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn new(steps: Vec<usize>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[usize] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(steps: Vec<usize>) -> Self {
        Self(steps)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for step in &self.0 {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid node path {0:?}: expected \"/\" or \"/<index>/<index>...\"")]
pub struct PathParseError(pub String);

impl FromStr for NodePath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| PathParseError(s.to_string()))?;
        if rest.is_empty() {
            return Ok(Self::default());
        }
        rest.split('/')
            .map(|step| step.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(|_| PathParseError(s.to_string()))
    }
}

/// One entry in an element's logical child list
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LogicalChild {
    Element(NodeId),
    /// Physical text nodes making up one run, in order
    Text(Vec<NodeId>),
}

pub(crate) fn is_marker(doc: &Document, node: NodeId, marker_class: &str) -> bool {
    doc.is_element(node) && doc.has_class(node, marker_class)
}

pub(crate) fn logical_children(
    doc: &Document,
    parent: NodeId,
    marker_class: &str,
) -> Vec<LogicalChild> {
    let mut out = Vec::new();
    collect_logical(doc, parent, marker_class, &mut out);
    out
}

fn collect_logical(
    doc: &Document,
    parent: NodeId,
    marker_class: &str,
    out: &mut Vec<LogicalChild>,
) {
    for &child in doc.children(parent) {
        match doc.kind(child) {
            Some(NodeKind::Text(_)) => match out.last_mut() {
                Some(LogicalChild::Text(run)) => run.push(child),
                _ => out.push(LogicalChild::Text(vec![child])),
            },
            Some(NodeKind::Element { .. }) if is_marker(doc, child, marker_class) => {
                collect_logical(doc, child, marker_class, out);
            }
            Some(NodeKind::Element { .. }) => out.push(LogicalChild::Element(child)),
            Some(NodeKind::Comment(_)) | None => {}
        }
    }
}

/// Address of a text node position relative to `root`.
///
/// Returns `None` when `node` is not a text node below `root`.
pub(crate) fn locate(
    doc: &Document,
    root: NodeId,
    node: NodeId,
    offset: usize,
    marker_class: &str,
) -> Option<(NodePath, usize)> {
    if !doc.is_text(node) || node == root || !doc.contains(root, node) {
        return None;
    }

    // Structural containers between root and the text node, outermost first
    let mut containers = Vec::new();
    let mut current = doc.parent(node)?;
    while current != root {
        if !is_marker(doc, current, marker_class) {
            containers.push(current);
        }
        current = doc.parent(current)?;
    }
    containers.push(root);
    containers.reverse();

    let mut steps = Vec::with_capacity(containers.len());
    for pair in containers.windows(2) {
        let index = logical_children(doc, pair[0], marker_class)
            .iter()
            .position(|child| *child == LogicalChild::Element(pair[1]))?;
        steps.push(index);
    }

    let container = *containers.last()?;
    let children = logical_children(doc, container, marker_class);
    for (index, child) in children.iter().enumerate() {
        if let LogicalChild::Text(run) = child
            && let Some(pos) = run.iter().position(|&n| n == node)
        {
            let before: usize = run[..pos].iter().map(|&n| doc.char_len(n)).sum();
            steps.push(index);
            return Some((NodePath(steps), before + offset));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("/", vec![])]
    #[case("/0", vec![0])]
    #[case("/1/0/12", vec![1, 0, 12])]
    fn path_strings_round_trip(#[case] text: &str, #[case] steps: Vec<usize>) {
        let path: NodePath = text.parse().unwrap();
        assert_eq!(path.steps(), steps.as_slice());
        assert_eq!(path.to_string(), text);
    }

    #[rstest]
    #[case("")]
    #[case("0/1")]
    #[case("/a")]
    #[case("/1//2")]
    fn malformed_path_strings(#[case] text: &str) {
        assert!(text.parse::<NodePath>().is_err());
    }

    #[test]
    fn markers_and_comments_are_transparent() {
        let doc = Document::parse_html(
            "<div>ab<span class=\"hl\">cd</span><!-- x -->ef<p>g</p></div>",
        );
        let div = doc.first_element().unwrap();

        let children = logical_children(&doc, div, "hl");

        assert_eq!(children.len(), 2);
        match &children[0] {
            LogicalChild::Text(run) => assert_eq!(run.len(), 3),
            other => panic!("expected text run, got {other:?}"),
        }
        assert!(matches!(children[1], LogicalChild::Element(_)));
    }

    #[test]
    fn locate_counts_offset_across_run() {
        let doc = Document::parse_html("<div>ab<span class=\"hl\">cd</span>ef</div>");
        let div = doc.first_element().unwrap();
        let last_text = *doc.children(div).last().unwrap();

        assert_eq!(
            locate(&doc, div, last_text, 1, "hl"),
            Some((NodePath::new(vec![0]), 5))
        );
    }

    #[test]
    fn locate_nested_element() {
        let doc = Document::parse_html("<div>intro<p>one <b>two</b></p></div>");
        let div = doc.first_element().unwrap();
        let p = doc.children(div)[1];
        let b = doc.children(p)[1];
        let two = doc.children(b)[0];

        assert_eq!(
            locate(&doc, div, two, 2, "hl"),
            Some((NodePath::new(vec![1, 1, 0]), 2))
        );
    }

    #[test]
    fn locate_outside_root_is_none() {
        let doc = Document::parse_html("<div>in</div>out");
        let div = doc.first_element().unwrap();
        let outside = doc.children(doc.top())[1];

        assert_eq!(locate(&doc, div, outside, 0, "hl"), None);
    }
}
