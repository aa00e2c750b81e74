use crate::anchoring::needs_split;
use crate::dom::{Document, DomError, NodeId, TextRange};
use crate::highlight::color::Rgba;

pub const MARKER_TAG: &str = "span";
pub const REGION_ATTR: &str = "data-region";

/// Presentation applied to every marker of one render call
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarkerStyle {
    pub background_color: Option<Rgba>,
}

impl MarkerStyle {
    pub fn background(color: Rgba) -> Self {
        Self {
            background_color: Some(color),
        }
    }

    pub fn to_css(&self) -> String {
        match self.background_color {
            Some(color) => format!("background-color: {}", color.to_css()),
            None => String::new(),
        }
    }
}

/// Ownership handle for the markers one render call created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerHandle {
    markers: Vec<NodeId>,
}

impl MarkerHandle {
    pub fn markers(&self) -> &[NodeId] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HighlightError {
    #[error("Boundary at offset {offset} of {node:?} was never split")]
    StructuralMutationConflict { node: NodeId, offset: usize },
    #[error("Node {0:?} is not a marker element")]
    NotAMarker(NodeId),
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Wraps boundary-aligned ranges in marker elements and takes them out again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRenderer {
    marker_class: String,
}

impl HighlightRenderer {
    pub fn new(marker_class: impl Into<String>) -> Self {
        Self {
            marker_class: marker_class.into(),
        }
    }

    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    /// Wrap every text node inside `range` in its own marker element.
    ///
    /// Both endpoints must already sit on node boundaries. Text already inside
    /// another region's marker gets a nested marker; nothing else in the tree
    /// moves. Whitespace-only text nodes are left unwrapped.
    pub fn render(
        &self,
        doc: &mut Document,
        range: &TextRange,
        owner: &str,
        style: &MarkerStyle,
    ) -> Result<MarkerHandle, HighlightError> {
        for point in [range.start, range.end] {
            if needs_split(doc, point) {
                return Err(HighlightError::StructuralMutationConflict {
                    node: point.node,
                    offset: point.offset,
                });
            }
        }

        let targets: Vec<NodeId> = doc
            .covered_text(range)
            .into_iter()
            .map(|(node, _)| node)
            .filter(|&node| doc.text(node).is_some_and(|t| !t.trim().is_empty()))
            .collect();

        let mut markers = Vec::with_capacity(targets.len());
        for node in targets {
            let Some(parent) = doc.parent(node) else {
                continue;
            };
            let marker = self.create_marker(doc, owner, style);
            doc.insert_before(parent, marker, Some(node))?;
            doc.append_child(marker, node)?;
            markers.push(marker);
        }

        log::debug!("Rendered {} markers for {owner}", markers.len());
        Ok(MarkerHandle { markers })
    }

    /// Change marker presentation in place; the tree shape is untouched.
    pub fn restyle(
        &self,
        doc: &mut Document,
        handle: &MarkerHandle,
        style: &MarkerStyle,
    ) -> Result<(), HighlightError> {
        let css = style.to_css();
        for &marker in handle.markers() {
            if css.is_empty() {
                doc.remove_attr(marker, "style")?;
            } else {
                doc.set_attr(marker, "style", css.as_str())?;
            }
        }
        Ok(())
    }

    /// Remove the handle's markers, moving their children back into the
    /// marker's place. Markers of other regions nested inside move along with
    /// the content. Markers already detached are skipped.
    pub fn unwrap(&self, doc: &mut Document, handle: &MarkerHandle) -> Result<(), HighlightError> {
        if let Some(&foreign) = handle
            .markers()
            .iter()
            .find(|&&m| !doc.is_element(m) || !doc.has_class(m, &self.marker_class))
        {
            return Err(HighlightError::NotAMarker(foreign));
        }

        for &marker in handle.markers() {
            let Some(parent) = doc.parent(marker) else {
                continue;
            };
            let children = doc.children(marker).to_vec();
            for child in children {
                doc.insert_before(parent, child, Some(marker))?;
            }
            doc.detach(marker)?;
        }
        Ok(())
    }

    fn create_marker(&self, doc: &mut Document, owner: &str, style: &MarkerStyle) -> NodeId {
        let mut attrs = vec![
            ("class".to_string(), self.marker_class.clone()),
            (REGION_ATTR.to_string(), owner.to_string()),
        ];
        let css = style.to_css();
        if !css.is_empty() {
            attrs.push(("style".to_string(), css));
        }
        doc.create_element(MARKER_TAG, attrs)
    }
}
