use std::fmt;

use uuid::Uuid;

use crate::anchoring::Anchor;
use crate::highlight::{MarkerHandle, Rgba};

/// Session-local identity of a region
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(Uuid);

impl RegionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Snapshot of an externally owned label control, taken when a region is
/// created. `name` is the lookup key back to the control.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelState {
    pub name: String,
    pub kind: String,
    pub selected: Vec<String>,
}

impl LabelState {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, selected: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            selected,
        }
    }
}

/// The label taxonomy as seen from the engine.
pub trait LabelStateSource {
    /// Label states currently active in the label panel, in panel order
    fn active_states(&self) -> Vec<LabelState>;

    /// CSS color used to paint regions carrying `state`
    fn selected_color(&self, state: &LabelState) -> Option<String>;

    /// Reset the panel once a region has taken its snapshot
    fn unselect_all(&mut self) {}
}

/// An anchored span with its attached label states and, while bound, the
/// markers painting it.
#[derive(Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    /// Persisted id, shared by every record this region serializes to
    pub pid: String,
    pub anchor: Anchor,
    pub text: String,
    pub label_states: Vec<LabelState>,
    pub normalization: Option<String>,
    markers: MarkerHandle,
    color: Option<Rgba>,
    selected: bool,
    highlighted: bool,
}

impl Region {
    pub fn new(anchor: Anchor, text: impl Into<String>, label_states: Vec<LabelState>) -> Self {
        let id = RegionId::new();
        Self {
            id,
            pid: id.to_string(),
            anchor,
            text: text.into(),
            label_states,
            normalization: None,
            markers: MarkerHandle::default(),
            color: None,
            selected: false,
            highlighted: false,
        }
    }

    pub fn with_pid(mut self, pid: impl Into<String>) -> Self {
        self.pid = pid.into();
        self
    }

    pub fn with_normalization(mut self, normalization: Option<String>) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn markers(&self) -> &MarkerHandle {
        &self.markers
    }

    pub fn is_bound(&self) -> bool {
        !self.markers.is_empty()
    }

    /// Take ownership of freshly rendered markers
    pub fn bind(&mut self, markers: MarkerHandle) {
        self.markers = markers;
    }

    /// Hand the markers back for unwrapping, leaving the region unbound
    pub fn release(&mut self) -> MarkerHandle {
        std::mem::take(&mut self.markers)
    }

    /// Base color of the markers, before any opacity is applied
    pub fn color(&self) -> Option<Rgba> {
        self.color
    }

    pub(crate) fn set_color(&mut self, color: Option<Rgba>) {
        self.color = color;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn set_highlighted(&mut self, highlighted: bool) {
        self.highlighted = highlighted;
    }

    /// True when the region carries no label state of its own
    pub fn is_bare(&self) -> bool {
        self.label_states.is_empty()
    }
}
