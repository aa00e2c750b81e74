//! Marker rendering for captured ranges.
//!
//! Every text node inside a region's range gets its own marker element, so
//! a region spanning several blocks never re-parents a block. Overlapping
//! regions nest their markers; removing one region leaves the others intact.

pub mod color;
pub mod renderer;

pub use color::{ColorError, Rgba, change_alpha};
pub use renderer::{
    HighlightError, HighlightRenderer, MARKER_TAG, MarkerHandle, MarkerStyle, REGION_ATTR,
};
