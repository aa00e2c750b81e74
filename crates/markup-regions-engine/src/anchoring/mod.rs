//! Translating between live ranges and portable anchors.
//!
//! - **`splitter`**: splits text nodes so range endpoints land on node edges
//! - **`path`**: the logical addressing scheme anchors are written in
//! - **`anchorer`**: capture (live range to anchor) and resolve (anchor to
//!   live range)
//!
//! ## Addressing scheme
//!
//! Paths are child indices over a logical view of the tree in which
//! highlight markers are transparent, comments are skipped and adjacent text
//! nodes form one run. Splitting and highlighting therefore never change an
//! anchor. An anchor stops resolving when the element structure on its path
//! changes: a step past the last logical child, a step that lands on text
//! early, or an offset past the end of the run. Each case surfaces as an
//! [`AnchorResolutionError`] for that anchor alone.

pub mod anchorer;
pub mod path;
pub mod splitter;

pub use anchorer::{Anchor, AnchorResolutionError, Capture, Captured, RangeAnchorer};
pub use path::{NodePath, PathParseError};
pub use splitter::{SplitPoint, needs_split, split_boundaries, split_boundaries_tracked};
