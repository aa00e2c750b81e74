//! Anchoring, highlighting and persistence of regions inside a markup tree.
//!
//! - [`dom`]: the live tree ranges point into
//! - [`anchoring`]: boundary splitting plus capture/resolve of portable anchors
//! - [`highlight`]: marker elements painting a range
//! - [`regions`]: the region store and its record format
//! - [`session`]: sequencing of all of the above for one mounted document

pub mod anchoring;
pub mod dom;
pub mod highlight;
pub mod regions;
pub mod session;

pub use anchoring::{
    Anchor, AnchorResolutionError, Captured, NodePath, RangeAnchorer, split_boundaries,
};
pub use dom::{Document, DomError, NodeId, NodeKind, Position, TextRange};
pub use highlight::{HighlightError, HighlightRenderer, MarkerHandle, MarkerStyle, Rgba};
pub use regions::{
    ControlDescriptor, DocumentOrigin, FlatKinds, LabelState, LabelStateSource, RecordDelegate,
    RecordError, RegionRecord, Region, RegionId, RegionStore, RestoreOutcome, records_from_json,
    records_to_json,
};
pub use session::{
    BindError, BindReport, HighlightConfig, SelectionOutcome, Session, SessionError,
};
