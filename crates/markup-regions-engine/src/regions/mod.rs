//! Logical regions and their persisted form.
//!
//! A [`Region`] pairs an anchor with the label states snapshotted when it was
//! created. It only owns markers while bound to a mounted document.

pub mod record;
pub mod region;
pub mod restore;
pub mod store;

pub use record::{
    BARE_REGION_KIND, DocumentOrigin, RecordError, RecordValue, RegionRecord, records_from_json,
    records_to_json, to_records,
};
pub use region::{LabelState, LabelStateSource, Region, RegionId};
pub use restore::{ControlDescriptor, FlatKinds, RecordDelegate, RestoreOutcome, restore_record};
pub use store::{RegionStore, StoreError};
