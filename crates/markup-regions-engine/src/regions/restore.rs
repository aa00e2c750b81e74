use crate::regions::record::{RecordError, RegionRecord};
use crate::regions::region::{LabelState, Region, RegionId};
use crate::regions::store::RegionStore;

/// The control a record was produced by (its `from_name` side)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDescriptor {
    pub name: String,
    pub kind: String,
}

impl ControlDescriptor {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Descriptor naming the record's own control
    pub fn of(record: &RegionRecord) -> Self {
        Self::new(record.from_name.clone(), record.kind.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A region now waits in the store for the next bind
    Pending(RegionId),
    /// The record belongs to a flat control and was handed to it
    Delegated,
}

/// Restore path for controls whose value is not a document span.
pub trait RecordDelegate {
    fn handles(&self, control: &ControlDescriptor) -> bool;

    fn restore(&mut self, record: &RegionRecord);
}

/// Delegate matching flat controls by kind. Records it takes are kept so the
/// embedding application can feed them to the matching control.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatKinds {
    kinds: Vec<String>,
    restored: Vec<RegionRecord>,
}

impl FlatKinds {
    pub fn new(kinds: impl IntoIterator<Item = String>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            restored: Vec::new(),
        }
    }

    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    pub fn restored(&self) -> &[RegionRecord] {
        &self.restored
    }
}

impl Default for FlatKinds {
    fn default() -> Self {
        Self::new(["textarea", "choices"].map(String::from))
    }
}

impl RecordDelegate for FlatKinds {
    fn handles(&self, control: &ControlDescriptor) -> bool {
        self.kinds.iter().any(|k| *k == control.kind)
    }

    fn restore(&mut self, record: &RegionRecord) {
        self.restored.push(record.clone());
    }
}

/// Create the logical side of a persisted region without touching any tree.
///
/// Records sharing an id come from one region and restore into it, each
/// adding its label state.
pub fn restore_record(
    store: &mut RegionStore,
    record: &RegionRecord,
    control: &ControlDescriptor,
    delegate: &mut dyn RecordDelegate,
) -> Result<RestoreOutcome, RecordError> {
    if delegate.handles(control) {
        log::debug!("Record {} delegated to {} control {}", record.id, control.kind, control.name);
        delegate.restore(record);
        return Ok(RestoreOutcome::Delegated);
    }

    let anchor = record.anchor()?;
    let state = (!record.is_bare()).then(|| {
        LabelState::new(
            control.name.clone(),
            control.kind.clone(),
            record.selected(&control.kind),
        )
    });

    if let Some(existing) = store
        .iter_mut()
        .find(|r| r.pid == record.id && r.anchor == anchor)
    {
        if let Some(state) = state {
            existing.label_states.push(state);
        }
        return Ok(RestoreOutcome::Pending(existing.id));
    }

    let region = Region::new(anchor, "", state.into_iter().collect())
        .with_pid(record.id.clone())
        .with_normalization(record.normalization.clone());
    let id = region.id;
    store.add(region).map_err(|e| RecordError::Malformed {
        id: record.id.clone(),
        reason: e.to_string(),
    })?;
    Ok(RestoreOutcome::Pending(id))
}
