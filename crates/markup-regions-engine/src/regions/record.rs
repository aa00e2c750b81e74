use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::anchoring::{Anchor, NodePath};
use crate::regions::region::{LabelState, Region};
use crate::regions::store::RegionStore;

/// Record type of a region with no label state attached
pub const BARE_REGION_KIND: &str = "htmlregion";

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Malformed record '{id}': {reason}")]
    Malformed { id: String, reason: String },
    #[error("Invalid record batch: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted form of one region/label-state pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: String,
    pub from_name: String,
    pub to_name: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: RecordValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordValue {
    pub start_offset: usize,
    pub end_offset: usize,
    pub start: String,
    pub end: String,
    /// Selected values keyed by label-state kind
    #[serde(flatten)]
    pub labels: BTreeMap<String, Value>,
}

impl RegionRecord {
    /// Parse and validate one record. Missing anchor fields or unparsable
    /// paths are [`RecordError::Malformed`].
    pub fn from_json(value: Value) -> Result<Self, RecordError> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let record: Self = serde_json::from_value(value).map_err(|e| RecordError::Malformed {
            id,
            reason: e.to_string(),
        })?;
        record.anchor()?;
        Ok(record)
    }

    pub fn anchor(&self) -> Result<Anchor, RecordError> {
        let parse = |path: &str| {
            path.parse::<NodePath>()
                .map_err(|e| RecordError::Malformed {
                    id: self.id.clone(),
                    reason: e.to_string(),
                })
        };
        Ok(Anchor::new(
            parse(&self.value.start)?,
            self.value.start_offset,
            parse(&self.value.end)?,
            self.value.end_offset,
        ))
    }

    /// Selected values stored under `kind`, ignoring non-string entries
    pub fn selected(&self, kind: &str) -> Vec<String> {
        self.value
            .labels
            .get(kind)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_bare(&self) -> bool {
        self.kind == BARE_REGION_KIND
    }
}

/// The document field regions belong to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentOrigin {
    pub name: String,
    pub source: String,
}

impl DocumentOrigin {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Records for every region in store order: one per attached label state,
/// or a single bare record for a region without any.
pub fn to_records<'a>(
    store: &'a RegionStore,
    origin: &'a DocumentOrigin,
) -> impl Iterator<Item = RegionRecord> + 'a {
    store
        .iter()
        .flat_map(move |region| region_records(region, origin))
}

fn region_records(region: &Region, origin: &DocumentOrigin) -> Vec<RegionRecord> {
    let base = |from_name: &str, kind: &str| RegionRecord {
        id: region.pid.clone(),
        from_name: from_name.to_string(),
        to_name: origin.name.clone(),
        source: origin.source.clone(),
        kind: kind.to_string(),
        value: RecordValue {
            start_offset: region.anchor.start_offset,
            end_offset: region.anchor.end_offset,
            start: region.anchor.start.to_string(),
            end: region.anchor.end.to_string(),
            labels: BTreeMap::new(),
        },
        normalization: region.normalization.clone(),
    };

    if region.label_states.is_empty() {
        return vec![base(&origin.name, BARE_REGION_KIND)];
    }

    region
        .label_states
        .iter()
        .map(|state: &LabelState| {
            let mut record = base(&state.name, &state.kind);
            record
                .value
                .labels
                .insert(state.kind.clone(), Value::from(state.selected.clone()));
            record
        })
        .collect()
}

pub fn records_to_json(records: &[RegionRecord]) -> Result<String, RecordError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Parse a JSON array of records. The outer `Err` is for input that is not
/// an array at all; each element gets its own result.
pub fn records_from_json(
    json: &str,
) -> Result<Vec<Result<RegionRecord, RecordError>>, RecordError> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    Ok(values.into_iter().map(RegionRecord::from_json).collect())
}
