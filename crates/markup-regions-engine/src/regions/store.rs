use crate::anchoring::NodePath;
use crate::regions::region::{Region, RegionId};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Region {0} is already in the store")]
    DuplicateId(RegionId),
}

/// Regions in insertion order. Order decides marker nesting when regions
/// overlap, so it is preserved through every operation.
#[derive(Debug, Default, Clone)]
pub struct RegionStore {
    regions: Vec<Region>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, region: Region) -> Result<RegionId, StoreError> {
        let id = region.id;
        if self.get(id).is_some() {
            return Err(StoreError::DuplicateId(id));
        }
        self.regions.push(region);
        Ok(id)
    }

    /// Remove and return a region. Its markers are the caller's to unwrap.
    pub fn remove(&mut self, id: RegionId) -> Option<Region> {
        let index = self.regions.iter().position(|r| r.id == id)?;
        Some(self.regions.remove(index))
    }

    /// First region whose anchor is exactly this tuple
    pub fn find(
        &self,
        start: &NodePath,
        start_offset: usize,
        end: &NodePath,
        end_offset: usize,
    ) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.anchor.matches(start, start_offset, end, end_offset))
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Region> {
        self.regions.iter_mut()
    }

    pub fn ids(&self) -> Vec<RegionId> {
        self.regions.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
