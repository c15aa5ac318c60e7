//! Labeled sample ranges attached to a signal
//!
//! Regions live in a plain vector and are addressed by stable [`RegionId`]s.
//! Ordering by start position is restored lazily, only when a sorted view is
//! requested after a mutation.

use serde::{Deserialize, Serialize};
use sk_core::{SkError, SkResult};

use super::{Channels, Signal};

/// Stable handle to a region, unaffected by sorting or removal of others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRegion {
    pub id: RegionId,
    pub label: String,
    pub channels: Channels,
    /// First sample (inclusive)
    pub left: usize,
    /// Last sample (inclusive)
    pub right: usize,
    pub locked: bool,
}

impl SignalRegion {
    #[inline]
    pub fn len(&self) -> usize {
        self.right - self.left + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        (self.left..=self.right).contains(&pos)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RegionList {
    regions: Vec<SignalRegion>,
    next_id: u32,
    must_sort: bool,
}

fn clamp_bounds(left: usize, right: usize, last: Option<usize>) -> (usize, usize) {
    let (left, right) = if left <= right { (left, right) } else { (right, left) };
    let last = last.unwrap_or(0);
    (left.min(last), right.min(last))
}

impl RegionList {
    fn position(&self, id: RegionId) -> SkResult<usize> {
        self.regions
            .iter()
            .position(|r| r.id == id)
            .ok_or(SkError::InvalidRegion(id.0))
    }

    fn get_mut(&mut self, id: RegionId) -> SkResult<&mut SignalRegion> {
        let index = self.position(id)?;
        Ok(&mut self.regions[index])
    }

    pub(crate) fn clamp_all(&mut self, last: Option<usize>) {
        for region in &mut self.regions {
            (region.left, region.right) = clamp_bounds(region.left, region.right, last);
        }
    }

    /// Multiply every bound by `ratio`, then clamp
    pub(crate) fn rescale(&mut self, ratio: f64, last: Option<usize>) {
        for region in &mut self.regions {
            let left = (region.left as f64 * ratio).round() as usize;
            let right = (region.right as f64 * ratio).round() as usize;
            (region.left, region.right) = clamp_bounds(left, right, last);
        }
    }

    fn sort_if_needed(&mut self) {
        if self.must_sort {
            self.regions.sort_by_key(|r| (r.left, r.right, r.id));
            self.must_sort = false;
        }
    }
}

impl Signal {
    /// Add a region; bounds are swapped if reversed and clamped to the signal
    pub fn add_region(
        &mut self,
        label: impl Into<String>,
        channels: Channels,
        left: usize,
        right: usize,
    ) -> SkResult<RegionId> {
        channels.resolve(self.channel_count)?;

        let list = &mut self.regions;
        let id = RegionId(list.next_id);
        list.next_id = list.next_id.wrapping_add(1);

        let (left, right) = clamp_bounds(left, right, self.sample_count.checked_sub(1));
        list.regions.push(SignalRegion {
            id,
            label: label.into(),
            channels,
            left,
            right,
            locked: false,
        });
        list.must_sort = true;
        Ok(id)
    }

    pub fn region(&self, id: RegionId) -> Option<&SignalRegion> {
        self.regions.regions.iter().find(|r| r.id == id)
    }

    pub fn region_count(&self) -> usize {
        self.regions.regions.len()
    }

    /// Remove a region, returning it (locked regions cannot be removed)
    pub fn remove_region(&mut self, id: RegionId) -> SkResult<SignalRegion> {
        let index = self.regions.position(id)?;
        if self.regions.regions[index].locked {
            return Err(SkError::RegionLocked(id.0));
        }
        Ok(self.regions.regions.remove(index))
    }

    pub fn set_region_bounds(&mut self, id: RegionId, left: usize, right: usize) -> SkResult<()> {
        let last = self.last_sample_index();
        let region = self.regions.get_mut(id)?;
        if region.locked {
            return Err(SkError::RegionLocked(id.0));
        }
        (region.left, region.right) = clamp_bounds(left, right, last);
        self.regions.must_sort = true;
        Ok(())
    }

    pub fn set_region_label(&mut self, id: RegionId, label: impl Into<String>) -> SkResult<()> {
        let region = self.regions.get_mut(id)?;
        if region.locked {
            return Err(SkError::RegionLocked(id.0));
        }
        region.label = label.into();
        Ok(())
    }

    pub fn set_region_locked(&mut self, id: RegionId, locked: bool) -> SkResult<()> {
        self.regions.get_mut(id)?.locked = locked;
        Ok(())
    }

    /// All regions ordered by start position
    pub fn sorted_regions(&mut self) -> &[SignalRegion] {
        self.regions.sort_if_needed();
        &self.regions.regions
    }

    /// First region (in start order) containing `pos` on `channel`
    pub fn region_at(&mut self, channel: usize, pos: usize) -> Option<&SignalRegion> {
        self.regions.sort_if_needed();
        self.regions
            .regions
            .iter()
            .find(|r| r.channels.contains(channel) && r.contains(pos))
    }

    /// Remove every unlocked region
    pub fn clear_regions(&mut self) {
        self.regions.regions.retain(|r| r.locked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sk_core::DataType;

    fn signal() -> Signal {
        Signal::new(DataType::Float, 2, 100, 48000).unwrap()
    }

    #[test]
    fn test_bounds_are_clamped_and_ordered() {
        let mut s = signal();
        let id = s.add_region("intro", Channels::All, 150, 20).unwrap();
        let region = s.region(id).unwrap();
        assert_eq!((region.left, region.right), (20, 99));
        assert_eq!(region.len(), 80);
    }

    #[test]
    fn test_invalid_channel_rejected() {
        let mut s = signal();
        assert!(s.add_region("x", Channels::Single(2), 0, 1).is_err());
    }

    #[test]
    fn test_sorted_lazily() {
        let mut s = signal();
        let c = s.add_region("c", Channels::All, 60, 70).unwrap();
        let a = s.add_region("a", Channels::All, 0, 10).unwrap();
        let b = s.add_region("b", Channels::Single(1), 30, 40).unwrap();

        let order: Vec<RegionId> = s.sorted_regions().iter().map(|r| r.id).collect();
        assert_eq!(order, vec![a, b, c]);

        s.set_region_bounds(a, 80, 90).unwrap();
        let order: Vec<RegionId> = s.sorted_regions().iter().map(|r| r.id).collect();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn test_ids_survive_removal() {
        let mut s = signal();
        let a = s.add_region("a", Channels::All, 0, 10).unwrap();
        let b = s.add_region("b", Channels::All, 20, 30).unwrap();
        s.remove_region(a).unwrap();
        assert_eq!(s.region(b).unwrap().label, "b");
        assert!(matches!(s.remove_region(a), Err(SkError::InvalidRegion(_))));
    }

    #[test]
    fn test_locked_region() {
        let mut s = signal();
        let id = s.add_region("keep", Channels::All, 0, 10).unwrap();
        s.set_region_locked(id, true).unwrap();
        assert!(matches!(s.set_region_bounds(id, 5, 6), Err(SkError::RegionLocked(_))));
        assert!(s.remove_region(id).is_err());

        s.clear_regions();
        assert_eq!(s.region_count(), 1);
    }

    #[test]
    fn test_region_at() {
        let mut s = signal();
        s.add_region("left", Channels::Single(0), 0, 49).unwrap();
        let right = s.add_region("right", Channels::Single(1), 0, 49).unwrap();
        assert_eq!(s.region_at(1, 25).map(|r| r.id), Some(right));
        assert!(s.region_at(1, 75).is_none());
    }

    #[test]
    fn test_shrink_reclamps() {
        let mut s = signal();
        let id = s.add_region("tail", Channels::All, 80, 99).unwrap();
        s.set_sample_count(50).unwrap();
        let region = s.region(id).unwrap();
        assert_eq!((region.left, region.right), (49, 49));
    }
}
