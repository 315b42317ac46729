use tracing::debug;

use octave_core::{merge_sort_by_key, Allocator, Matrix, MatrixStore, OctaveError, OctaveResult};

/// Initial slot count when none is configured.
pub const MIN_CAPACITY: usize = 4;

/// A growable array of matrix slots.
///
/// `slots[..count]` are live. `slots[count..]` are tombstones: slots that
/// were initialized earlier (so `slots.len()` is the high-water mark) and are
/// reused by the next append without touching the outer buffer. `capacity`
/// doubles from its floor whenever an append would exceed it.
pub struct SlotStore {
    slots: Vec<Option<Matrix>>,
    count: usize,
    capacity: usize,
    alloc: Allocator,
}

impl SlotStore {
    pub fn new(alloc: Allocator) -> OctaveResult<Self> {
        Self::with_capacity(MIN_CAPACITY, alloc)
    }

    pub fn with_capacity(floor: usize, alloc: Allocator) -> OctaveResult<Self> {
        let capacity = floor.max(1);
        let slots = alloc.buffer(capacity)?;
        Ok(Self {
            slots,
            count: 0,
            capacity,
            alloc,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots ever initialized.
    pub fn high_water(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Matrix> + '_ {
        self.slots[..self.count].iter().flatten()
    }

    fn grow_if_needed(&mut self) -> OctaveResult<()> {
        if self.count < self.capacity {
            return Ok(());
        }
        let grown = self
            .capacity
            .checked_mul(2)
            .ok_or(OctaveError::AllocationFailure { bytes: usize::MAX })?;
        let additional = grown - self.slots.len();
        self.alloc.reserve(&mut self.slots, additional)?;
        debug!(from = self.capacity, to = grown, "growing matrix store");
        self.capacity = grown;
        Ok(())
    }

    fn check(&self, index: usize) -> OctaveResult<()> {
        if index < self.count {
            Ok(())
        } else {
            Err(OctaveError::InvalidIndex(index as i64))
        }
    }
}

impl MatrixStore for SlotStore {
    fn append(&mut self, matrix: Matrix) -> OctaveResult<usize> {
        self.grow_if_needed()?;
        let index = self.count;
        if index < self.slots.len() {
            self.slots[index] = Some(matrix);
        } else {
            self.slots.push(Some(matrix));
        }
        self.count += 1;
        Ok(index)
    }

    fn count(&self) -> usize {
        self.count
    }

    fn is_valid_index(&self, index: i64) -> bool {
        usize::try_from(index).is_ok_and(|i| i < self.count)
    }

    fn get(&self, index: usize) -> Option<&Matrix> {
        self.slots[..self.count].get(index)?.as_ref()
    }

    fn replace_at(&mut self, index: usize, matrix: Matrix) -> OctaveResult<Matrix> {
        self.check(index)?;
        self.slots[index]
            .replace(matrix)
            .ok_or(OctaveError::InvalidIndex(index as i64))
    }

    fn remove_at(&mut self, index: usize) -> OctaveResult<Matrix> {
        self.check(index)?;
        let removed = self.slots[index]
            .take()
            .ok_or(OctaveError::InvalidIndex(index as i64))?;
        // the emptied slot travels to position count - 1 and becomes a tombstone
        self.slots[index..self.count].rotate_left(1);
        self.count -= 1;
        Ok(removed)
    }

    fn sort_by_sum(&mut self) -> OctaveResult<()> {
        let to = self.count.saturating_sub(1);
        merge_sort_by_key(
            &mut self.slots[..self.count],
            0,
            to,
            |slot| slot.as_ref().map_or(0, Matrix::sum),
            self.alloc,
        )
    }

    fn teardown(self) -> usize {
        let released = self.count;
        debug!(released, high_water = self.slots.len(), "tearing down matrix store");
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> SlotStore {
        SlotStore::new(Allocator::default()).unwrap()
    }

    fn scalar(v: i64) -> Matrix {
        Matrix::from_rows(&[[v]])
    }

    fn values(store: &SlotStore) -> Vec<u32> {
        store.iter().map(|m| m.get(0, 0)).collect()
    }

    #[test]
    fn test_append_and_get() {
        let mut store = test_store();
        assert!(store.is_empty());
        assert_eq!(store.append(scalar(7)).unwrap(), 0);
        assert_eq!(store.append(scalar(8)).unwrap(), 1);
        assert_eq!(store.count(), 2);
        assert_eq!(store.get(1).unwrap().get(0, 0), 8);
        assert!(store.get(2).is_none());
    }

    #[test]
    fn test_valid_index() {
        let mut store = test_store();
        assert!(!store.is_valid_index(0));
        store.append(scalar(1)).unwrap();
        assert!(store.is_valid_index(0));
        assert!(!store.is_valid_index(1));
        assert!(!store.is_valid_index(-1));
    }

    #[test]
    fn test_capacity_doubles() {
        let mut store = test_store();
        assert_eq!(store.capacity(), MIN_CAPACITY);
        for i in 0..5 {
            store.append(scalar(i)).unwrap();
        }
        assert_eq!(store.capacity(), 8);
        for i in 5..9 {
            store.append(scalar(i)).unwrap();
        }
        assert_eq!(store.capacity(), 16);
        assert_eq!(store.count(), 9);
    }

    #[test]
    fn test_growth_keeps_existing_matrices() {
        let mut store = test_store();
        for v in 0..33 {
            store.append(scalar(v)).unwrap();
        }
        assert_eq!(store.capacity(), 64);
        assert_eq!(store.high_water(), 33);
        assert_eq!(values(&store), (0..33).collect::<Vec<u32>>());
    }

    #[test]
    fn test_zero_floor_is_bumped() {
        let store = SlotStore::with_capacity(0, Allocator::default()).unwrap();
        assert_eq!(store.capacity(), 1);
    }

    #[test]
    fn test_remove_shifts_later_indices() {
        let mut store = test_store();
        for v in [10, 11, 12, 13] {
            store.append(scalar(v)).unwrap();
        }
        let removed = store.remove_at(1).unwrap();
        assert_eq!(removed.get(0, 0), 11);
        assert_eq!(store.count(), 3);
        assert_eq!(values(&store), vec![10, 12, 13]);
        assert!(!store.is_valid_index(3));
    }

    #[test]
    fn test_tombstone_reused() {
        let mut store = test_store();
        for v in [1, 2, 3] {
            store.append(scalar(v)).unwrap();
        }
        assert_eq!(store.high_water(), 3);
        store.remove_at(0).unwrap();
        assert_eq!(store.high_water(), 3);
        store.append(scalar(4)).unwrap();
        assert_eq!(store.high_water(), 3);
        assert_eq!(values(&store), vec![2, 3, 4]);
    }

    #[test]
    fn test_replace_keeps_indices() {
        let mut store = test_store();
        for v in [1, 2, 3] {
            store.append(scalar(v)).unwrap();
        }
        let old = store.replace_at(1, Matrix::from_rows(&[[5, 5]])).unwrap();
        assert_eq!(old.get(0, 0), 2);
        assert_eq!(store.count(), 3);
        assert_eq!(store.get(1).unwrap().cols(), 2);
        assert_eq!(store.get(1).unwrap().sum(), 10);
        assert_eq!(store.get(2).unwrap().get(0, 0), 3);
    }

    #[test]
    fn test_invalid_mutations() {
        let mut store = test_store();
        assert_eq!(
            store.replace_at(0, scalar(1)).unwrap_err(),
            OctaveError::InvalidIndex(0)
        );
        assert_eq!(store.remove_at(0).unwrap_err(), OctaveError::InvalidIndex(0));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_sort_by_sum() {
        let mut store = test_store();
        for v in [30, 10, 20, 10, 0] {
            store.append(scalar(v)).unwrap();
        }
        store.remove_at(4).unwrap();
        store.sort_by_sum().unwrap();
        assert_eq!(values(&store), vec![10, 10, 20, 30]);
        store.sort_by_sum().unwrap();
        assert_eq!(values(&store), vec![10, 10, 20, 30]);
    }

    #[test]
    fn test_sort_empty_store() {
        let mut store = test_store();
        store.sort_by_sum().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_teardown_reports_live() {
        let mut store = test_store();
        for v in [1, 2, 3] {
            store.append(scalar(v)).unwrap();
        }
        store.remove_at(2).unwrap();
        assert_eq!(store.teardown(), 2);
    }
}
