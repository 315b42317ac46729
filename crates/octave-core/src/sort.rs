//! Top-down merge sort over a closed index range.
//!
//! Elements are moved, never cloned: for matrices only the handle (the grid
//! pointer, dimensions and sum) changes position. The auxiliary buffer is
//! reserved once for the whole range through the [`Allocator`].

use std::mem;

use crate::alloc::Allocator;
use crate::error::{OctaveError, OctaveResult};

/// Sort `items[from..=to]` by ascending `key`.
///
/// On equal keys the element from the left run is taken first. An empty range
/// (`from >= to`) is a no-op; `to` past the end of `items` is an
/// [`OctaveError::InvalidIndex`].
pub fn merge_sort_by_key<T, K, F>(
    items: &mut [T],
    from: usize,
    to: usize,
    key: F,
    alloc: Allocator,
) -> OctaveResult<()>
where
    T: Default,
    K: Ord,
    F: Fn(&T) -> K,
{
    if from >= to {
        return Ok(());
    }
    if to >= items.len() {
        return Err(OctaveError::InvalidIndex(to as i64));
    }

    let mut aux = alloc.buffer(to - from + 1)?;
    sort_range(items, &mut aux, from, to, &key);
    Ok(())
}

fn sort_range<T, K, F>(items: &mut [T], aux: &mut Vec<T>, left: usize, right: usize, key: &F)
where
    T: Default,
    K: Ord,
    F: Fn(&T) -> K,
{
    if left >= right {
        return;
    }

    let mid = left + (right - left) / 2;
    sort_range(items, aux, left, mid, key);
    sort_range(items, aux, mid + 1, right, key);

    aux.clear();
    let (mut i, mut j) = (left, mid + 1);
    while i <= mid && j <= right {
        if key(&items[j]) < key(&items[i]) {
            aux.push(mem::take(&mut items[j]));
            j += 1;
        } else {
            aux.push(mem::take(&mut items[i]));
            i += 1;
        }
    }
    aux.extend(items[i..=mid].iter_mut().map(mem::take));
    aux.extend(items[j..=right].iter_mut().map(mem::take));

    for (slot, item) in items[left..=right].iter_mut().zip(aux.drain(..)) {
        *slot = item;
    }
}
