//! Duplicated render lists.
//!
//! A carousel renders its item list `k` times back to back. Resetting the
//! strip's offset by exactly one copy's width is then invisible because the
//! content on either side of the jump is identical. `k` is at least 2 so a full
//! pass never exposes unrendered space at either edge.

use crate::{CarouselError, Result};

/// Concatenates `items` with itself `k` times.
pub fn build_render_list<T: Clone>(items: &[T], k: usize) -> Result<Vec<T>> {
    if items.is_empty() {
        return Err(CarouselError::EmptyItemList);
    }
    if k < 2 {
        return Err(CarouselError::InvalidInput(
            "render list needs at least two copies of the items",
        ));
    }

    let mut out = Vec::with_capacity(items.len() * k);
    for _ in 0..k {
        out.extend_from_slice(items);
    }
    Ok(out)
}

/// Render-time list of slots with their logical item indices.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderList<T> {
    slots: Vec<T>,
    item_count: usize,
    duplication: usize,
}

impl<T: Clone> RenderList<T> {
    pub fn new(items: &[T], duplication: usize) -> Result<Self> {
        Ok(Self {
            slots: build_render_list(items, duplication)?,
            item_count: items.len(),
            duplication,
        })
    }
}

impl<T> RenderList<T> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn duplication(&self) -> usize {
        self.duplication
    }

    /// Index into the original item list shown by `slot`.
    pub fn logical_index(&self, slot: usize) -> usize {
        slot % self.item_count
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot)
    }

    /// Iterates `(slot, logical index, item)` in render order.
    pub fn slots(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(move |(slot, item)| (slot, slot % self.item_count, item))
    }
}
