//! Segment chain nodes
//!
//! A `Segment` covers `quantum * qset` bytes of logical space. The chain is
//! a vector of segments indexed by item number; growing it, the slot arrays
//! and each leaf buffer are all fallible allocations charged against the
//! store's `MemoryBudget` first.

use std::mem;

use crate::config::Geometry;
use crate::error::{Result, ScullError};

/// A fixed-size leaf buffer (one quantum)
pub type LeafBuffer = Box<[u8]>;

/// One item of logical address space in the segment chain
#[derive(Debug, Default)]
pub struct Segment {
    /// `qset` optional leaf buffers; absent until the first write here
    pub(crate) slots: Option<Vec<Option<LeafBuffer>>>,
}

impl Segment {
    /// Bytes charged for one chain node
    pub const NODE_COST: usize = mem::size_of::<Segment>();

    /// Bytes charged for one slot array under `geometry`
    pub fn slots_cost(geometry: Geometry) -> usize {
        geometry
            .qset
            .saturating_mul(mem::size_of::<Option<LeafBuffer>>())
    }

    /// Leaf buffer in `slot`, if materialized
    pub fn leaf(&self, slot: usize) -> Option<&LeafBuffer> {
        self.slots.as_ref()?.get(slot)?.as_ref()
    }

    /// Leaf buffer in `slot`, allocating the slot array and the buffer on
    /// first use
    pub(crate) fn leaf_mut(
        &mut self,
        slot: usize,
        geometry: Geometry,
        budget: &mut MemoryBudget,
    ) -> Result<&mut LeafBuffer> {
        let slots = match &mut self.slots {
            Some(slots) => slots,
            empty => empty.insert(allocate_slots(geometry, budget)?),
        };

        match &mut slots[slot] {
            Some(leaf) => Ok(leaf),
            empty => Ok(empty.insert(allocate_leaf(geometry.quantum, budget)?)),
        }
    }

    /// Number of materialized leaf buffers in this segment
    pub fn leaf_count(&self) -> usize {
        self.slots
            .as_ref()
            .map(|slots| slots.iter().filter(|s| s.is_some()).count())
            .unwrap_or(0)
    }
}

/// Grow `chain` with empty segments until it holds `len` of them
///
/// Nothing is appended when the reservation fails.
pub(crate) fn extend_chain(
    chain: &mut Vec<Segment>,
    len: usize,
    budget: &mut MemoryBudget,
) -> Result<()> {
    let missing = len.saturating_sub(chain.len());
    if missing == 0 {
        return Ok(());
    }
    let cost = Segment::NODE_COST
        .checked_mul(missing)
        .ok_or(ScullError::OutOfMemory { what: "segment" })?;
    budget.charge(cost, "segment")?;
    if chain.try_reserve_exact(missing).is_err() {
        budget.release(cost);
        return Err(ScullError::OutOfMemory { what: "segment" });
    }
    chain.resize_with(len, Segment::default);
    Ok(())
}

fn allocate_slots(
    geometry: Geometry,
    budget: &mut MemoryBudget,
) -> Result<Vec<Option<LeafBuffer>>> {
    let cost = Segment::slots_cost(geometry);
    budget.charge(cost, "slot array")?;
    let mut slots = Vec::new();
    if slots.try_reserve_exact(geometry.qset).is_err() {
        budget.release(cost);
        return Err(ScullError::OutOfMemory { what: "slot array" });
    }
    slots.resize_with(geometry.qset, || None);
    Ok(slots)
}

fn allocate_leaf(quantum: usize, budget: &mut MemoryBudget) -> Result<LeafBuffer> {
    budget.charge(quantum, "leaf buffer")?;
    let mut buffer = Vec::new();
    if buffer.try_reserve_exact(quantum).is_err() {
        budget.release(quantum);
        return Err(ScullError::OutOfMemory { what: "leaf buffer" });
    }
    buffer.resize(quantum, 0u8);
    Ok(buffer.into_boxed_slice())
}

/// Running total of bytes a store has allocated, with an optional cap
#[derive(Debug, Clone, Default)]
pub struct MemoryBudget {
    limit: Option<usize>,
    used: usize,
}

impl MemoryBudget {
    pub fn new(limit: Option<usize>) -> Self {
        Self { limit, used: 0 }
    }

    /// Reserve `bytes`, failing with `OutOfMemory` if the cap would be
    /// exceeded
    pub fn charge(&mut self, bytes: usize, what: &'static str) -> Result<()> {
        let used = self
            .used
            .checked_add(bytes)
            .ok_or(ScullError::OutOfMemory { what })?;
        if let Some(limit) = self.limit {
            if used > limit {
                return Err(ScullError::OutOfMemory { what });
            }
        }
        self.used = used;
        Ok(())
    }

    pub fn release(&mut self, bytes: usize) {
        self.used = self.used.saturating_sub(bytes);
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Bytes currently charged
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}
