//! Sparse store implementation
//!
//! The unlocked data structure behind a device. Every method takes `&self`
//! or `&mut self`; serialization between callers is the device's job.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::config::Geometry;
use crate::error::{Result, ScullError};

use super::addressing::Position;
use super::segment::{extend_chain, MemoryBudget, Segment};

/// Geometry shared by every store created from one registry.
///
/// Trim resets a store to whatever this holds at the time of the trim.
pub type SharedGeometry = Arc<RwLock<Geometry>>;

/// Snapshot of a store's shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Logical content length (high-water mark)
    pub size: u64,
    pub quantum: usize,
    pub qset: usize,
    /// Segments in the chain
    pub segments: usize,
    /// Materialized leaf buffers
    pub leaves: usize,
    /// Bytes charged to the memory budget
    pub allocated_bytes: usize,
}

/// Lazily grown chain of fixed-size buffers addressed by byte offset
#[derive(Debug)]
pub struct SparseStore {
    /// Segment chain indexed by item number, empty until the first write
    chain: Vec<Segment>,

    /// Geometry of the current chain
    geometry: Geometry,

    /// Defaults restored by trim
    defaults: SharedGeometry,

    /// High-water mark of bytes written
    size: u64,

    budget: MemoryBudget,
}

impl SparseStore {
    /// Create an empty store using the current defaults
    pub fn new(defaults: SharedGeometry, memory_limit: Option<usize>) -> Self {
        let geometry = *defaults.read();
        Self {
            chain: Vec::new(),
            geometry,
            defaults,
            size: 0,
            budget: MemoryBudget::new(memory_limit),
        }
    }

    /// Create a store whose defaults are not shared with anything else
    pub fn with_geometry(geometry: Geometry) -> Self {
        Self::new(Arc::new(RwLock::new(geometry)), None)
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Read up to `count` bytes at `*pos`, advancing `*pos` by the amount read
    ///
    /// Returns an empty buffer at or past EOF, and also when the addressed
    /// segment, slot array or slot was never materialized. A single call
    /// never crosses a leaf buffer boundary.
    pub fn read(&self, pos: &mut u64, count: usize) -> Result<Bytes> {
        if *pos >= self.size {
            return Ok(Bytes::new());
        }
        let available = self.size - *pos;
        let count = usize::try_from(available).map_or(count, |a| count.min(a));

        let position = Position::locate(self.geometry, *pos)?;

        let leaf = match self
            .find(position.item)
            .and_then(|segment| segment.leaf(position.slot))
        {
            Some(leaf) => leaf,
            None => {
                tracing::trace!(pos = *pos, ?position, "read over unmaterialized slot");
                return Ok(Bytes::new());
            }
        };

        let count = count.min(position.leaf_remaining(self.geometry));
        let data = Bytes::copy_from_slice(&leaf[position.offset..position.offset + count]);

        *pos += count as u64;
        tracing::trace!(pos = *pos, count, "read");
        Ok(data)
    }

    /// Write as much of `data` as fits in the leaf buffer at `*pos`
    ///
    /// Allocates segments, the slot array and the leaf buffer on demand.
    /// Returns the number of bytes written and advances `*pos` by it. On
    /// failure `size` is unchanged; segments already created stay.
    pub fn write(&mut self, pos: &mut u64, data: &[u8]) -> Result<usize> {
        let position = Position::locate(self.geometry, *pos)?;
        let count = data.len().min(position.leaf_remaining(self.geometry));
        let end = pos
            .checked_add(count as u64)
            .ok_or(ScullError::OffsetOverflow(*pos))?;

        let geometry = self.geometry;
        let result = Self::follow(&mut self.chain, &mut self.budget, position.item).and_then(
            |segment| segment.leaf_mut(position.slot, geometry, &mut self.budget),
        );
        let leaf = match result {
            Ok(leaf) => leaf,
            Err(e) => {
                tracing::warn!(pos = *pos, error = %e, "write failed");
                return Err(e);
            }
        };
        leaf[position.offset..position.offset + count].copy_from_slice(&data[..count]);

        *pos = end;
        if self.size < end {
            self.size = end;
        }
        tracing::trace!(pos = end, count, size = self.size, "write");
        Ok(count)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Release the whole chain and return to the default geometry
    pub fn trim(&mut self) {
        let segments = self.chain.len();
        // Vec drops its elements front to back
        self.chain = Vec::new();
        self.size = 0;
        self.budget.reset();
        self.geometry = *self.defaults.read();

        if segments > 0 {
            tracing::debug!(
                segments,
                quantum = self.geometry.quantum,
                qset = self.geometry.qset,
                "store trimmed"
            );
        }
    }

    /// Change the geometry of an empty store
    pub fn set_geometry(&mut self, geometry: Geometry) -> Result<()> {
        geometry.validate()?;
        if !self.chain.is_empty() {
            return Err(ScullError::GeometryLocked);
        }
        tracing::debug!(quantum = geometry.quantum, qset = geometry.qset, "geometry changed");
        self.geometry = geometry;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Logical content length
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            size: self.size,
            quantum: self.geometry.quantum,
            qset: self.geometry.qset,
            segments: self.chain.len(),
            leaves: self.chain.iter().map(Segment::leaf_count).sum(),
            allocated_bytes: self.budget.used(),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Segment `item` if the chain already reaches it
    fn find(&self, item: usize) -> Option<&Segment> {
        self.chain.get(item)
    }

    /// Segment `item`, creating it and every missing predecessor
    fn follow<'a>(
        chain: &'a mut Vec<Segment>,
        budget: &mut MemoryBudget,
        item: usize,
    ) -> Result<&'a mut Segment> {
        let len = item
            .checked_add(1)
            .ok_or(ScullError::OutOfMemory { what: "segment" })?;
        extend_chain(chain, len, budget)?;
        Ok(&mut chain[item])
    }
}
