//! Offset translation
//!
//! Maps a logical byte offset onto (segment, slot, byte) coordinates for a
//! given geometry. Pure arithmetic, nothing is allocated here.

use crate::config::Geometry;
use crate::error::{Result, ScullError};

/// Physical coordinates of a logical byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Index of the segment in the chain (0-based)
    pub item: usize,

    /// Slot within that segment
    pub slot: usize,

    /// Byte offset within the slot's leaf buffer
    pub offset: usize,
}

impl Position {
    /// Translate `pos` under `geometry`
    ///
    /// Fails with `OffsetOverflow` when the segment index does not fit in
    /// memory-addressable space.
    pub fn locate(geometry: Geometry, pos: u64) -> Result<Self> {
        let item_size = geometry.item_size();
        let quantum = geometry.quantum as u64;

        let item = pos / item_size;
        let rest = pos % item_size;

        let item = usize::try_from(item).map_err(|_| ScullError::OffsetOverflow(pos))?;

        Ok(Self {
            item,
            // rest < item_size, so both fit in usize
            slot: (rest / quantum) as usize,
            offset: (rest % quantum) as usize,
        })
    }

    /// Bytes left in the leaf buffer from this position on
    pub fn leaf_remaining(&self, geometry: Geometry) -> usize {
        geometry.quantum - self.offset
    }
}
