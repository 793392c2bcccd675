//! Store Module
//!
//! The sparse, lazily grown byte store behind every device.
//!
//! ## Responsibilities
//! - Translate byte offsets into (segment, slot, byte) coordinates
//! - Grow the segment chain and allocate buffers only when written
//! - Bound every transfer to a single leaf buffer
//! - Release everything on trim
//!
//! ## Memory Layout
//! ```text
//! SparseStore
//!   chain: [Segment 0, Segment 1, ...]   (grown on demand, index = item)
//!              │
//!              └─ slots: [Some(leaf), None, Some(leaf), ...]   (qset entries)
//!                           │
//!                           └─ quantum bytes
//! ```
//!
//! One segment covers `quantum * qset` bytes of logical space. Offsets are
//! resolved with [`Position::locate`]; reads index the chain without
//! allocating, writes extend it.

mod addressing;
mod segment;
mod sparse;

pub use addressing::Position;
pub use segment::{LeafBuffer, MemoryBudget, Segment};
pub use sparse::{SharedGeometry, SparseStore, StoreStats};
