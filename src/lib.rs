//! # scullkv
//!
//! A sparse, lazily grown, in-memory byte device with:
//! - Two-level addressing (segment chain -> slot -> byte) over fixed buffers
//! - Allocation only on write, bounded by an optional memory limit
//! - One in-flight read or write per device, with cancellable waits
//! - Truncate-on-open for write-only sessions
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DeviceRegistry                           │
//! │            (N devices, shared default geometry)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ open(index, mode)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      FileHandle                              │
//! │          (cursor, CancelToken, io::Read/Write/Seek)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ read / write
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     ScullDevice                              │
//! │           (Mutex held for the whole transfer)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!                ┌─────────────┐
//!                │ SparseStore │
//!                │ (Segments)  │
//!                └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod device;
pub mod registry;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ScullError, Result};
pub use config::{Config, Geometry};
pub use device::{AccessMode, CancelToken, FileHandle, ScullDevice};
pub use registry::DeviceRegistry;
pub use store::SparseStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of scullkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
