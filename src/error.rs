//! Error types for scullkv
//!
//! Provides a unified error type for all device operations.
//!
//! Short transfers (clamped to EOF or to a leaf boundary) and empty reads
//! over never-materialized slots are normal results reported through byte
//! counts, not errors.

use std::io;

use thiserror::Error;

/// Result type alias using ScullError
pub type Result<T> = std::result::Result<T, ScullError>;

/// Unified error type for scullkv operations
#[derive(Debug, Error)]
pub enum ScullError {
    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    /// Waiting for the device lock was cancelled. Nothing was read or written;
    /// the caller may retry.
    #[error("Interrupted while waiting for device lock")]
    Interrupted,

    // -------------------------------------------------------------------------
    // Allocation Errors
    // -------------------------------------------------------------------------
    #[error("Out of memory allocating {what}")]
    OutOfMemory { what: &'static str },

    // -------------------------------------------------------------------------
    // Addressing Errors
    // -------------------------------------------------------------------------
    #[error("Offset not addressable: {0}")]
    OffsetOverflow(u64),

    #[error("Geometry can only change while the device is empty")]
    GeometryLocked,

    // -------------------------------------------------------------------------
    // Front-end Errors
    // -------------------------------------------------------------------------
    #[error("Bad access: {0}")]
    BadAccess(&'static str),

    #[error("No such device: {0}")]
    NoSuchDevice(usize),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// `Interrupted` maps to `WouldBlock` rather than `ErrorKind::Interrupted`:
/// `write_all`, `read_exact` and `read_to_end` silently retry the latter,
/// which would turn a cancelled wait back into a blocking one. The original
/// `ScullError` stays reachable through `io::Error::get_ref`.
impl From<ScullError> for io::Error {
    fn from(err: ScullError) -> Self {
        let kind = match err {
            ScullError::Io(inner) => return inner,
            ScullError::Interrupted => io::ErrorKind::WouldBlock,
            ScullError::OutOfMemory { .. } => io::ErrorKind::OutOfMemory,
            ScullError::OffsetOverflow(_) => io::ErrorKind::InvalidInput,
            ScullError::BadAccess(_) => io::ErrorKind::PermissionDenied,
            ScullError::NoSuchDevice(_) => io::ErrorKind::NotFound,
            ScullError::GeometryLocked | ScullError::Config(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
