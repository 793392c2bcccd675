//! Device Module
//!
//! The serialized front of a sparse store.
//!
//! ## Responsibilities
//! - Guard each store with a single mutex held across a whole transfer
//! - Let blocked callers give up waiting without side effects
//! - Truncate on write-only open
//! - Hand out cursor-owning handles implementing `std::io` traits
//!
//! ## Lock Acquisition
//! ```text
//! try_lock ──ok──► transfer
//!    │ busy
//!    ▼
//! cancelled? ──yes──► Err(Interrupted)
//!    │ no
//!    ▼
//! backoff spin / try_lock_for(poll) ──ok──► transfer
//!    └───────────── loop ─────────────┘
//! ```

mod handle;
mod lock;
mod scull;

pub use handle::{AccessMode, FileHandle};
pub use lock::{lock_interruptible, CancelToken};
pub use scull::ScullDevice;
