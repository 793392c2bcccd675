//! Scull device
//!
//! One `SparseStore` behind one mutex. Reads and writes hold the lock for
//! their whole duration, allocation included.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};

use crate::config::{Config, Geometry};
use crate::error::Result;
use crate::store::{SharedGeometry, SparseStore, StoreStats};

use super::handle::{AccessMode, FileHandle};
use super::lock::{lock_interruptible, CancelToken};

/// A simulated character device backed by a sparse store
///
/// ## Concurrency Model: one operation at a time
///
/// - `read`/`write` take the store mutex for their entire duration, so at
///   most one of them runs against a device at any moment
/// - Waiting for the mutex can be cancelled through a [`CancelToken`];
///   a cancelled call returns `Interrupted` and has touched nothing
/// - Separate devices share nothing but their default geometry
#[derive(Debug)]
pub struct ScullDevice {
    /// Position in the registry
    index: usize,

    store: Mutex<SparseStore>,

    /// Slice length for cancellable lock waits
    poll_interval: Duration,
}

impl ScullDevice {
    /// Create a device whose defaults are shared with other devices
    pub fn new(index: usize, defaults: SharedGeometry, config: &Config) -> Self {
        Self {
            index,
            store: Mutex::new(SparseStore::new(defaults, config.memory_limit)),
            poll_interval: config.lock_poll_interval,
        }
    }

    /// Create a standalone device from a config
    pub fn standalone(config: &Config) -> Result<Self> {
        config.validate()?;
        let defaults = Arc::new(parking_lot::RwLock::new(config.geometry));
        Ok(Self::new(0, defaults, config))
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Start a session on this device
    ///
    /// Opening write-only truncates the device. Never fails.
    pub fn open(self: &Arc<Self>, mode: AccessMode) -> FileHandle {
        if mode == AccessMode::WriteOnly {
            tracing::debug!(device = self.index, "truncate on write-only open");
            self.store.lock().trim();
        }
        FileHandle::new(Arc::clone(self), mode)
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Read at most one leaf buffer's worth of bytes at `*pos`
    pub fn read(&self, pos: &mut u64, count: usize, cancel: &CancelToken) -> Result<Bytes> {
        let store = self.lock(cancel)?;
        store.read(pos, count)
    }

    /// Write at most one leaf buffer's worth of `data` at `*pos`
    pub fn write(&self, pos: &mut u64, data: &[u8], cancel: &CancelToken) -> Result<usize> {
        let mut store = self.lock(cancel)?;
        store.write(pos, data)
    }

    /// Take exclusive access to the store
    ///
    /// Every read and write on the device waits while the guard is alive.
    pub fn lock(&self, cancel: &CancelToken) -> Result<MutexGuard<'_, SparseStore>> {
        lock_interruptible(&self.store, cancel, self.poll_interval)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Discard all content and return to the default geometry
    pub fn trim(&self) {
        self.store.lock().trim();
    }

    /// Change the geometry; only allowed while the device is empty
    pub fn set_geometry(&self, geometry: Geometry, cancel: &CancelToken) -> Result<()> {
        self.lock(cancel)?.set_geometry(geometry)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn index(&self) -> usize {
        self.index
    }

    /// Current logical content length
    pub fn size(&self) -> u64 {
        self.store.lock().size()
    }

    pub fn stats(&self) -> StoreStats {
        self.store.lock().stats()
    }
}
