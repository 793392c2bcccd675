//! Configuration for scullkv
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{Result, ScullError};

/// Default leaf buffer size in bytes
pub const DEFAULT_QUANTUM: usize = 4000;

/// Default number of leaf slots per segment
pub const DEFAULT_QSET: usize = 1000;

/// Default number of devices created by a registry
pub const DEFAULT_DEVICE_COUNT: usize = 3;

/// Sizing parameters of a store's segment chain.
///
/// `quantum * qset` bytes of logical address space are covered by one
/// segment. A chain is only ever addressed with a single geometry; see
/// [`SparseStore::set_geometry`](crate::store::SparseStore::set_geometry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Bytes per leaf buffer
    pub quantum: usize,

    /// Leaf slots per segment
    pub qset: usize,
}

impl Geometry {
    /// Create a geometry, rejecting zero sizes and unaddressable item sizes
    pub fn new(quantum: usize, qset: usize) -> Result<Self> {
        let geometry = Self { quantum, qset };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Bytes of logical address space covered by one segment
    pub fn item_size(&self) -> u64 {
        self.quantum as u64 * self.qset as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.quantum == 0 {
            return Err(ScullError::Config("quantum must be non-zero".to_string()));
        }
        if self.qset == 0 {
            return Err(ScullError::Config("qset must be non-zero".to_string()));
        }
        if (self.quantum as u64).checked_mul(self.qset as u64).is_none() {
            return Err(ScullError::Config(format!(
                "item size overflows: quantum {} * qset {}",
                self.quantum, self.qset
            )));
        }
        Ok(())
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            qset: DEFAULT_QSET,
        }
    }
}

/// Main configuration for a set of scull devices
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Geometry every device starts with and returns to on trim
    pub geometry: Geometry,

    /// Upper bound on bytes a single store may allocate (segments, slot
    /// arrays and leaf buffers). `None` means unbounded.
    pub memory_limit: Option<usize>,

    // -------------------------------------------------------------------------
    // Registry Configuration
    // -------------------------------------------------------------------------
    /// Number of devices to create
    pub device_count: usize,

    // -------------------------------------------------------------------------
    // Locking Configuration
    // -------------------------------------------------------------------------
    /// How long a blocked reader/writer waits between cancellation checks
    pub lock_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            memory_limit: None,
            device_count: DEFAULT_DEVICE_COUNT,
            lock_poll_interval: Duration::from_millis(10),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration describes a usable set of devices
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.device_count == 0 {
            return Err(ScullError::Config(
                "device_count must be non-zero".to_string(),
            ));
        }
        if self.lock_poll_interval.is_zero() {
            return Err(ScullError::Config(
                "lock_poll_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the leaf buffer size (in bytes)
    pub fn quantum(mut self, quantum: usize) -> Self {
        self.config.geometry.quantum = quantum;
        self
    }

    /// Set the number of leaf slots per segment
    pub fn qset(mut self, qset: usize) -> Self {
        self.config.geometry.qset = qset;
        self
    }

    /// Set both sizing parameters at once
    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.config.geometry = geometry;
        self
    }

    /// Cap the bytes each store may allocate
    pub fn memory_limit(mut self, limit: usize) -> Self {
        self.config.memory_limit = Some(limit);
        self
    }

    /// Set the number of devices
    pub fn device_count(mut self, count: usize) -> Self {
        self.config.device_count = count;
        self
    }

    /// Set the lock poll interval
    pub fn lock_poll_interval(mut self, interval: Duration) -> Self {
        self.config.lock_poll_interval = interval;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
