//! Device registry
//!
//! Creates a fixed set of devices that share one set of default sizing
//! parameters, and tears them down together.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{Config, Geometry};
use crate::device::{AccessMode, FileHandle, ScullDevice};
use crate::error::{Result, ScullError};
use crate::store::SharedGeometry;

/// A numbered set of scull devices
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: Vec<Arc<ScullDevice>>,

    /// Geometry every device returns to on trim
    defaults: SharedGeometry,
}

impl DeviceRegistry {
    /// Create `config.device_count` empty devices
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let defaults = Arc::new(RwLock::new(config.geometry));
        let devices = (0..config.device_count)
            .map(|index| Arc::new(ScullDevice::new(index, Arc::clone(&defaults), &config)))
            .collect();

        tracing::info!(
            devices = config.device_count,
            quantum = config.geometry.quantum,
            qset = config.geometry.qset,
            "scull devices initialized"
        );

        Ok(Self { devices, defaults })
    }

    /// Device at `index`
    pub fn device(&self, index: usize) -> Result<Arc<ScullDevice>> {
        self.devices
            .get(index)
            .cloned()
            .ok_or(ScullError::NoSuchDevice(index))
    }

    /// Open a session on device `index`
    pub fn open(&self, index: usize, mode: AccessMode) -> Result<FileHandle> {
        Ok(self.device(index)?.open(mode))
    }

    /// Replace the defaults applied by every later trim
    ///
    /// Devices already holding data keep their geometry until trimmed.
    pub fn set_default_geometry(&self, geometry: Geometry) -> Result<()> {
        geometry.validate()?;
        *self.defaults.write() = geometry;
        tracing::debug!(
            quantum = geometry.quantum,
            qset = geometry.qset,
            "default geometry changed"
        );
        Ok(())
    }

    pub fn default_geometry(&self) -> Geometry {
        *self.defaults.read()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ScullDevice>> {
        self.devices.iter()
    }

    /// Trim every device and release the registry
    pub fn destroy(self) {
        for device in &self.devices {
            device.trim();
        }
        tracing::info!(devices = self.devices.len(), "scull devices released");
    }
}
