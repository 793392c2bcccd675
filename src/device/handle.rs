//! File handles
//!
//! A handle is one client session on a device. It owns the cursor and
//! advances it by whatever each transfer reports; short transfers are
//! normal and the `std::io` traits loop over them like any device client.
//! A cancelled lock wait surfaces as `io::ErrorKind::WouldBlock`, so those
//! loops stop instead of retrying.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Result, ScullError};

use super::lock::CancelToken;
use super::scull::ScullDevice;

/// Access intent of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    /// Truncates the device on open
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn can_read(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }
}

/// An open session on a device with its own cursor
///
/// Dropping the handle ends the session; nothing is tracked on the device.
#[derive(Debug)]
pub struct FileHandle {
    device: Arc<ScullDevice>,
    mode: AccessMode,
    pos: u64,
    cancel: CancelToken,
}

impl FileHandle {
    pub(crate) fn new(device: Arc<ScullDevice>, mode: AccessMode) -> Self {
        Self {
            device,
            mode,
            pos: 0,
            cancel: CancelToken::new(),
        }
    }

    /// One bounded read at the cursor
    pub fn read_chunk(&mut self, count: usize) -> Result<Bytes> {
        if !self.mode.can_read() {
            return Err(ScullError::BadAccess("handle not opened for reading"));
        }
        self.device.read(&mut self.pos, count, &self.cancel)
    }

    /// One bounded write at the cursor
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<usize> {
        if !self.mode.can_write() {
            return Err(ScullError::BadAccess("handle not opened for writing"));
        }
        self.device.write(&mut self.pos, data, &self.cancel)
    }

    /// Token that interrupts this handle's lock waits; may be cloned to
    /// another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn device(&self) -> &Arc<ScullDevice> {
        &self.device
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = self.read_chunk(buf.len())?;
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_chunk(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                let size = self.device.lock(&self.cancel)?.size();
                size.checked_add_signed(delta)
            }
        };
        match target {
            Some(target) => {
                self.pos = target;
                Ok(target)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative or overflowing position",
            )),
        }
    }
}
