//! Fixed-capacity bus slot table.
//!
//! The registry owns one slot per bus index. A slot couples the device path
//! with the open handle; `Option<File>` encodes the invariant that a handle
//! exists exactly when the bus is initialized, so no separate flag can drift
//! out of sync. All mutation goes through [`UartManager`], the registry only
//! exposes bounds-checked lookup.
//!
//! [`UartManager`]: crate::UartManager

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::config::BusConfig;
use crate::error::{UartError, UartResult};

/// Number of UART buses, fixed at compile time.
pub const NUM_BUSES: usize = 6;

/// One bus slot: device path plus the open handle when initialized.
#[derive(Debug, Default)]
pub(crate) struct BusSlot {
    path: PathBuf,
    file: Option<File>,
}

impl BusSlot {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn file(&self) -> Option<&File> {
        self.file.as_ref()
    }

    pub(crate) fn install(&mut self, file: File) {
        self.file = Some(file);
    }

    pub(crate) fn take_file(&mut self) -> Option<File> {
        self.file.take()
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.file.is_some()
    }
}

/// Bounds-checked table of [`NUM_BUSES`] bus slots.
#[derive(Debug)]
pub struct BusRegistry {
    slots: [BusSlot; NUM_BUSES],
}

impl BusRegistry {
    /// Builds a registry from a device path table.
    ///
    /// # Errors
    /// Fails if the table does not list exactly [`NUM_BUSES`] paths.
    pub fn new(config: &BusConfig) -> UartResult<Self> {
        if config.device_paths.len() != NUM_BUSES {
            return Err(UartError::Config(figment::Error::from(format!(
                "device_paths must list exactly {NUM_BUSES} entries, got {}",
                config.device_paths.len()
            ))));
        }
        Ok(Self {
            slots: std::array::from_fn(|bus| BusSlot {
                path: config.device_paths[bus].clone(),
                file: None,
            }),
        })
    }

    pub(crate) fn slot(&self, bus: usize) -> UartResult<&BusSlot> {
        self.slots.get(bus).ok_or(UartError::InvalidBusIndex { bus })
    }

    pub(crate) fn slot_mut(&mut self, bus: usize) -> UartResult<&mut BusSlot> {
        self.slots
            .get_mut(bus)
            .ok_or(UartError::InvalidBusIndex { bus })
    }

    /// Device path configured for a bus.
    ///
    /// # Errors
    /// Returns `InvalidBusIndex` for an out-of-range bus.
    pub fn device_path(&self, bus: usize) -> UartResult<&Path> {
        Ok(self.slot(bus)?.path())
    }

    /// Whether a bus currently holds an open, configured handle.
    ///
    /// # Errors
    /// Returns `InvalidBusIndex` for an out-of-range bus.
    pub fn is_initialized(&self, bus: usize) -> UartResult<bool> {
        Ok(self.slot(bus)?.is_initialized())
    }
}

impl Default for BusRegistry {
    fn default() -> Self {
        let config = BusConfig::default();
        Self {
            slots: std::array::from_fn(|bus| BusSlot {
                path: config.device_paths[bus].clone(),
                file: None,
            }),
        }
    }
}
