//! Custom error types for the library.
//!
//! `UartError` consolidates every failure the bus layer can report. The split
//! follows the validation/I-O boundary: `InvalidBusIndex`, `InvalidBaudRate`,
//! `NotInitialized` and `ZeroLengthTransfer` are detected before any system
//! call is made, while the remaining variants carry the underlying OS error
//! as their source. `OpenFailure` is reported separately from other I/O
//! failures because on cape-style boards it almost always means the device
//! tree overlay for that bus has not been loaded, which is worth surfacing
//! to the operator directly.
//!
//! Note that a read that runs out of time, or one cut short by a shutdown
//! request, is *not* an error: [`UartManager::read_bytes`] returns the
//! partial byte count as a normal result in those cases.
//!
//! [`UartManager::read_bytes`]: crate::UartManager::read_bytes

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::registry::NUM_BUSES;

/// Convenience alias for results using the library error type.
pub type UartResult<T> = std::result::Result<T, UartError>;

/// Errors reported by the UART bus layer.
#[derive(Error, Debug)]
pub enum UartError {
    #[error("uart bus must be between 0 and {}, got {bus}", NUM_BUSES - 1)]
    InvalidBusIndex { bus: usize },

    #[error("invalid baud rate {0}, use a standard rate")]
    InvalidBaudRate(u32),

    #[error("uart{0} not initialized yet")]
    NotInitialized(usize),

    #[error(
        "cannot open uart{bus} at {}: {source} (is the device tree overlay loaded?)",
        path.display()
    )]
    OpenFailure {
        bus: usize,
        path: PathBuf,
        source: io::Error,
    },

    #[error("cannot configure uart{bus}: {source}")]
    ConfigurationFailure { bus: usize, source: nix::Error },

    #[error("cannot flush uart{bus}: {source}")]
    FlushFailure { bus: usize, source: nix::Error },

    #[error("write to uart{bus} failed: {source}")]
    WriteFailure { bus: usize, source: io::Error },

    #[error("wait for data on uart{bus} failed: {source}")]
    ReadWaitFailure { bus: usize, source: nix::Error },

    #[error("read from uart{bus} failed: {source}")]
    ReadFailure { bus: usize, source: io::Error },

    #[error("transfer length must be at least 1 byte")]
    ZeroLengthTransfer,

    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}
