//! Bus lifecycle management and byte transfer.
//!
//! [`UartManager`] owns the slot registry and performs all mutation on it:
//! opening a bus configures the tty for raw 8-bit operation at the requested
//! speed, closing releases the handle, and the send methods are thin
//! validated wrappers around a single `write(2)`. The timed read engine
//! lives in its own module but operates on the same manager.
//!
//! Open is atomic from the caller's perspective: any failure after the
//! device node is opened drops the descriptor and leaves the slot
//! uninitialized.

use std::fs::File;
use std::io::Write;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;

use log::{debug, warn};
use nix::sys::termios::{
    cfmakeraw, cfsetispeed, cfsetospeed, tcflush, tcgetattr, tcsetattr, BaudRate, ControlFlags,
    FlushArg, SetArg, SpecialCharacterIndices,
};

use crate::baud;
use crate::config::BusConfig;
use crate::error::{UartError, UartResult};
use crate::registry::BusRegistry;
use crate::shutdown::ShutdownFlag;

/// Manages the lifecycle and I/O of the board's UART buses.
///
/// `open`/`close` take `&mut self`; the I/O operations take `&self`. The
/// manager itself is not internally synchronized: at most one active caller
/// per bus slot at a time, concurrent use of the same slot from several
/// threads must be serialized by the caller.
#[derive(Debug)]
pub struct UartManager {
    pub(crate) registry: BusRegistry,
    pub(crate) shutdown: ShutdownFlag,
}

impl UartManager {
    /// Creates a manager over the default device path table.
    pub fn new() -> Self {
        Self {
            registry: BusRegistry::default(),
            shutdown: ShutdownFlag::new(),
        }
    }

    /// Creates a manager over a custom device path table.
    ///
    /// # Errors
    /// Fails if the table does not cover every bus index.
    pub fn with_config(config: &BusConfig) -> UartResult<Self> {
        Ok(Self {
            registry: BusRegistry::new(config)?,
            shutdown: ShutdownFlag::new(),
        })
    }

    /// Clone of the shutdown flag polled by the read engine.
    ///
    /// Hand this to the application lifecycle; requesting shutdown on it
    /// makes any blocked [`read_bytes`](Self::read_bytes) return its partial
    /// count at the next wait round.
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Read-only view of the slot table (device paths, initialized flags).
    pub fn registry(&self) -> &BusRegistry {
        &self.registry
    }

    /// Opens and configures a bus for raw 8N1 communication at `baud`.
    ///
    /// Any previously open handle for the bus is released first, so reopening
    /// at a new speed needs no explicit close. The tty is configured with no
    /// input/output post-processing, no echo or signal generation, receiver
    /// enabled, modem control lines ignored, and blocking reads (VMIN=1).
    /// Settings are applied with flush-on-apply semantics, and input that
    /// arrives between apply and return is discarded as well; if that final
    /// discard fails it is logged rather than failing the open, since the
    /// port is already fully configured.
    ///
    /// # Errors
    /// `InvalidBusIndex`, `InvalidBaudRate` for bad arguments (checked before
    /// any I/O); `OpenFailure` if the device node cannot be opened, commonly
    /// because the device tree overlay is missing; `ConfigurationFailure` if
    /// termios setup fails, in which case the slot stays uninitialized.
    pub fn open(&mut self, bus: usize, baud: u32) -> UartResult<()> {
        self.registry.slot(bus)?;
        let speed = baud::termios_speed(baud).ok_or(UartError::InvalidBaudRate(baud))?;

        // Release a stale handle from an earlier open; close is idempotent
        // so this is a no-op on a fresh slot.
        self.close(bus)?;

        let path = self.registry.slot(bus)?.path().to_owned();
        let file = File::options()
            .read(true)
            .write(true)
            .custom_flags(nix::libc::O_NOCTTY)
            .open(&path)
            .map_err(|source| UartError::OpenFailure {
                bus,
                path: path.clone(),
                source,
            })?;

        configure(&file, speed)
            .map_err(|source| UartError::ConfigurationFailure { bus, source })?;

        self.registry.slot_mut(bus)?.install(file);

        // Drop whatever the driver queued before the port was configured.
        if let Err(err) = self.flush(bus) {
            warn!("uart{bus}: could not discard stale input after open: {err}");
        }

        debug!("uart{} open at {} baud on {}", bus, baud, path.display());
        Ok(())
    }

    /// Closes a bus, releasing its handle.
    ///
    /// Idempotent: closing an uninitialized bus is a no-op success. Errors
    /// from the underlying close are ignored, the slot is unusable either
    /// way, which is the whole contract.
    ///
    /// # Errors
    /// Only `InvalidBusIndex`.
    pub fn close(&mut self, bus: usize) -> UartResult<()> {
        let slot = self.registry.slot_mut(bus)?;
        if slot.take_file().is_some() {
            debug!("uart{bus} closed");
        }
        Ok(())
    }

    /// Raw file descriptor of an open bus, for callers doing their own I/O.
    ///
    /// The descriptor remains owned by the manager and is invalidated by
    /// [`close`](Self::close) or a reopen.
    ///
    /// # Errors
    /// `InvalidBusIndex` or `NotInitialized`.
    pub fn handle(&self, bus: usize) -> UartResult<RawFd> {
        Ok(self.device(bus)?.as_raw_fd())
    }

    /// Discards input received on the bus but not yet read.
    ///
    /// # Errors
    /// `InvalidBusIndex`, `NotInitialized`, or `FlushFailure`.
    pub fn flush(&self, bus: usize) -> UartResult<()> {
        let file = self.device(bus)?;
        tcflush(file, FlushArg::TCIFLUSH)
            .map_err(|source| UartError::FlushFailure { bus, source })
    }

    /// Writes `data` to the bus with a single `write(2)` call.
    ///
    /// Returns exactly what the kernel reports, which may be fewer bytes
    /// than `data.len()`. This layer deliberately does not loop on short
    /// writes; retrying the remainder is the caller's responsibility.
    ///
    /// # Errors
    /// `InvalidBusIndex`, `NotInitialized`, `ZeroLengthTransfer` for an
    /// empty buffer, or `WriteFailure`.
    pub fn send_bytes(&self, bus: usize, data: &[u8]) -> UartResult<usize> {
        let mut file = self.device(bus)?;
        if data.is_empty() {
            return Err(UartError::ZeroLengthTransfer);
        }
        let written = file
            .write(data)
            .map_err(|source| UartError::WriteFailure { bus, source })?;
        debug!("uart{}: wrote {} of {} bytes", bus, written, data.len());
        Ok(written)
    }

    /// Single-byte convenience form of [`send_bytes`](Self::send_bytes).
    ///
    /// # Errors
    /// Same as `send_bytes`.
    pub fn send_byte(&self, bus: usize, value: u8) -> UartResult<usize> {
        self.send_bytes(bus, &[value])
    }

    /// Open handle for a bus, or the appropriate validation error.
    pub(crate) fn device(&self, bus: usize) -> UartResult<&File> {
        self.registry
            .slot(bus)?
            .file()
            .ok_or(UartError::NotInitialized(bus))
    }
}

impl Default for UartManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw-mode setup: 8 data bits, receiver on, modem control ignored, no line
/// discipline processing, reads block until at least one byte is available.
fn configure(file: &File, speed: BaudRate) -> nix::Result<()> {
    let mut tty = tcgetattr(file)?;
    cfmakeraw(&mut tty);
    tty.control_flags |= ControlFlags::CREAD | ControlFlags::CLOCAL;
    tty.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    tty.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    cfsetispeed(&mut tty, speed)?;
    cfsetospeed(&mut tty, speed)?;
    // TCSAFLUSH applies the settings and drops input queued under the old ones.
    tcsetattr(file, SetArg::TCSAFLUSH, &tty)
}
