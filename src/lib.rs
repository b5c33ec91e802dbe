//! UART bus management for embedded Linux boards.
//!
//! This library manages a fixed set of serial buses exposed by the kernel as
//! tty device nodes. It covers the open/configure/close lifecycle, byte-level
//! sends, and a blocking read primitive bounded by a single aggregate timeout
//! that also cooperates with a process-wide shutdown flag.
//!
//! # Architecture Overview
//!
//! - [`registry::BusRegistry`]: fixed-capacity table mapping a bus index to
//!   its device path and open handle.
//! - [`manager::UartManager`]: lifecycle (open/close/flush) and validated
//!   byte transfer on top of the registry.
//! - The timed read engine ([`UartManager::read_bytes`]): a select-based
//!   wait-then-read loop with explicit deadline tracking.
//! - [`shutdown::ShutdownFlag`]: injected cancellation handle polled once per
//!   wait round so no caller blocks across program termination.
//!
//! # Concurrency
//!
//! Every operation blocks the calling thread for its own duration; the read
//! engine's select is the sole suspension point. The design assumes one
//! active caller per bus slot at a time. Callers sharing a slot across
//! threads must serialize access externally, e.g. one owning thread per bus.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use uart_bus::UartManager;
//!
//! fn main() -> uart_bus::UartResult<()> {
//!     let mut uart = UartManager::new();
//!     uart.open(0, 115_200)?;
//!     uart.send_bytes(0, b"AT\r\n")?;
//!
//!     let mut reply = [0u8; 16];
//!     // May return fewer bytes than requested: a timeout or a shutdown
//!     // request ends the read early with a partial count, not an error.
//!     let n = uart.read_bytes(0, &mut reply, Duration::from_millis(500))?;
//!     println!("got {:?}", &reply[..n]);
//!
//!     uart.close(0)
//! }
//! ```

pub mod baud;
pub mod config;
pub mod error;
pub mod manager;
mod read;
pub mod registry;
pub mod shutdown;

pub use config::BusConfig;
pub use error::{UartError, UartResult};
pub use manager::UartManager;
pub use registry::NUM_BUSES;
pub use shutdown::ShutdownFlag;
