//! Timed read engine.
//!
//! The core of the crate: a blocking wait-then-read loop that collects an
//! exact byte count, bounded by one aggregate timeout across however many
//! select/read rounds it takes, and cut short cooperatively by the shutdown
//! flag. Timeout and shutdown exits are successes carrying the partial
//! count; only genuine syscall failures are errors.

use std::io::Read;
use std::os::fd::AsFd;
use std::time::{Duration, Instant};

use log::trace;
use nix::errno::Errno;
use nix::sys::select::{select, FdSet};
use nix::sys::time::{TimeVal, TimeValLike};

use crate::error::{UartError, UartResult};
use crate::manager::UartManager;

impl UartManager {
    /// Reads up to `buf.len()` bytes from a bus, waiting at most `timeout`
    /// in total.
    ///
    /// The timeout bounds the whole call, not each internal wait: a sender
    /// trickling one byte at a time cannot stretch the wait beyond the
    /// caller's budget. The loop keeps reading until the buffer is full, the
    /// deadline passes, a signal interrupts the wait, or shutdown is
    /// requested; the last three all return the bytes collected so far as a
    /// normal result. Callers must therefore treat any count below
    /// `buf.len()` as informational, never assume a full read because no
    /// error was returned.
    ///
    /// The shutdown flag is polled once per wait round, so the cancellation
    /// latency is the wait bound of the round in progress.
    ///
    /// # Errors
    /// `InvalidBusIndex`, `ZeroLengthTransfer`, `NotInitialized` for bad
    /// arguments (no I/O performed); `ReadWaitFailure` if select fails for a
    /// reason other than an interrupting signal; `ReadFailure` if the read
    /// itself fails. Both I/O errors discard the partial count.
    pub fn read_bytes(
        &self,
        bus: usize,
        buf: &mut [u8],
        timeout: Duration,
    ) -> UartResult<usize> {
        self.registry.slot(bus)?;
        if buf.is_empty() {
            return Err(UartError::ZeroLengthTransfer);
        }
        let mut file = self.device(bus)?;

        // One deadline for the whole call, fixed before the loop; every
        // select round is bounded by whatever portion of it remains.
        let deadline = Instant::now() + timeout;
        let mut collected = 0;

        while collected < buf.len() && !self.shutdown.is_requested() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let mut wait =
                TimeVal::microseconds(i64::try_from(remaining.as_micros()).unwrap_or(i64::MAX));
            let mut readable = FdSet::new();
            readable.insert(file.as_fd());

            match select(None, &mut readable, None, None, &mut wait) {
                // An interrupting signal (e.g. SIGINT) is not a failure:
                // hand back what we have so an operator interrupt is never
                // masked as an error.
                Err(Errno::EINTR) => return Ok(collected),
                Err(source) => return Err(UartError::ReadWaitFailure { bus, source }),
                // Aggregate timeout elapsed: a partial read is a legitimate
                // outcome, not an error.
                Ok(0) => return Ok(collected),
                Ok(_) => {
                    let n = file
                        .read(&mut buf[collected..])
                        .map_err(|source| UartError::ReadFailure { bus, source })?;
                    trace!("uart{}: read {} bytes ({} collected)", bus, n, collected + n);
                    collected += n;
                }
            }
        }

        // Buffer filled, or shutdown requested mid-read.
        Ok(collected)
    }
}
