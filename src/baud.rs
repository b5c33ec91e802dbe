//! Baud rate validation.
//!
//! Open requests carry a plain integer baud rate; only the standard rates
//! listed in [`SUPPORTED_BAUD_RATES`] are accepted. Anything else, including
//! near misses and non-POSIX rates the kernel might otherwise accept, is an
//! [`InvalidBaudRate`](crate::UartError::InvalidBaudRate) configuration error.

use nix::sys::termios::BaudRate;

/// Baud rates accepted by [`open`](crate::UartManager::open).
pub const SUPPORTED_BAUD_RATES: [u32; 18] = [
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600,
    115_200, 230_400,
];

/// Maps a numeric baud rate onto its termios speed constant.
///
/// Returns `None` for anything outside the supported set.
pub(crate) fn termios_speed(baud: u32) -> Option<BaudRate> {
    match baud {
        50 => Some(BaudRate::B50),
        75 => Some(BaudRate::B75),
        110 => Some(BaudRate::B110),
        134 => Some(BaudRate::B134),
        150 => Some(BaudRate::B150),
        200 => Some(BaudRate::B200),
        300 => Some(BaudRate::B300),
        600 => Some(BaudRate::B600),
        1200 => Some(BaudRate::B1200),
        1800 => Some(BaudRate::B1800),
        2400 => Some(BaudRate::B2400),
        4800 => Some(BaudRate::B4800),
        9600 => Some(BaudRate::B9600),
        19200 => Some(BaudRate::B19200),
        38400 => Some(BaudRate::B38400),
        57600 => Some(BaudRate::B57600),
        115_200 => Some(BaudRate::B115200),
        230_400 => Some(BaudRate::B230400),
        _ => None,
    }
}
