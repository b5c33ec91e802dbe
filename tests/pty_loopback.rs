//! End-to-end tests against pseudo-terminal pairs.
//!
//! Each test opens its own pty. The master side plays the remote device and
//! the slave side is handed to the manager through an overridden path table,
//! so the full open/configure/read/write path runs against a real tty.
//! Timing-sensitive tests are serialized to keep scheduler noise out of
//! their elapsed-time assertions.

use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{FromRawFd, IntoRawFd};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use nix::fcntl::OFlag;
use nix::pty::{grantpt, posix_openpt, ptsname_r, unlockpt};
use serial_test::serial;
use uart_bus::{BusConfig, UartError, UartManager, NUM_BUSES};

/// Pty pair: `master` is the test's end, the manager opens the slave path
/// as bus 0.
struct Remote {
    master: File,
    manager: UartManager,
}

fn remote() -> Remote {
    let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).expect("posix_openpt");
    grantpt(&master).expect("grantpt");
    unlockpt(&master).expect("unlockpt");
    let slave_path = PathBuf::from(ptsname_r(&master).expect("ptsname_r"));

    let mut config = BusConfig::default();
    config.device_paths[0] = slave_path;
    let manager = UartManager::with_config(&config).expect("manager");

    #[allow(unsafe_code)]
    let master = unsafe { File::from_raw_fd(master.into_raw_fd()) };
    Remote { master, manager }
}

#[test]
fn out_of_range_bus_is_rejected_by_every_operation() {
    let mut r = remote();
    let mut buf = [0u8; 1];
    assert!(matches!(
        r.manager.open(NUM_BUSES, 115_200),
        Err(UartError::InvalidBusIndex { bus }) if bus == NUM_BUSES
    ));
    assert!(matches!(
        r.manager.close(NUM_BUSES),
        Err(UartError::InvalidBusIndex { .. })
    ));
    assert!(matches!(
        r.manager.handle(NUM_BUSES),
        Err(UartError::InvalidBusIndex { .. })
    ));
    assert!(matches!(
        r.manager.flush(NUM_BUSES),
        Err(UartError::InvalidBusIndex { .. })
    ));
    assert!(matches!(
        r.manager.send_bytes(NUM_BUSES, b"x"),
        Err(UartError::InvalidBusIndex { .. })
    ));
    assert!(matches!(
        r.manager.send_byte(NUM_BUSES, b'x'),
        Err(UartError::InvalidBusIndex { .. })
    ));
    assert!(matches!(
        r.manager
            .read_bytes(NUM_BUSES, &mut buf, Duration::from_millis(10)),
        Err(UartError::InvalidBusIndex { .. })
    ));
    // No slot state was touched.
    for bus in 0..NUM_BUSES {
        assert!(!r.manager.registry().is_initialized(bus).expect("valid bus"));
    }
}

#[test]
fn invalid_baud_leaves_slot_uninitialized() {
    let mut r = remote();
    assert!(matches!(
        r.manager.open(0, 9_999),
        Err(UartError::InvalidBaudRate(9_999))
    ));
    assert!(matches!(r.manager.handle(0), Err(UartError::NotInitialized(0))));
    assert!(!r.manager.registry().is_initialized(0).expect("valid bus"));
}

#[test]
fn close_is_idempotent() {
    let mut r = remote();
    assert!(r.manager.close(0).is_ok());
    assert!(r.manager.close(0).is_ok());

    r.manager.open(0, 115_200).expect("open");
    assert!(r.manager.close(0).is_ok());
    assert!(r.manager.close(0).is_ok());
    assert!(!r.manager.registry().is_initialized(0).expect("valid bus"));
}

#[test]
fn open_missing_device_reports_open_failure() {
    let mut config = BusConfig::default();
    config.device_paths[0] = PathBuf::from("/dev/ttyO-does-not-exist");
    let mut manager = UartManager::with_config(&config).expect("manager");
    assert!(matches!(
        manager.open(0, 115_200),
        Err(UartError::OpenFailure { bus: 0, .. })
    ));
    assert!(!manager.registry().is_initialized(0).expect("valid bus"));
}

#[test]
fn open_send_and_echo_read_round_trip() {
    let mut r = remote();
    r.manager.open(0, 115_200).expect("open");

    assert_eq!(r.manager.send_bytes(0, b"AT\r\n").expect("send"), 4);

    let mut seen = [0u8; 4];
    r.master.read_exact(&mut seen).expect("master read");
    assert_eq!(&seen, b"AT\r\n");

    // The remote echoes the first two bytes back.
    r.master.write_all(&seen[..2]).expect("master write");

    let mut reply = [0u8; 2];
    let n = r
        .manager
        .read_bytes(0, &mut reply, Duration::from_millis(500))
        .expect("read");
    assert_eq!(n, 2);
    assert_eq!(&reply, b"AT");
}

#[test]
fn send_byte_writes_exactly_one() {
    let mut r = remote();
    r.manager.open(0, 115_200).expect("open");
    assert_eq!(r.manager.send_byte(0, 0x0D).expect("send"), 1);

    let mut byte = [0u8; 1];
    r.master.read_exact(&mut byte).expect("master read");
    assert_eq!(byte[0], 0x0D);
}

#[test]
fn zero_length_transfers_are_rejected() {
    let mut r = remote();
    r.manager.open(0, 115_200).expect("open");
    assert!(matches!(
        r.manager.send_bytes(0, &[]),
        Err(UartError::ZeroLengthTransfer)
    ));
    let mut empty: [u8; 0] = [];
    assert!(matches!(
        r.manager.read_bytes(0, &mut empty, Duration::from_millis(10)),
        Err(UartError::ZeroLengthTransfer)
    ));
}

#[test]
fn reopen_of_a_live_bus_succeeds() {
    let mut r = remote();
    r.manager.open(0, 9_600).expect("first open");
    r.manager.open(0, 115_200).expect("reopen at a new speed");
    assert!(r.manager.registry().is_initialized(0).expect("valid bus"));
    assert!(r.manager.handle(0).is_ok());
}

#[test]
fn flush_discards_pending_input() {
    let mut r = remote();
    r.manager.open(0, 115_200).expect("open");

    r.master.write_all(b"stale").expect("master write");
    // Let the bytes reach the slave input queue before discarding them.
    thread::sleep(Duration::from_millis(50));
    r.manager.flush(0).expect("flush");

    r.master.write_all(b"XY").expect("master write");
    let mut buf = [0u8; 2];
    let n = r
        .manager
        .read_bytes(0, &mut buf, Duration::from_millis(500))
        .expect("read");
    assert_eq!(n, 2);
    assert_eq!(&buf, b"XY");
}

#[test]
#[serial]
fn burst_of_one_delivery_accumulates_to_full_count() {
    let mut r = remote();
    r.manager.open(0, 115_200).expect("open");

    let mut master = r.master.try_clone().expect("clone master");
    let writer = thread::spawn(move || {
        for byte in *b"NMEADATA" {
            master.write_all(&[byte]).expect("master write");
            thread::sleep(Duration::from_millis(10));
        }
    });

    let mut buf = [0u8; 8];
    let n = r
        .manager
        .read_bytes(0, &mut buf, Duration::from_secs(2))
        .expect("read");
    writer.join().expect("writer thread");

    assert_eq!(n, 8);
    assert_eq!(&buf, b"NMEADATA");
}

#[test]
#[serial]
fn silent_source_times_out_once_with_zero_bytes() {
    let mut r = remote();
    r.manager.open(0, 115_200).expect("open");

    let mut buf = [0u8; 4];
    let start = Instant::now();
    let n = r
        .manager
        .read_bytes(0, &mut buf, Duration::from_millis(300))
        .expect("read");
    let elapsed = start.elapsed();

    assert_eq!(n, 0);
    assert!(
        elapsed >= Duration::from_millis(250),
        "returned before the timeout: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_millis(1500),
        "timeout was re-applied: {elapsed:?}"
    );
}

#[test]
#[serial]
fn trickling_sender_cannot_stretch_the_total_timeout() {
    let mut r = remote();
    r.manager.open(0, 115_200).expect("open");

    let mut master = r.master.try_clone().expect("clone master");
    let writer = thread::spawn(move || {
        // One byte every 50ms: far too slow for 64 bytes in 300ms. If the
        // engine re-armed the full timeout every round this would never end.
        for _ in 0..20 {
            if master.write_all(&[0x55]).is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
    });

    let mut buf = [0u8; 64];
    let start = Instant::now();
    let n = r
        .manager
        .read_bytes(0, &mut buf, Duration::from_millis(300))
        .expect("read");
    let elapsed = start.elapsed();

    assert!(n < 64, "only a few bytes should have arrived, got {n}");
    assert!(
        elapsed < Duration::from_millis(1000),
        "per-round timeout compounded: {elapsed:?}"
    );

    drop(r);
    writer.join().expect("writer thread");
}

#[test]
#[serial]
fn shutdown_request_unblocks_read_with_partial_result() {
    let mut r = remote();
    r.manager.open(0, 115_200).expect("open");

    let flag = r.manager.shutdown_flag();
    let mut master = r.master.try_clone().expect("clone master");
    let pacer = thread::spawn(move || {
        // Keep wait rounds turning so the engine re-polls the flag, then
        // request shutdown well before the 10s timeout.
        for i in 0..50 {
            if i == 4 {
                flag.request();
            }
            if master.write_all(&[b'x']).is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
    });

    let mut buf = [0u8; 1024];
    let start = Instant::now();
    let n = r
        .manager
        .read_bytes(0, &mut buf, Duration::from_secs(10))
        .expect("read");
    let elapsed = start.elapsed();

    assert!(n > 0 && n < buf.len(), "expected a partial count, got {n}");
    assert!(
        elapsed < Duration::from_secs(2),
        "shutdown request was ignored: {elapsed:?}"
    );

    drop(r);
    pacer.join().expect("pacer thread");
}
