//! UART probe: open a bus, optionally send a command, and dump the reply.
//!
//! Quick operator diagnostic for checking that a bus is wired and talking,
//! e.g. `uart_probe --bus 0 --baud 115200 --send AT --read 16`. Ctrl-C is
//! routed through the shutdown flag so a blocked read returns its partial
//! result instead of the process dying mid-syscall.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use nix::sys::signal::{SigSet, Signal};
use uart_bus::{BusConfig, UartManager};

#[derive(Parser, Debug)]
#[command(name = "uart_probe", about = "Open a UART bus, send a command, and dump the reply")]
struct Args {
    /// Bus index (0-5)
    #[arg(long, default_value_t = 0)]
    bus: usize,

    /// Baud rate (standard rates only)
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// ASCII command to send before reading ("\r\n" is appended)
    #[arg(long)]
    send: Option<String>,

    /// Number of bytes to read back
    #[arg(long, default_value_t = 32)]
    read: usize,

    /// Aggregate read timeout in milliseconds
    #[arg(long, default_value_t = 1_000)]
    timeout_ms: u64,

    /// TOML file with a device_paths table overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BusConfig::load_from(path)?,
        None => BusConfig::load()?,
    };
    let mut manager = UartManager::with_config(&config)?;

    // Mask SIGINT and route it through the shutdown flag from a dedicated
    // waiter thread, so Ctrl-C unwinds a blocked read cleanly.
    let mut sigint = SigSet::empty();
    sigint.add(Signal::SIGINT);
    sigint.thread_block().context("cannot mask SIGINT")?;
    let flag = manager.shutdown_flag();
    thread::spawn(move || {
        if sigint.wait().is_ok() {
            flag.request();
        }
    });

    manager.open(args.bus, args.baud)?;
    info!("uart{} open at {} baud", args.bus, args.baud);

    if let Some(command) = &args.send {
        let framed = format!("{command}\r\n");
        let written = manager.send_bytes(args.bus, framed.as_bytes())?;
        println!("sent {written} of {} bytes", framed.len());
    }

    if args.read > 0 {
        let mut buf = vec![0u8; args.read];
        let n = manager.read_bytes(args.bus, &mut buf, Duration::from_millis(args.timeout_ms))?;
        println!("read {n} bytes: {:?}", String::from_utf8_lossy(&buf[..n]));
    }

    manager.close(args.bus)?;
    Ok(())
}
