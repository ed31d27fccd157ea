//! TWELITE serial monitor firmware
//!
//! Reads the text frames a TWELITE module prints on its UART, decodes them
//! and prints the result on the defmt console.
//!
//! Wiring: module TX to GPIO1 (UART0 RX), module RX to GPIO0 (UART0 TX),
//! 115200 baud 8N1.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Duration, Instant};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use twelite_monitor::{parse_config, LineReader, Monitor, MonitorConfig, MonitorError, Outcome};

use crate::console::DefmtConsole;

mod console;

/// Embedded configuration (compiled into firmware)
/// Edit monitor.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../monitor.toml");

/// How often running counters are logged
const STATS_INTERVAL: Duration = Duration::from_secs(60);

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
// RX holds several frames while a record block is being printed
static TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("TWELITE monitor starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // 115200 8N1 is the default
    let tx_buf = TX_BUF.init([0u8; 16]);
    let rx_buf = RX_BUF.init([0u8; 1024]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (_tx, rx) = uart.split();
    info!("UART0 ready (GPIO0 TX, GPIO1 RX), interrupt-buffered");

    let mut reader = LineReader::new(rx);
    let mut console = DefmtConsole::new();
    let mut monitor = Monitor::new(config);
    let mut last_report = Instant::now();

    loop {
        match monitor.step(&mut reader, &mut console) {
            Ok(Some(outcome)) => log_outcome(outcome),
            Ok(None) => {
                info!("Stream ended: {}", monitor.stats());
                break;
            }
            Err(MonitorError::Read(e)) => {
                warn!("UART read error: {:?}", e);
            }
            Err(MonitorError::Output) => {
                warn!("Console write failed");
            }
        }

        if last_report.elapsed() >= STATS_INTERVAL {
            info!("Stats: {}", monitor.stats());
            last_report = Instant::now();
        }
    }
}

/// Parse the embedded configuration, falling back to defaults
fn load_config() -> MonitorConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Configuration loaded: {}", config);
            config
        }
        Err(e) => {
            // build.rs validates the file, so this only trips on parser drift
            warn!("Invalid monitor.toml ({}), using defaults", e);
            MonitorConfig::default()
        }
    }
}

fn log_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Ignored => trace!("Line ignored"),
        Outcome::Record => debug!("Record decoded"),
        Outcome::Skipped => debug!("Malformed frame skipped"),
        Outcome::ChecksumFailed => debug!("Checksum mismatch"),
        Outcome::Declined => debug!("Payload declined"),
    }
}
