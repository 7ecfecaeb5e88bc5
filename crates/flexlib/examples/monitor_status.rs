//! Monitor a radio's object model.
//!
//! Connects to a FlexRadio, subscribes to status, and prints every model
//! event as it arrives. With `--meters`, also binds the VITA-49 port and
//! prints slice meter values once a second.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p flexlib --example monitor_status -- --host 192.168.1.100
//! RUST_LOG=flexlib_smartsdr=debug cargo run -p flexlib --example monitor_status -- \
//!     --host 192.168.1.100 --meters --duration 120
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use flexlib::{ModelEvent, ObjectKind, Session, SessionBuilder};

/// Print FlexRadio model events from the command line.
#[derive(Parser)]
#[command(name = "monitor_status", version, about)]
struct Cli {
    /// Radio IP address or hostname.
    #[arg(long)]
    host: String,

    /// SmartSDR TCP port.
    #[arg(long, default_value_t = flexlib::smartsdr::DEFAULT_TCP_PORT)]
    port: u16,

    /// Client program name to register as.
    #[arg(long, default_value = "flexlib-monitor")]
    name: String,

    /// Also receive VITA-49 meter data and print slice meters.
    #[arg(long)]
    meters: bool,

    /// Seconds to monitor before disconnecting.
    #[arg(long, default_value_t = 60)]
    duration: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    println!("Connecting to {}:{}...", cli.host, cli.port);
    let session = SessionBuilder::new()
        .host(&cli.host)
        .tcp_port(cli.port)
        .client_name(&cli.name)
        .datagrams(cli.meters)
        .connect()
        .await
        .with_context(|| format!("failed to connect to {}", cli.host))?;

    let mut events = session.subscribe();
    session
        .request_radio_info()
        .await
        .context("failed to request radio info")?;
    println!("Connected, handle {}\n", session.model().handle());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(cli.duration);
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            _ = ticker.tick(), if cli.meters => print_slice_meters(&session),
            event = events.recv() => match event {
                Ok(ModelEvent::Cleared) => {
                    println!("Radio closed the connection.");
                    break;
                }
                Ok(event) => print_event(&session, &event),
                Err(RecvError::Lagged(n)) => println!("(missed {n} events)"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.disconnect().await?;
    println!("\nMonitoring complete.");
    Ok(())
}

fn print_event(session: &Session, event: &ModelEvent) {
    match event {
        ModelEvent::Initialized {
            kind: ObjectKind::Slice,
            id,
        } => {
            let Ok(index) = id.parse::<u16>() else {
                return;
            };
            session.model().slices.read(|slices| {
                if let Some(slice) = slices.get(&index) {
                    println!(
                        "Slice {index}: {:.6} MHz {} rx={}",
                        slice.frequency.mhz(),
                        slice.mode,
                        slice.rx_ant
                    );
                }
            });
        }
        ModelEvent::Initialized {
            kind: ObjectKind::Radio,
            ..
        } => {
            session.model().radio.read(|radio| {
                let r = radio.get();
                println!("Radio: {} \"{}\" serial {}", r.model, r.nickname, r.serial);
            });
        }
        other => println!("{other:?}"),
    }
}

fn print_slice_meters(session: &Session) {
    session.model().meters.read(|meters| {
        for (_, meter) in meters.iter() {
            if meter.source == flexlib::objects::SOURCE_SLICE {
                println!(
                    "  slice {} {:<8} {:>8.1} {}",
                    meter.source_index, meter.name, meter.value, meter.units
                );
            }
        }
    });
}
