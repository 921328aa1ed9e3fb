//! `color-ctrl-scan` — lists attached color-controller bridges and,
//! optionally, identifies the sensor bank behind one of them.
//!
//! Mirrors the CLI texture of the pack's other bridge-chip tools
//! (`Tinnci-nander-rs`, `xous-tools`): a `clap`-derived argument struct, one
//! subcommand per operation, `env_logger` wired to `-v`/`RUST_LOG`.

use clap::{Parser, Subcommand};
use color_ctrl::device::{swap_serials, DeviceManager};

#[derive(Parser)]
#[command(name = "color-ctrl-scan", about = "Enumerate and probe color-controller bridges")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// List every attached bridge's serial number.
    List,
    /// Open every attached bridge in enumeration order and identify its sensors.
    Identify,
    /// Swap two entries in the enumeration order (for testing serial ordering).
    Swap { i: usize, j: usize },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    let manager = DeviceManager::new()?;

    match cli.command {
        Command::List => {
            let serials = manager.scan_devices()?;
            if serials.is_empty() {
                println!("no color-controller bridges found");
            }
            for serial in &serials {
                println!("{}", serial.0);
            }
        }
        Command::Identify => {
            let serials = manager.scan_devices()?;
            let mut arrays = manager.open_ordered(&serials)?;
            for (idx, array) in arrays.iter_mut().enumerate() {
                let outcome = array.identify()?;
                if outcome.is_clean() {
                    println!("device {idx}: all 16 buses identified a known TCS3472");
                } else {
                    println!("device {idx}: bus mask {:#06x} failed identification", outcome.bus_mask);
                }
            }
        }
        Command::Swap { i, j } => {
            let mut serials = manager.scan_devices()?;
            swap_serials(&mut serials, i, j)?;
            for serial in &serials {
                println!("{}", serial.0);
            }
        }
    }

    Ok(())
}
