// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

// Serlink protocol implementation
mod frame;
mod link;
mod protocol;
mod serial;
mod transfer;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use link::{Connection, LinkConfig, Role};
use serial::RealSerialPort;
use transfer::TransferError;

#[derive(Parser)]
#[command(name = "serlink")]
#[command(about = "Reliable file transfer over a raw serial line", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Serial port to use (e.g., /dev/ttyUSB0 or COM1)
    #[arg(short, long)]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "38400")]
    baud: u32,

    /// Seconds to wait for an acknowledgment before retransmitting
    #[arg(short, long, default_value = "3", value_name = "SECONDS")]
    timeout: u64,

    /// Retransmissions after the initial attempt
    #[arg(short, long, default_value = "3")]
    retries: u32,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a file over the link
    Send {
        /// File to send
        file: PathBuf,
    },
    /// Receive a file over the link
    Receive {
        /// Directory to save the received file
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "serlink=debug" } else { "serlink=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let role = match cli.command {
        Commands::Send { .. } => Role::Transmitter,
        Commands::Receive { .. } => Role::Receiver,
    };
    let config = LinkConfig {
        role,
        timeout: Duration::from_secs(cli.timeout),
        max_retransmissions: cli.retries,
    };

    let serial_port = match RealSerialPort::open(&cli.port, cli.baud) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("Failed to open serial port {}: {}", cli.port, e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Send { ref file } => run_send(serial_port, file, config),
        Commands::Receive { ref output_dir } => run_receive(serial_port, output_dir, config),
    };

    if let Err(e) = result {
        eprintln!("Transfer failed: {}", e);
        std::process::exit(1);
    }
}

fn run_send(
    serial_port: RealSerialPort,
    file: &PathBuf,
    config: LinkConfig,
) -> Result<(), TransferError> {
    if !file.exists() {
        return Err(TransferError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", file.display()),
        )));
    }

    let mut conn = Connection::open(Box::new(serial_port), config)?;
    transfer::send_file(&mut conn, file)?;
    conn.close()?;
    Ok(())
}

fn run_receive(
    serial_port: RealSerialPort,
    output_dir: &PathBuf,
    config: LinkConfig,
) -> Result<(), TransferError> {
    if !output_dir.exists() {
        return Err(TransferError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Output directory not found: {}", output_dir.display()),
        )));
    }

    let mut conn = Connection::open(Box::new(serial_port), config)?;
    transfer::receive_file(&mut conn, output_dir)?;
    conn.close()?;
    Ok(())
}
