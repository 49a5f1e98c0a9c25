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

//! File transfer on top of the link layer: START/DATA/END packets

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::link::{Connection, LinkError, Received};
use crate::protocol::SequenceBit;

/// File bytes carried per DATA packet
pub const DATA_CHUNK: usize = 128;

/// Data packet - one chunk of file content
const PACKET_DATA: u8 = 0x01;

/// Start packet - opens a transfer, carries file size and name
const PACKET_START: u8 = 0x02;

/// End packet - closes a transfer, repeats the START metadata
const PACKET_END: u8 = 0x03;

/// Field tag for the file size in a control packet
const FIELD_SIZE: u8 = 0x00;

/// Field tag for the file name in a control packet
const FIELD_NAME: u8 = 0x01;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("link failure: {0}")]
    Link(#[from] LinkError),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected packet kind {0:#04x}")]
    UnexpectedPacket(u8),

    #[error("malformed control packet")]
    BadControlPacket,

    #[error("malformed data packet")]
    BadDataPacket,

    #[error("data packet {got} arrived, expected {expected}")]
    SequenceGap { expected: u8, got: u8 },

    #[error("END packet does not match the announced file")]
    MetadataMismatch,

    #[error("received {got} bytes of an announced {announced}")]
    SizeMismatch { announced: u64, got: u64 },
}

// ============================================================================
// Packet Formats
// ============================================================================

/// START/END packet: kind, size field (8 big-endian bytes), name field.
fn control_packet(kind: u8, size: u64, name: &str) -> Vec<u8> {
    let name = &name.as_bytes()[..name.len().min(255)];
    let mut packet = Vec::with_capacity(13 + name.len());
    packet.push(kind);
    packet.push(FIELD_SIZE);
    packet.push(8);
    packet.extend_from_slice(&size.to_be_bytes());
    packet.push(FIELD_NAME);
    packet.push(name.len() as u8);
    packet.extend_from_slice(name);
    packet
}

fn parse_control(packet: &[u8]) -> Result<(u64, String), TransferError> {
    if packet.len() < 13 || packet[1] != FIELD_SIZE || packet[2] != 8 {
        return Err(TransferError::BadControlPacket);
    }
    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&packet[3..11]);
    let size = u64::from_be_bytes(size_bytes);

    if packet[11] != FIELD_NAME {
        return Err(TransferError::BadControlPacket);
    }
    let name_len = packet[12] as usize;
    if packet.len() != 13 + name_len {
        return Err(TransferError::BadControlPacket);
    }
    let name = String::from_utf8_lossy(&packet[13..]).into_owned();

    Ok((size, name))
}

/// DATA packet: kind, wrapping sequence number, 16-bit length, chunk.
fn data_packet(seq: u8, chunk: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(4 + chunk.len());
    packet.push(PACKET_DATA);
    packet.push(seq);
    packet.push((chunk.len() >> 8) as u8);
    packet.push((chunk.len() & 0xFF) as u8);
    packet.extend_from_slice(chunk);
    packet
}

fn parse_data(packet: &[u8]) -> Result<(u8, &[u8]), TransferError> {
    if packet.len() < 4 {
        return Err(TransferError::BadDataPacket);
    }
    let seq = packet[1];
    let len = ((packet[2] as usize) << 8) | packet[3] as usize;
    if packet.len() != 4 + len {
        return Err(TransferError::BadDataPacket);
    }
    Ok((seq, &packet[4..]))
}

// ============================================================================
// Transmitter Side
// ============================================================================

/// Sends one file over an established connection. Returns the number of
/// file bytes transferred.
pub fn send_file(conn: &mut Connection, path: &Path) -> Result<u64, TransferError> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("unnamed");

    info!(file = name, bytes = size, "starting transfer");

    let mut bit = SequenceBit::Zero;
    conn.send(&control_packet(PACKET_START, size, name), bit)?;
    bit = bit.toggled();

    let mut chunk = [0u8; DATA_CHUNK];
    let mut seq: u8 = 0;
    let mut sent: u64 = 0;
    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        conn.send(&data_packet(seq, &chunk[..n]), bit)?;
        bit = bit.toggled();
        seq = seq.wrapping_add(1);
        sent += n as u64;
        debug!(sent, total = size, "chunk delivered");
    }

    conn.send(&control_packet(PACKET_END, size, name), bit)?;

    info!(file = name, bytes = sent, "transfer finished");
    Ok(sent)
}

// ============================================================================
// Receiver Side
// ============================================================================

/// Waits for the next packet, answering repeated handshakes along the way.
fn next_packet(conn: &mut Connection, bit: SequenceBit) -> Result<Vec<u8>, TransferError> {
    loop {
        match conn.receive(bit)? {
            Received::Data(packet) => return Ok(packet),
            Received::HandshakeRepeated => continue,
        }
    }
}

/// Receives one file over an established connection into `output_dir`.
/// Returns the path of the written file.
pub fn receive_file(conn: &mut Connection, output_dir: &Path) -> Result<PathBuf, TransferError> {
    let mut bit = SequenceBit::Zero;

    let start = next_packet(conn, bit)?;
    if start.first() != Some(&PACKET_START) {
        return Err(TransferError::UnexpectedPacket(*start.first().unwrap_or(&0)));
    }
    let (announced, name) = parse_control(&start)?;
    bit = bit.toggled();

    // Only the base name is honored, wherever the sender got the file from.
    let base = Path::new(&name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("received.bin"));
    let dest = output_dir.join(base);
    let mut file = File::create(&dest)?;

    info!(file = %dest.display(), bytes = announced, "receiving transfer");

    let mut next_seq: u8 = 0;
    let mut written: u64 = 0;
    loop {
        let packet = next_packet(conn, bit)?;
        match *packet.first().unwrap_or(&0) {
            PACKET_DATA => {
                let (seq, chunk) = parse_data(&packet)?;
                if seq != next_seq {
                    return Err(TransferError::SequenceGap {
                        expected: next_seq,
                        got: seq,
                    });
                }
                file.write_all(chunk)?;
                next_seq = next_seq.wrapping_add(1);
                written += chunk.len() as u64;
                bit = bit.toggled();
                debug!(written, total = announced, "chunk stored");
            }
            PACKET_END => {
                let (end_size, end_name) = parse_control(&packet)?;
                if end_size != announced || end_name != name {
                    return Err(TransferError::MetadataMismatch);
                }
                if written != announced {
                    return Err(TransferError::SizeMismatch {
                        announced,
                        got: written,
                    });
                }
                break;
            }
            kind => return Err(TransferError::UnexpectedPacket(kind)),
        }
    }
    file.flush()?;

    info!(file = %dest.display(), bytes = written, "transfer finished");
    Ok(dest)
}

// ============================================================================
// Tests
// ============================================================================
