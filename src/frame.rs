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

//! Frame codec: construction, byte stuffing, and validation

use thiserror::Error;
use tracing::debug;

use crate::protocol::*;

/// Largest logical payload accepted for a single information frame.
pub const MAX_PAYLOAD: usize = 512;

/// Largest stuffed frame the collector will accumulate: every interior
/// byte of a maximal frame doubled, plus the two flags.
pub const MAX_WIRE_FRAME: usize = 2 * (MAX_PAYLOAD + 4) + 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("escape byte followed by {0:#04x}")]
    InvalidEscape(u8),
}

/// XOR-fold of the payload bytes; the empty payload folds to 0x00.
///
/// Cannot detect reordered payload bytes, a known weakness of the scheme.
pub fn bcc2(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Builds an unstuffed information frame around `payload`.
pub fn information(seq: SequenceBit, payload: &[u8]) -> Vec<u8> {
    let control = seq.information_control();
    let mut frame = Vec::with_capacity(payload.len() + 6);
    frame.push(FLAG);
    frame.push(ADDR_TX);
    frame.push(control);
    frame.push(ADDR_TX ^ control);
    frame.extend_from_slice(payload);
    frame.push(bcc2(payload));
    frame.push(FLAG);
    frame
}

/// Escapes every interior flag or escape byte; the two delimiters are
/// copied unchanged.
pub fn stuff(frame: &[u8]) -> Vec<u8> {
    let last = frame.len() - 1;
    let mut out = Vec::with_capacity(frame.len());
    out.push(frame[0]);
    for &b in &frame[1..last] {
        if b == FLAG || b == ESC {
            out.push(ESC);
            out.push(b ^ ESC_MASK);
        } else {
            out.push(b);
        }
    }
    out.push(frame[last]);
    out
}

/// Reverses [`stuff`]. An escape byte must be followed by an escaped flag
/// or an escaped escape; anything else fails.
pub fn destuff(wire: &[u8]) -> Result<Vec<u8>, CodecError> {
    let last = wire.len() - 1;
    let mut out = Vec::with_capacity(wire.len());
    out.push(wire[0]);
    let mut i = 1;
    while i < last {
        if wire[i] == ESC {
            let escaped = wire[i + 1];
            if escaped == FLAG ^ ESC_MASK {
                out.push(FLAG);
            } else if escaped == ESC ^ ESC_MASK {
                out.push(ESC);
            } else {
                return Err(CodecError::InvalidEscape(escaped));
            }
            i += 2;
        } else {
            out.push(wire[i]);
            i += 1;
        }
    }
    out.push(wire[last]);
    Ok(out)
}

/// Classification of a destuffed candidate frame against the sequence bit
/// the receiver expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    /// Valid information frame carrying the expected bit.
    Accepted,
    /// Valid information frame carrying the previous bit; a retransmit of
    /// a frame that was already delivered.
    Duplicate,
    /// Structural or checksum defect anywhere in the frame.
    Malformed,
    /// An exact SET image; the peer never saw our UA and is still trying
    /// to establish.
    HandshakeRepeated,
}

pub fn classify(frame: &[u8], expected: SequenceBit) -> FrameClass {
    if frame.len() == 5 && frame == &supervisory(ADDR_TX, CTRL_SET)[..] {
        return FrameClass::HandshakeRepeated;
    }
    if frame.len() < 6 {
        return FrameClass::Malformed;
    }
    let last = frame.len() - 1;
    if frame[0] != FLAG || frame[last] != FLAG {
        return FrameClass::Malformed;
    }
    if frame[1] != ADDR_TX {
        return FrameClass::Malformed;
    }
    let control = frame[2];
    if control != CTRL_INFO_0 && control != CTRL_INFO_1 {
        return FrameClass::Malformed;
    }
    if frame[3] != (frame[1] ^ frame[2]) {
        return FrameClass::Malformed;
    }
    let payload = &frame[4..last - 1];
    if bcc2(payload) != frame[last - 1] {
        return FrameClass::Malformed;
    }
    if control == expected.information_control() {
        FrameClass::Accepted
    } else {
        FrameClass::Duplicate
    }
}

/// A checksum-1-valid 5-byte frame found on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Supervisory {
    pub address: u8,
    pub control: u8,
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    OpeningFlag,
    Address,
    Control,
    Check,
    ClosingFlag,
    Skip,
}

/// Byte-at-a-time scanner for 5-byte supervisory frames. Any byte that
/// breaks the expected shape restarts the scan, so line noise between
/// frames is skipped; an unexpected flag is taken as the opening flag of a
/// new frame.
pub struct SupervisoryScanner {
    state: ScanState,
    address: u8,
    control: u8,
    check: u8,
}

impl SupervisoryScanner {
    pub fn new() -> Self {
        SupervisoryScanner {
            state: ScanState::OpeningFlag,
            address: 0,
            control: 0,
            check: 0,
        }
    }

    pub fn push(&mut self, byte: u8) -> Option<Supervisory> {
        match self.state {
            ScanState::OpeningFlag => {
                if byte == FLAG {
                    self.state = ScanState::Address;
                }
            }
            ScanState::Address => {
                // A run of flags keeps the frame open at this position.
                if byte != FLAG {
                    self.address = byte;
                    self.state = ScanState::Control;
                }
            }
            ScanState::Control => {
                if byte == FLAG {
                    self.state = ScanState::Address;
                } else {
                    self.control = byte;
                    self.state = ScanState::Check;
                }
            }
            ScanState::Check => {
                if byte == FLAG {
                    self.state = ScanState::Address;
                } else {
                    self.check = byte;
                    self.state = ScanState::ClosingFlag;
                }
            }
            ScanState::ClosingFlag => {
                if byte == FLAG {
                    self.state = ScanState::Address;
                    if self.check == (self.address ^ self.control) {
                        return Some(Supervisory {
                            address: self.address,
                            control: self.control,
                        });
                    }
                } else {
                    self.state = ScanState::Skip;
                }
            }
            ScanState::Skip => {
                if byte == FLAG {
                    self.state = ScanState::Address;
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy)]
enum CollectState {
    OpeningFlag,
    Address,
    Body,
}

/// Result of feeding one byte to the [`FrameCollector`].
#[derive(Debug, PartialEq, Eq)]
pub enum Collected {
    Pending,
    /// A complete candidate, still stuffed, from opening to closing flag.
    Frame(Vec<u8>),
    /// The candidate outgrew [`MAX_WIRE_FRAME`] and was discarded.
    Overflow,
}

/// Accumulates wire bytes into candidate information frames: an opening
/// flag, the transmitter address, then everything up to the next flag.
pub struct FrameCollector {
    state: CollectState,
    buf: Vec<u8>,
}

impl FrameCollector {
    pub fn new() -> Self {
        FrameCollector {
            state: CollectState::OpeningFlag,
            buf: Vec::new(),
        }
    }

    pub fn push(&mut self, byte: u8) -> Collected {
        match self.state {
            CollectState::OpeningFlag => {
                if byte == FLAG {
                    self.buf.clear();
                    self.buf.push(FLAG);
                    self.state = CollectState::Address;
                }
            }
            CollectState::Address => {
                if byte == FLAG {
                    // Still at the opening flag.
                } else if byte == ADDR_TX {
                    self.buf.push(byte);
                    self.state = CollectState::Body;
                } else {
                    self.state = CollectState::OpeningFlag;
                }
            }
            CollectState::Body => {
                if byte == FLAG {
                    self.buf.push(FLAG);
                    self.state = CollectState::OpeningFlag;
                    return Collected::Frame(std::mem::take(&mut self.buf));
                }
                if self.buf.len() >= MAX_WIRE_FRAME {
                    debug!(limit = MAX_WIRE_FRAME, "frame exceeded size limit, discarded");
                    self.state = CollectState::OpeningFlag;
                    self.buf.clear();
                    return Collected::Overflow;
                }
                self.buf.push(byte);
            }
        }
        Collected::Pending
    }
}
