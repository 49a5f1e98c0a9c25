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

//! SERLINK wire constants

/// Flag - delimits every frame at both ends
pub const FLAG: u8 = 0x7E;

/// Escape - prefixes a flag or escape byte occurring inside a frame
pub const ESC: u8 = 0x7D;

/// XOR mask applied to an escaped byte
pub const ESC_MASK: u8 = 0x20;

/// Address of frames travelling in the transmitter's direction
pub const ADDR_TX: u8 = 0x03;

/// Address of frames originated by the receiver during teardown
pub const ADDR_RX: u8 = 0x01;

/// Set-up - transmitter requests a connection
pub const CTRL_SET: u8 = 0x03;

/// Unnumbered acknowledgment - answers SET and the final DISC
pub const CTRL_UA: u8 = 0x07;

/// Information frame carrying sequence bit 0
pub const CTRL_INFO_0: u8 = 0x00;

/// Information frame carrying sequence bit 1
pub const CTRL_INFO_1: u8 = 0x40;

/// Receiver ready - positive acknowledgment keyed to bit 0
pub const CTRL_RR_0: u8 = 0x05;

/// Receiver ready - positive acknowledgment keyed to bit 1
pub const CTRL_RR_1: u8 = 0x85;

/// Reject - negative acknowledgment keyed to bit 0
pub const CTRL_REJ_0: u8 = 0x01;

/// Reject - negative acknowledgment keyed to bit 1
pub const CTRL_REJ_1: u8 = 0x81;

/// Disconnect - either side's half of the teardown handshake
pub const CTRL_DISC: u8 = 0x0B;

/// Alternating sequence bit tagging information frames and the
/// supervisory replies that acknowledge them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceBit {
    Zero,
    One,
}

impl SequenceBit {
    pub fn toggled(self) -> Self {
        match self {
            SequenceBit::Zero => SequenceBit::One,
            SequenceBit::One => SequenceBit::Zero,
        }
    }

    pub fn information_control(self) -> u8 {
        match self {
            SequenceBit::Zero => CTRL_INFO_0,
            SequenceBit::One => CTRL_INFO_1,
        }
    }

    pub fn ready_control(self) -> u8 {
        match self {
            SequenceBit::Zero => CTRL_RR_0,
            SequenceBit::One => CTRL_RR_1,
        }
    }

    pub fn reject_control(self) -> u8 {
        match self {
            SequenceBit::Zero => CTRL_REJ_0,
            SequenceBit::One => CTRL_REJ_1,
        }
    }
}

/// Builds a 5-byte supervisory or handshake frame. Checksum-1 covers the
/// address and control fields.
pub fn supervisory(address: u8, control: u8) -> [u8; 5] {
    [FLAG, address, control, address ^ control, FLAG]
}
