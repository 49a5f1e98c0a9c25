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

//! Stop-and-wait link layer: connection establishment, acknowledged frame
//! delivery, and teardown over a raw serial line.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::frame::{
    Collected, FrameClass, FrameCollector, SupervisoryScanner, MAX_PAYLOAD, classify, destuff,
    information, stuff,
};
use crate::protocol::*;
use crate::serial::SerialPort;

/// How long a responder-side scan blocks on the channel before looping.
const RESPONDER_POLL: Duration = Duration::from_millis(500);

// ============================================================================
// Configuration & Error Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Transmitter,
    Receiver,
}

/// Immutable per-connection settings.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub role: Role,
    /// Deadline for each transmission attempt.
    pub timeout: Duration,
    /// Retries after the initial transmission; the attempt budget is one
    /// more than this.
    pub max_retransmissions: u32,
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("no answer to SET after {attempts} attempts")]
    ConnectTimeout { attempts: u32 },

    #[error("information frame not acknowledged after {attempts} attempts")]
    AckTimeout { attempts: u32 },

    #[error("no answer to DISC after {attempts} attempts")]
    DisconnectTimeout { attempts: u32 },

    #[error("payload of {len} bytes exceeds the {max} byte frame limit")]
    Oversized { len: usize, max: usize },

    #[error("serial channel error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a successful [`Connection::receive`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum Received {
    /// An information frame was accepted; its payload.
    Data(Vec<u8>),
    /// The peer repeated its SET handshake (our UA was lost); a fresh UA
    /// was sent and no data was delivered. Retry with the same bit.
    HandshakeRepeated,
}

// ============================================================================
// Retry / Deadline Bookkeeping
// ============================================================================

/// Connection-scoped attempt counter and transmission deadline. The
/// deadline is a monotonic instant checked between channel reads; the read
/// itself is bounded by the remaining wait, so an attempt ends either on a
/// decisive reply or when the remaining time runs out.
struct RetryState {
    attempts_used: u32,
    deadline: Option<Instant>,
}

impl RetryState {
    fn new() -> Self {
        RetryState {
            attempts_used: 0,
            deadline: None,
        }
    }

    fn reset(&mut self) {
        self.attempts_used = 0;
        self.deadline = None;
    }

    /// Claims the next attempt slot. `budget` is the retry count, so the
    /// total number of slots is `budget + 1`.
    fn start_attempt(&mut self, budget: u32) -> bool {
        if self.attempts_used > budget {
            return false;
        }
        self.attempts_used += 1;
        true
    }

    fn arm(&mut self, timeout: Duration) {
        self.deadline = Some(Instant::now() + timeout);
    }

    fn disarm(&mut self) {
        self.deadline = None;
    }

    /// Time left before the armed deadline; `None` once it has elapsed.
    fn remaining(&self) -> Option<Duration> {
        self.deadline
            .and_then(|d| d.checked_duration_since(Instant::now()))
    }

    fn attempts(&self) -> u32 {
        self.attempts_used
    }
}

// ============================================================================
// Connection
// ============================================================================

/// An established link-layer connection. Created by [`Connection::open`],
/// consumed by [`Connection::close`]; dropping it releases the channel
/// without the disconnect handshake.
pub struct Connection {
    channel: Box<dyn SerialPort>,
    config: LinkConfig,
    retry: RetryState,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

impl Connection {
    /// Performs the establishment handshake for the configured role.
    pub fn open(channel: Box<dyn SerialPort>, config: LinkConfig) -> Result<Self, LinkError> {
        let mut conn = Connection {
            channel,
            config,
            retry: RetryState::new(),
        };

        match conn.config.role {
            Role::Transmitter => {
                let set = supervisory(ADDR_TX, CTRL_SET);
                if !conn.initiate(&set, ADDR_TX, CTRL_UA)? {
                    return Err(LinkError::ConnectTimeout {
                        attempts: conn.retry.attempts(),
                    });
                }
            }
            Role::Receiver => {
                conn.await_supervisory(ADDR_TX, CTRL_SET)?;
                conn.channel.write_all(&supervisory(ADDR_TX, CTRL_UA))?;
            }
        }

        info!(role = ?conn.config.role, "connection established");
        Ok(conn)
    }

    /// Sends one payload as an information frame tagged with `seq` and
    /// waits for its acknowledgment. Returns the wire byte count on
    /// success; the caller toggles `seq` before the next payload.
    pub fn send(&mut self, payload: &[u8], seq: SequenceBit) -> Result<usize, LinkError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(LinkError::Oversized {
                len: payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        // Stuffed once; every retransmission sends these exact bytes.
        let wire = stuff(&information(seq, payload));

        self.retry.reset();
        while self.retry.start_attempt(self.config.max_retransmissions) {
            self.channel.write_all(&wire)?;
            debug!(
                attempt = self.retry.attempts(),
                bytes = wire.len(),
                "information frame sent"
            );
            self.retry.arm(self.config.timeout);

            let mut scanner = SupervisoryScanner::new();
            while let Some(remaining) = self.retry.remaining() {
                let Some(byte) = self.channel.read_byte(remaining)? else {
                    break;
                };
                let Some(reply) = scanner.push(byte) else {
                    continue;
                };
                if reply.address != ADDR_TX {
                    continue;
                }
                if reply.control == seq.reject_control() {
                    warn!("frame rejected, retransmitting");
                    self.channel.discard_pending()?;
                    break;
                }
                if reply.control == seq.toggled().ready_control() {
                    self.retry.disarm();
                    debug!(bytes = wire.len(), "frame acknowledged");
                    return Ok(wire.len());
                }
                // Any other supervisory frame: keep scanning this attempt.
            }
            self.retry.disarm();
        }

        Err(LinkError::AckTimeout {
            attempts: self.retry.attempts(),
        })
    }

    /// Blocks until an information frame tagged with `expected` arrives.
    /// Malformed and duplicate frames are answered and absorbed here; only
    /// channel failures surface as errors.
    pub fn receive(&mut self, expected: SequenceBit) -> Result<Received, LinkError> {
        let mut collector = FrameCollector::new();
        loop {
            let Some(byte) = self.channel.read_byte(RESPONDER_POLL)? else {
                continue;
            };
            let raw = match collector.push(byte) {
                Collected::Pending => continue,
                Collected::Frame(raw) => raw,
                Collected::Overflow => {
                    warn!("oversized frame rejected");
                    self.channel
                        .write_all(&supervisory(ADDR_TX, expected.reject_control()))?;
                    continue;
                }
            };

            let frame = match destuff(&raw) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(error = %err, "frame rejected");
                    self.channel
                        .write_all(&supervisory(ADDR_TX, expected.reject_control()))?;
                    continue;
                }
            };

            match classify(&frame, expected) {
                FrameClass::HandshakeRepeated => {
                    debug!("SET repeated, answering with a fresh UA");
                    self.channel.write_all(&supervisory(ADDR_TX, CTRL_UA))?;
                    return Ok(Received::HandshakeRepeated);
                }
                FrameClass::Malformed => {
                    warn!(bytes = frame.len(), "frame rejected");
                    self.channel
                        .write_all(&supervisory(ADDR_TX, expected.reject_control()))?;
                }
                FrameClass::Duplicate => {
                    debug!("duplicate frame, acknowledged again");
                    self.channel
                        .write_all(&supervisory(ADDR_TX, expected.ready_control()))?;
                }
                FrameClass::Accepted => {
                    self.channel
                        .write_all(&supervisory(ADDR_TX, expected.toggled().ready_control()))?;
                    let payload = frame[4..frame.len() - 2].to_vec();
                    debug!(bytes = payload.len(), "frame accepted");
                    return Ok(Received::Data(payload));
                }
            }
        }
    }

    /// Performs the disconnect handshake for the configured role and
    /// releases the channel. The channel is released even when the
    /// handshake fails.
    pub fn close(mut self) -> Result<(), LinkError> {
        match self.config.role {
            Role::Transmitter => {
                let disc = supervisory(ADDR_TX, CTRL_DISC);
                if !self.initiate(&disc, ADDR_RX, CTRL_DISC)? {
                    return Err(LinkError::DisconnectTimeout {
                        attempts: self.retry.attempts(),
                    });
                }
                // Final acknowledgment; the peer does not answer it.
                self.channel.write_all(&supervisory(ADDR_RX, CTRL_UA))?;
            }
            Role::Receiver => {
                self.await_supervisory(ADDR_TX, CTRL_DISC)?;
                self.channel.write_all(&supervisory(ADDR_RX, CTRL_DISC))?;
                self.await_supervisory(ADDR_RX, CTRL_UA)?;
            }
        }

        info!(role = ?self.config.role, "connection closed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared initiator / responder primitives
    // ------------------------------------------------------------------

    /// Initiator half of a command handshake: send `request`, scan for the
    /// expected reply until the deadline, retry within the attempt budget.
    /// `Ok(false)` means the budget ran out without a reply.
    fn initiate(
        &mut self,
        request: &[u8; 5],
        reply_address: u8,
        reply_control: u8,
    ) -> Result<bool, LinkError> {
        self.retry.reset();
        while self.retry.start_attempt(self.config.max_retransmissions) {
            self.channel.write_all(request)?;
            debug!(
                attempt = self.retry.attempts(),
                control = request[2],
                "command frame sent"
            );
            self.retry.arm(self.config.timeout);

            let mut scanner = SupervisoryScanner::new();
            while let Some(remaining) = self.retry.remaining() {
                let Some(byte) = self.channel.read_byte(remaining)? else {
                    break;
                };
                if let Some(reply) = scanner.push(byte) {
                    if reply.address == reply_address && reply.control == reply_control {
                        self.retry.disarm();
                        return Ok(true);
                    }
                }
            }
            self.retry.disarm();
            debug!(attempt = self.retry.attempts(), "no reply before the deadline");
        }
        Ok(false)
    }

    /// Responder half: scan without a deadline for one specific 5-byte
    /// frame. The initiator owns the retry budget, so this side waits as
    /// long as it takes.
    fn await_supervisory(&mut self, address: u8, control: u8) -> Result<(), LinkError> {
        let mut scanner = SupervisoryScanner::new();
        loop {
            let Some(byte) = self.channel.read_byte(RESPONDER_POLL)? else {
                continue;
            };
            if let Some(frame) = scanner.push(byte) {
                if frame.address == address && frame.control == control {
                    return Ok(());
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::MockSerialPort;

    const SET: [u8; 5] = [0x7E, 0x03, 0x03, 0x00, 0x7E];
    const UA: [u8; 5] = [0x7E, 0x03, 0x07, 0x04, 0x7E];
    const RR_0: [u8; 5] = [0x7E, 0x03, 0x05, 0x06, 0x7E];
    const RR_1: [u8; 5] = [0x7E, 0x03, 0x85, 0x86, 0x7E];
    const REJ_0: [u8; 5] = [0x7E, 0x03, 0x01, 0x02, 0x7E];
    const DISC_TX: [u8; 5] = [0x7E, 0x03, 0x0B, 0x08, 0x7E];
    const DISC_RX: [u8; 5] = [0x7E, 0x01, 0x0B, 0x0A, 0x7E];
    const UA_FINAL: [u8; 5] = [0x7E, 0x01, 0x07, 0x06, 0x7E];

    fn config(role: Role) -> LinkConfig {
        LinkConfig {
            role,
            timeout: Duration::from_millis(50),
            max_retransmissions: 3,
        }
    }

    fn connection(mock: MockSerialPort, role: Role) -> Connection {
        Connection {
            channel: Box::new(mock),
            config: config(role),
            retry: RetryState::new(),
        }
    }

    fn feed(script: &mut Vec<Option<u8>>, bytes: &[u8]) {
        script.extend(bytes.iter().map(|&b| Some(b)));
    }

    #[test]
    fn test_open_transmitter() {
        let mut script = Vec::new();
        feed(&mut script, &UA);

        let mock = MockSerialPort::new(script, SET.to_vec());
        Connection::open(Box::new(mock), config(Role::Transmitter)).expect("should establish");
    }

    #[test]
    fn test_open_transmitter_retries_after_timeout() {
        let mut script = vec![None];
        feed(&mut script, &UA);

        let mut expected = SET.to_vec();
        expected.extend_from_slice(&SET);

        let mock = MockSerialPort::new(script, expected);
        Connection::open(Box::new(mock), config(Role::Transmitter)).expect("should establish");
    }

    #[test]
    fn test_open_transmitter_skips_noise_within_attempt() {
        let mut script = Vec::new();
        feed(&mut script, &[0x55, 0x7E, 0x99]);
        feed(&mut script, &UA);

        let mock = MockSerialPort::new(script, SET.to_vec());
        Connection::open(Box::new(mock), config(Role::Transmitter)).expect("should establish");
    }

    #[test]
    fn test_open_transmitter_exhausts_budget() {
        // Budget is 3 retries, so 4 attempts and 4 SET frames.
        let script = vec![None, None, None, None];
        let mut expected = Vec::new();
        for _ in 0..4 {
            expected.extend_from_slice(&SET);
        }

        let mock = MockSerialPort::new(script, expected);
        let err = Connection::open(Box::new(mock), config(Role::Transmitter))
            .expect_err("should exhaust");
        assert!(matches!(err, LinkError::ConnectTimeout { attempts: 4 }));
    }

    #[test]
    fn test_open_receiver_answers_set() {
        let mut script = vec![None];
        feed(&mut script, &[0x42]);
        feed(&mut script, &SET);

        let mock = MockSerialPort::new(script, UA.to_vec());
        Connection::open(Box::new(mock), config(Role::Receiver)).expect("should establish");
    }

    #[test]
    fn test_send_acknowledged_first_try() {
        let mut script = Vec::new();
        feed(&mut script, &RR_1);

        // Frame for payload [41 42 43] with bit 0.
        let wire = vec![0x7E, 0x03, 0x00, 0x03, 0x41, 0x42, 0x43, 0x40, 0x7E];

        let mock = MockSerialPort::new(script, wire.clone());
        let mut conn = connection(mock, Role::Transmitter);
        let written = conn
            .send(&[0x41, 0x42, 0x43], SequenceBit::Zero)
            .expect("should be acknowledged");
        assert_eq!(written, wire.len());
    }

    #[test]
    fn test_send_stuffs_payload() {
        let mut script = Vec::new();
        feed(&mut script, &RR_1);

        // Payload [7E]: both the payload byte and its matching checksum
        // must travel escaped.
        let wire = vec![0x7E, 0x03, 0x00, 0x03, 0x7D, 0x5E, 0x7D, 0x5E, 0x7E];

        let mock = MockSerialPort::new(script, wire);
        let mut conn = connection(mock, Role::Transmitter);
        conn.send(&[0x7E], SequenceBit::Zero).expect("should be acknowledged");
    }

    #[test]
    fn test_send_retransmits_on_reject() {
        let mut script = Vec::new();
        feed(&mut script, &REJ_0);
        feed(&mut script, &RR_1);

        let wire = vec![0x7E, 0x03, 0x00, 0x03, 0x41, 0x42, 0x43, 0x40, 0x7E];
        let mut expected = wire.clone();
        expected.extend_from_slice(&wire);

        let mock = MockSerialPort::new(script, expected);
        let mut conn = connection(mock, Role::Transmitter);
        let written = conn
            .send(&[0x41, 0x42, 0x43], SequenceBit::Zero)
            .expect("should succeed on the second copy");
        assert_eq!(written, wire.len());
    }

    #[test]
    fn test_send_ignores_unrelated_supervisory() {
        let mut script = Vec::new();
        // RR keyed to the outstanding bit is not the acknowledgment.
        feed(&mut script, &RR_0);
        feed(&mut script, &RR_1);

        let wire = vec![0x7E, 0x03, 0x00, 0x03, 0x41, 0x42, 0x43, 0x40, 0x7E];

        let mock = MockSerialPort::new(script, wire);
        let mut conn = connection(mock, Role::Transmitter);
        conn.send(&[0x41, 0x42, 0x43], SequenceBit::Zero)
            .expect("should wait for the right acknowledgment");
    }

    #[test]
    fn test_send_retry_bound() {
        // A dead line: one timed-out read per attempt, 4 identical frames.
        let script = vec![None, None, None, None];

        let wire = vec![0x7E, 0x03, 0x00, 0x03, 0x41, 0x42, 0x43, 0x40, 0x7E];
        let mut expected = Vec::new();
        for _ in 0..4 {
            expected.extend_from_slice(&wire);
        }

        let mock = MockSerialPort::new(script, expected);
        let mut conn = connection(mock, Role::Transmitter);
        let err = conn
            .send(&[0x41, 0x42, 0x43], SequenceBit::Zero)
            .expect_err("should exhaust");
        assert!(matches!(err, LinkError::AckTimeout { attempts: 4 }));
    }

    #[test]
    fn test_send_rejects_oversized_payload() {
        let mock = MockSerialPort::new(Vec::new(), Vec::new());
        let mut conn = connection(mock, Role::Transmitter);
        let err = conn
            .send(&vec![0u8; crate::frame::MAX_PAYLOAD + 1], SequenceBit::Zero)
            .expect_err("should refuse");
        assert!(matches!(err, LinkError::Oversized { .. }));
    }

    #[test]
    fn test_sequence_bit_alternates_across_sends() {
        let mut script = Vec::new();
        feed(&mut script, &RR_1);
        feed(&mut script, &RR_0);

        let first = vec![0x7E, 0x03, 0x00, 0x03, 0x11, 0x11, 0x7E];
        let second = vec![0x7E, 0x03, 0x40, 0x43, 0x22, 0x22, 0x7E];
        let mut expected = first.clone();
        expected.extend_from_slice(&second);

        let mock = MockSerialPort::new(script, expected);
        let mut conn = connection(mock, Role::Transmitter);

        let mut seq = SequenceBit::Zero;
        conn.send(&[0x11], seq).expect("first send");
        seq = seq.toggled();
        conn.send(&[0x22], seq).expect("second send");
    }

    #[test]
    fn test_receive_delivers_payload() {
        let mut script = Vec::new();
        feed(&mut script, &[0x7E, 0x03, 0x00, 0x03, 0x41, 0x42, 0x43, 0x40, 0x7E]);

        let mock = MockSerialPort::new(script, RR_1.to_vec());
        let mut conn = connection(mock, Role::Receiver);
        let received = conn.receive(SequenceBit::Zero).expect("should accept");
        assert_eq!(received, Received::Data(vec![0x41, 0x42, 0x43]));
    }

    #[test]
    fn test_receive_destuffs_payload() {
        let mut script = Vec::new();
        feed(&mut script, &[0x7E, 0x03, 0x00, 0x03, 0x7D, 0x5E, 0x7D, 0x5E, 0x7E]);

        let mock = MockSerialPort::new(script, RR_1.to_vec());
        let mut conn = connection(mock, Role::Receiver);
        let received = conn.receive(SequenceBit::Zero).expect("should accept");
        assert_eq!(received, Received::Data(vec![0x7E]));
    }

    #[test]
    fn test_receive_rejects_corrupt_frame_then_accepts() {
        let good = [0x7E, 0x03, 0x00, 0x03, 0x41, 0x42, 0x43, 0x40, 0x7E];
        let mut corrupt = good;
        corrupt[5] ^= 0x01;

        let mut script = Vec::new();
        feed(&mut script, &corrupt);
        feed(&mut script, &good);

        let mut expected = REJ_0.to_vec();
        expected.extend_from_slice(&RR_1);

        let mock = MockSerialPort::new(script, expected);
        let mut conn = connection(mock, Role::Receiver);
        let received = conn.receive(SequenceBit::Zero).expect("should accept the retransmit");
        assert_eq!(received, Received::Data(vec![0x41, 0x42, 0x43]));
    }

    #[test]
    fn test_receive_rejects_invalid_escape() {
        let mut script = Vec::new();
        feed(&mut script, &[0x7E, 0x03, 0x00, 0x03, 0x7D, 0x41, 0x00, 0x7E]);
        feed(&mut script, &[0x7E, 0x03, 0x00, 0x03, 0x41, 0x42, 0x43, 0x40, 0x7E]);

        let mut expected = REJ_0.to_vec();
        expected.extend_from_slice(&RR_1);

        let mock = MockSerialPort::new(script, expected);
        let mut conn = connection(mock, Role::Receiver);
        let received = conn.receive(SequenceBit::Zero).expect("should recover");
        assert_eq!(received, Received::Data(vec![0x41, 0x42, 0x43]));
    }

    #[test]
    fn test_receive_acknowledges_duplicate_without_delivery() {
        // The peer retransmits the bit-1 frame we already accepted, then
        // sends the fresh bit-0 frame.
        let duplicate = [0x7E, 0x03, 0x40, 0x43, 0x99, 0x99, 0x7E];
        let fresh = [0x7E, 0x03, 0x00, 0x03, 0x41, 0x42, 0x43, 0x40, 0x7E];

        let mut script = Vec::new();
        feed(&mut script, &duplicate);
        feed(&mut script, &fresh);

        let mut expected = RR_0.to_vec();
        expected.extend_from_slice(&RR_1);

        let mock = MockSerialPort::new(script, expected);
        let mut conn = connection(mock, Role::Receiver);
        let received = conn.receive(SequenceBit::Zero).expect("should deliver only the fresh frame");
        assert_eq!(received, Received::Data(vec![0x41, 0x42, 0x43]));
    }

    #[test]
    fn test_receive_answers_repeated_set() {
        let mut script = Vec::new();
        feed(&mut script, &SET);

        let mock = MockSerialPort::new(script, UA.to_vec());
        let mut conn = connection(mock, Role::Receiver);
        let received = conn.receive(SequenceBit::Zero).expect("should signal the repeat");
        assert_eq!(received, Received::HandshakeRepeated);
    }

    #[test]
    fn test_close_transmitter() {
        let mut script = Vec::new();
        feed(&mut script, &DISC_RX);

        let mut expected = DISC_TX.to_vec();
        expected.extend_from_slice(&UA_FINAL);

        let mock = MockSerialPort::new(script, expected);
        let conn = connection(mock, Role::Transmitter);
        conn.close().expect("should disconnect");
    }

    #[test]
    fn test_close_transmitter_exhausts_budget() {
        let script = vec![None, None, None, None];
        let mut expected = Vec::new();
        for _ in 0..4 {
            expected.extend_from_slice(&DISC_TX);
        }

        let mock = MockSerialPort::new(script, expected);
        let conn = connection(mock, Role::Transmitter);
        let err = conn.close().expect_err("should exhaust");
        assert!(matches!(err, LinkError::DisconnectTimeout { attempts: 4 }));
    }

    #[test]
    fn test_close_receiver() {
        let mut script = Vec::new();
        feed(&mut script, &DISC_TX);
        feed(&mut script, &UA_FINAL);

        let mock = MockSerialPort::new(script, DISC_RX.to_vec());
        let conn = connection(mock, Role::Receiver);
        conn.close().expect("should disconnect");
    }

    #[test]
    fn test_full_transmitter_session() {
        let mut script = Vec::new();
        feed(&mut script, &UA);
        feed(&mut script, &RR_1);
        feed(&mut script, &DISC_RX);

        let wire = vec![0x7E, 0x03, 0x00, 0x03, 0x41, 0x42, 0x43, 0x40, 0x7E];
        let mut expected = SET.to_vec();
        expected.extend_from_slice(&wire);
        expected.extend_from_slice(&DISC_TX);
        expected.extend_from_slice(&UA_FINAL);

        let mock = MockSerialPort::new(script, expected);
        let mut conn =
            Connection::open(Box::new(mock), config(Role::Transmitter)).expect("open");
        conn.send(&[0x41, 0x42, 0x43], SequenceBit::Zero).expect("send");
        conn.close().expect("close");
    }
}
