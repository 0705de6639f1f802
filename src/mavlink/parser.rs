//! Per-channel MAVLink stream parser: a byte-at-a-time state machine
//! that reassembles frames across arbitrary packet boundaries.
//!
//! Partial frames live in `MavParser`'s own buffer, never in the
//! caller's byte span; feeding `b1` then `b2` produces exactly the
//! frames that feeding `b1 ++ b2` would.

use super::crc;
use super::frame::{Frame, HEADER_LEN_V1, HEADER_LEN_V2, STX_V1, STX_V2};
use super::MavVersion;

const CHECKSUM_LEN: usize = 2;
const SIGNATURE_LEN: usize = 13;
const IFLAG_SIGNED: u8 = 0x01;

/// State for one MAVLink stream. One channel per direction that is
/// actually parsed; the PX4-bound path uses exactly one, since the
/// VM-bound path is never decoded.
#[derive(Debug, Default)]
pub struct MavParser {
    buf: Vec<u8>,
    version: Option<MavVersion>,
    payload_len: usize,
    total_len: usize,
}

impl MavParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Returns `Some(frame)` iff this byte completed a
    /// frame whose checksum validates (when its message id has a known
    /// `CRC_EXTRA`; ids the policy never handles fall through
    /// unchecked, since the policy's whitelist drops them regardless).
    pub fn parse_byte(&mut self, byte: u8) -> Option<Frame> {
        if self.buf.is_empty() {
            match byte {
                STX_V1 => {
                    self.version = Some(MavVersion::V1);
                    self.buf.push(byte);
                }
                STX_V2 => {
                    self.version = Some(MavVersion::V2);
                    self.buf.push(byte);
                }
                _ => {} // not synchronized to a frame start; discard
            }
            return None;
        }

        self.buf.push(byte);
        let version = self.version.expect("buffer non-empty implies version set");
        let header_len = match version {
            MavVersion::V1 => HEADER_LEN_V1,
            MavVersion::V2 => HEADER_LEN_V2,
        };

        if self.buf.len() == 2 {
            self.payload_len = self.buf[1] as usize;
        }

        if self.buf.len() < header_len {
            return None;
        }

        if self.buf.len() == header_len {
            let signature_len = match version {
                MavVersion::V2 if self.buf[2] & IFLAG_SIGNED != 0 => SIGNATURE_LEN,
                _ => 0,
            };
            self.total_len = header_len + self.payload_len + CHECKSUM_LEN + signature_len;
        }

        if self.buf.len() < self.total_len {
            return None;
        }

        self.complete_frame(version, header_len)
    }

    fn complete_frame(&mut self, version: MavVersion, header_len: usize) -> Option<Frame> {
        let data = std::mem::take(&mut self.buf);
        let payload_len = self.payload_len;
        let signature_len = data.len() - header_len - payload_len - CHECKSUM_LEN;
        self.version = None;
        self.payload_len = 0;
        self.total_len = 0;

        let msg_id = match version {
            MavVersion::V1 => data[5] as u32,
            MavVersion::V2 => u32::from_le_bytes([data[7], data[8], data[9], 0]),
        };

        if let Some(crc_extra) = crc::crc_extra_for(msg_id) {
            let expected = u16::from_le_bytes([
                data[header_len + payload_len],
                data[header_len + payload_len + 1],
            ]);
            let got = crc::checksum(&data[1..header_len + payload_len], crc_extra);
            if expected != got {
                return None;
            }
        }

        Some(match version {
            MavVersion::V1 => Frame::new_v1(data, payload_len),
            MavVersion::V2 => Frame::new_v2(data, payload_len, signature_len),
        })
    }
}
