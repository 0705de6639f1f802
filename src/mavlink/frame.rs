//! A MAVLink frame: enough of the wire bytes to forward unmodified, or
//! to patch a command payload in place and re-checksum before
//! forwarding.

use super::crc;
use bytes::Bytes;

pub(super) const STX_V1: u8 = 0xFE;
pub(super) const STX_V2: u8 = 0xFD;
pub(super) const HEADER_LEN_V1: usize = 6;
pub(super) const HEADER_LEN_V2: usize = 10;
const CHECKSUM_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MavVersion {
    V1,
    V2,
}

/// A single MAVLink frame, born in the parser and consumed by the
/// policy engine. `data` holds the complete wire bytes: STX, header,
/// payload, checksum, and (v2, signed) the trailing signature.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
    version: MavVersion,
    payload_offset: usize,
    payload_len: usize,
    signature_len: usize,
}

impl Frame {
    pub(super) fn new_v1(data: Vec<u8>, payload_len: usize) -> Self {
        Self {
            data,
            version: MavVersion::V1,
            payload_offset: HEADER_LEN_V1,
            payload_len,
            signature_len: 0,
        }
    }

    pub(super) fn new_v2(data: Vec<u8>, payload_len: usize, signature_len: usize) -> Self {
        Self {
            data,
            version: MavVersion::V2,
            payload_offset: HEADER_LEN_V2,
            payload_len,
            signature_len,
        }
    }

    #[inline]
    pub fn version(&self) -> MavVersion {
        self.version
    }

    #[inline]
    pub fn sys_id(&self) -> u8 {
        match self.version {
            MavVersion::V1 => self.data[3],
            MavVersion::V2 => self.data[5],
        }
    }

    #[inline]
    pub fn comp_id(&self) -> u8 {
        match self.version {
            MavVersion::V1 => self.data[4],
            MavVersion::V2 => self.data[6],
        }
    }

    #[inline]
    pub fn msg_id(&self) -> u32 {
        match self.version {
            MavVersion::V1 => self.data[5] as u32,
            MavVersion::V2 => u32::from_le_bytes([self.data[7], self.data[8], self.data[9], 0]),
        }
    }

    #[inline]
    pub fn sequence(&self) -> u8 {
        match self.version {
            MavVersion::V1 => self.data[2],
            MavVersion::V2 => self.data[4],
        }
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[self.payload_offset..self.payload_offset + self.payload_len]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Append this frame's wire bytes to `out`, returning the number of
    /// bytes written.
    pub fn encode_to_bytes(&self, out: &mut Vec<u8>) -> usize {
        out.extend_from_slice(&self.data);
        self.data.len()
    }

    /// Patch the payload's latitude/longitude/altitude fields with
    /// `home` and recompute the checksum, as required by a
    /// geofence-triggered rewrite. `lat_off`/`lon_off`/`alt_off` are
    /// byte offsets into the payload of the respective fields, and
    /// `coord_is_fixed_point` selects between COMMAND_LONG's plain f32
    /// fields and COMMAND_INT's 1e7-scaled i32 fields for lat/lon.
    pub fn rewrite_coordinate(
        &mut self,
        lat_off: usize,
        lon_off: usize,
        alt_off: usize,
        home: (f64, f64, f32),
        coord_is_fixed_point: bool,
    ) {
        let base = self.payload_offset;
        let (lat, lon, alt) = home;

        if coord_is_fixed_point {
            let x = (lat * 1e7).round() as i32;
            let y = (lon * 1e7).round() as i32;
            self.data[base + lat_off..base + lat_off + 4].copy_from_slice(&x.to_le_bytes());
            self.data[base + lon_off..base + lon_off + 4].copy_from_slice(&y.to_le_bytes());
        } else {
            self.data[base + lat_off..base + lat_off + 4]
                .copy_from_slice(&(lat as f32).to_le_bytes());
            self.data[base + lon_off..base + lon_off + 4]
                .copy_from_slice(&(lon as f32).to_le_bytes());
        }
        self.data[base + alt_off..base + alt_off + 4].copy_from_slice(&alt.to_le_bytes());

        self.recompute_checksum();
    }

    fn recompute_checksum(&mut self) {
        let Some(crc_extra) = crc::crc_extra_for(self.msg_id()) else {
            return;
        };
        let checksum_end = self.payload_offset + self.payload_len;
        let crc = crc::checksum(&self.data[1..checksum_end], crc_extra);
        self.data[checksum_end..checksum_end + CHECKSUM_LEN].copy_from_slice(&crc.to_le_bytes());
    }

    #[cfg(test)]
    pub(super) fn for_test(data: Vec<u8>, version: MavVersion, payload_len: usize) -> Self {
        let payload_offset = match version {
            MavVersion::V1 => HEADER_LEN_V1,
            MavVersion::V2 => HEADER_LEN_V2,
        };
        Self {
            data,
            version,
            payload_offset,
            payload_len,
            signature_len: 0,
        }
    }
}

/// Serialize a frame's already-computed bytes as an owned `Bytes`,
/// convenient for channel hand-off without re-copying at each hop.
impl From<&Frame> for Bytes {
    fn from(frame: &Frame) -> Self {
        Bytes::copy_from_slice(frame.as_bytes())
    }
}
