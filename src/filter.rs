//! The filter pipeline: drives the MAVLink parser over a byte span,
//! asks the policy engine for a verdict on each completed frame, and
//! accumulates the approved bytes into an output buffer.

use crate::mavlink::MavParser;
use crate::metrics::Metrics;
use crate::policy::{self, Verdict};
use tracing::{debug, trace};

/// Owns the long-lived parser state for the VM→PX4 direction. One
/// instance per process: only this direction is ever parsed.
pub struct FilterPipeline {
    parser: MavParser,
    metrics: Metrics,
}

impl FilterPipeline {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            parser: MavParser::new(),
            metrics,
        }
    }

    /// Drive `input` through the parser byte-by-byte. Every frame the
    /// policy approves (forwarded or rewritten) is appended to `out` in
    /// arrival order; dropped frames contribute nothing. Bytes that
    /// don't complete a frame remain in the parser's own state for the
    /// next call; this is what makes
    /// `filter(b1) ++ filter(b2) == filter(b1 ++ b2)` hold for any split
    /// of a byte stream.
    pub fn filter(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &byte in input {
            let Some(frame) = self.parser.parse_byte(byte) else {
                continue;
            };

            self.metrics.record_received();
            let msg_id = frame.msg_id();

            match policy::evaluate(frame) {
                Verdict::Forward(frame) => {
                    let written = frame.encode_to_bytes(out);
                    self.metrics.record_forwarded(written);
                    trace!(msg_id, written, "filter: forwarded unchanged");
                }
                Verdict::ForwardRewritten(frame) => {
                    let written = frame.encode_to_bytes(out);
                    self.metrics.record_rewritten(written);
                    debug!(msg_id, "filter: rewritten to home position");
                }
                Verdict::Drop => {
                    self.metrics.record_dropped();
                    debug!(msg_id, "filter: dropped by policy");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mavlink::crc;
    use crate::policy::constants::{MSG_ID_COMMAND_LONG, MSG_ID_HEARTBEAT, MSG_ID_PING};

    fn heartbeat_bytes() -> Vec<u8> {
        let payload = [1u8, 1, 0, 0, 0, 0, 0, 4, 3];
        let mut data = vec![0xFEu8, payload.len() as u8, 0, 1, 1, MSG_ID_HEARTBEAT as u8];
        data.extend_from_slice(&payload);
        let c = crc::checksum(&data[1..], crc::crc_extra_for(MSG_ID_HEARTBEAT).unwrap());
        data.extend_from_slice(&c.to_le_bytes());
        data
    }

    fn ping_bytes() -> Vec<u8> {
        let payload = [0u8; 14];
        let mut data = vec![0xFEu8, payload.len() as u8, 0, 1, 1, MSG_ID_PING as u8];
        data.extend_from_slice(&payload);
        let c = crc::checksum(&data[1..], crc::crc_extra_for(MSG_ID_PING).unwrap());
        data.extend_from_slice(&c.to_le_bytes());
        data
    }

    fn unknown_id_bytes() -> Vec<u8> {
        vec![0xFEu8, 0, 0, 1, 1, 250, 0xAB, 0xCD]
    }

    fn command_long_bytes(command: u16) -> Vec<u8> {
        use crate::mavlink::commands::command_long_offsets::*;
        let mut payload = vec![0u8; 33];
        payload[COMMAND..COMMAND + 2].copy_from_slice(&command.to_le_bytes());
        let mut data = vec![0xFEu8, payload.len() as u8, 0, 1, 1, MSG_ID_COMMAND_LONG as u8];
        data.extend_from_slice(&payload);
        let c = crc::checksum(&data[1..], crc::crc_extra_for(MSG_ID_COMMAND_LONG).unwrap());
        data.extend_from_slice(&c.to_le_bytes());
        data
    }

    #[test]
    fn transparent_forward_of_heartbeat() {
        let mut pipeline = FilterPipeline::new(Metrics::new());
        let bytes = heartbeat_bytes();
        let mut out = Vec::new();
        pipeline.filter(&bytes, &mut out);
        assert_eq!(out, bytes);
    }

    #[test]
    fn whitelist_completeness_drops_unknown_id() {
        let mut pipeline = FilterPipeline::new(Metrics::new());
        let bytes = unknown_id_bytes();
        let mut out = Vec::new();
        pipeline.filter(&bytes, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn s3_unknown_command_long_produces_empty_output() {
        let mut pipeline = FilterPipeline::new(Metrics::new());
        let bytes = command_long_bytes(999);
        let mut out = Vec::new();
        pipeline.filter(&bytes, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn order_preservation_across_multiple_frames() {
        let mut pipeline = FilterPipeline::new(Metrics::new());
        let hb = heartbeat_bytes();
        let ping = ping_bytes();
        let mut input = Vec::new();
        input.extend_from_slice(&hb);
        input.extend_from_slice(&ping);

        let mut out = Vec::new();
        pipeline.filter(&input, &mut out);

        assert_eq!(&out[..hb.len()], hb.as_slice());
        assert_eq!(&out[hb.len()..], ping.as_slice());
    }

    #[test]
    fn s6_split_stream_first_half_yields_no_output() {
        let bytes = heartbeat_bytes();
        let split = bytes.len() / 2;

        let mut pipeline = FilterPipeline::new(Metrics::new());
        let mut out1 = Vec::new();
        pipeline.filter(&bytes[..split], &mut out1);
        assert!(out1.is_empty());

        let mut out2 = Vec::new();
        pipeline.filter(&bytes[split..], &mut out2);
        assert_eq!(out2, bytes);
    }

    #[test]
    fn stream_reassembly_matches_whole_buffer_filter() {
        let hb = heartbeat_bytes();
        let ping = ping_bytes();
        let mut whole = Vec::new();
        whole.extend_from_slice(&hb);
        whole.extend_from_slice(&ping);

        let mut whole_out = Vec::new();
        FilterPipeline::new(Metrics::new()).filter(&whole, &mut whole_out);

        let split = hb.len() + 3;
        let (b1, b2) = whole.split_at(split);
        let mut pipeline = FilterPipeline::new(Metrics::new());
        let mut split_out = Vec::new();
        pipeline.filter(b1, &mut split_out);
        pipeline.filter(b2, &mut split_out);

        assert_eq!(whole_out, split_out);
    }
}
