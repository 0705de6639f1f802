//! The policy engine: message whitelist plus geofence on navigation
//! commands.

pub mod constants;
pub mod geofence;

use crate::mavlink::{self, CommandInt, Frame};
use constants::*;
use geofence::{inside, Point, Polygon};
use tracing::trace;

/// Outcome of evaluating one frame.
pub enum Verdict {
    /// Forward the frame exactly as received.
    Forward(Frame),
    /// Forward the frame after patching its navigation target to
    /// `HOME_POSITION` and re-checksumming.
    ForwardRewritten(Frame),
    /// Drop the frame; nothing is forwarded.
    Drop,
}

/// A geographic target pulled out of a command payload. NaN latitude or
/// longitude means "unset" and always drops the frame.
#[derive(Debug, Clone, Copy)]
struct Coordinate {
    latitude: f64,
    longitude: f64,
    altitude: f32,
}

/// Evaluate one frame against the whitelist and, for navigation
/// commands, the geofence.
pub fn evaluate(frame: Frame) -> Verdict {
    match frame.msg_id() {
        MSG_ID_HEARTBEAT | MSG_ID_PING | MSG_ID_PARAM_REQUEST_READ => Verdict::Forward(frame),
        MSG_ID_COMMAND_LONG => evaluate_command_long(frame),
        MSG_ID_COMMAND_INT => evaluate_command_int(frame),
        other => {
            trace!(msg_id = other, "policy: unknown message id, dropping");
            Verdict::Drop
        }
    }
}

fn evaluate_command_long(frame: Frame) -> Verdict {
    let Some(cmd) = mavlink::decode_command_long(&frame) else {
        trace!("policy: malformed COMMAND_LONG payload, dropping");
        return Verdict::Drop;
    };

    match cmd.command {
        MAV_CMD_NAV_LAND | MAV_CMD_NAV_TAKEOFF => {
            let coord = Coordinate {
                latitude: cmd.param5 as f64,
                longitude: cmd.param6 as f64,
                altitude: cmd.param7,
            };
            geofence_check(
                frame,
                coord,
                mavlink::commands::command_long_offsets::PARAM5,
                mavlink::commands::command_long_offsets::PARAM6,
                mavlink::commands::command_long_offsets::PARAM7,
                false,
            )
        }
        MAV_CMD_DO_SET_MODE
        | MAV_CMD_COMPONENT_ARM_DISARM
        | MAV_CMD_SET_MESSAGE_INTERVAL
        | MAV_CMD_REQUEST_MESSAGE => Verdict::Forward(frame),
        other => {
            trace!(command = other, "policy: unknown MAV_CMD, dropping");
            Verdict::Drop
        }
    }
}

fn evaluate_command_int(frame: Frame) -> Verdict {
    let Some(cmd) = mavlink::decode_command_int(&frame) else {
        trace!("policy: malformed COMMAND_INT payload, dropping");
        return Verdict::Drop;
    };
    let CommandInt { x, y, z } = cmd;
    let coord = Coordinate {
        latitude: x as f64 * 1e-7,
        longitude: y as f64 * 1e-7,
        altitude: z,
    };
    geofence_check(
        frame,
        coord,
        mavlink::commands::command_int_offsets::X,
        mavlink::commands::command_int_offsets::Y,
        mavlink::commands::command_int_offsets::Z,
        true,
    )
}

fn geofence_check(
    mut frame: Frame,
    coord: Coordinate,
    lat_off: usize,
    lon_off: usize,
    alt_off: usize,
    coord_is_fixed_point: bool,
) -> Verdict {
    if coord.latitude.is_nan() || coord.longitude.is_nan() {
        trace!("policy: NaN coordinate, dropping");
        return Verdict::Drop;
    }

    let target = Point::new(coord.latitude, coord.longitude);
    let fence = Polygon::new(&GEOFENCE_POLYGON);

    if inside(target, fence) {
        trace!("policy: target inside geofence, forwarding");
        return Verdict::Forward(frame);
    }

    trace!("policy: target outside geofence, rewriting to home");
    frame.rewrite_coordinate(lat_off, lon_off, alt_off, HOME_POSITION, coord_is_fixed_point);
    Verdict::ForwardRewritten(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mavlink::{Frame, MavParser};

    fn build_frame(bytes: &[u8]) -> Frame {
        let mut parser = MavParser::new();
        let mut got = None;
        for &b in bytes {
            if let Some(f) = parser.parse_byte(b) {
                got = Some(f);
            }
        }
        got.expect("test frame should parse")
    }

    fn command_long_bytes(command: u16, param5: f32, param6: f32, param7: f32) -> Vec<u8> {
        use mavlink::commands::command_long_offsets::*;
        let mut payload = vec![0u8; 33];
        payload[PARAM5..PARAM5 + 4].copy_from_slice(&param5.to_le_bytes());
        payload[PARAM6..PARAM6 + 4].copy_from_slice(&param6.to_le_bytes());
        payload[PARAM7..PARAM7 + 4].copy_from_slice(&param7.to_le_bytes());
        payload[COMMAND..COMMAND + 2].copy_from_slice(&command.to_le_bytes());

        let mut data = vec![0xFEu8, payload.len() as u8, 0, 1, 1, MSG_ID_COMMAND_LONG as u8];
        data.extend_from_slice(&payload);
        let crc = mavlink::crc::checksum(
            &data[1..],
            mavlink::crc::crc_extra_for(MSG_ID_COMMAND_LONG).unwrap(),
        );
        data.extend_from_slice(&crc.to_le_bytes());
        data
    }

    fn command_int_bytes(x: i32, y: i32, z: f32) -> Vec<u8> {
        use mavlink::commands::command_int_offsets::*;
        let mut payload = vec![0u8; 35];
        payload[X..X + 4].copy_from_slice(&x.to_le_bytes());
        payload[Y..Y + 4].copy_from_slice(&y.to_le_bytes());
        payload[Z..Z + 4].copy_from_slice(&z.to_le_bytes());

        let mut data = vec![0xFEu8, payload.len() as u8, 0, 1, 1, MSG_ID_COMMAND_INT as u8];
        data.extend_from_slice(&payload);
        let crc = mavlink::crc::checksum(
            &data[1..],
            mavlink::crc::crc_extra_for(MSG_ID_COMMAND_INT).unwrap(),
        );
        data.extend_from_slice(&crc.to_le_bytes());
        data
    }

    #[test]
    fn s1_in_fence_landing_forwards_unchanged() {
        let bytes = command_long_bytes(21, 48.0550, 11.6525, 0.0);
        let frame = build_frame(&bytes);
        match evaluate(frame) {
            Verdict::Forward(f) => assert_eq!(f.as_bytes(), bytes.as_slice()),
            _ => panic!("expected Forward"),
        }
    }

    #[test]
    fn s2_out_of_fence_landing_rewritten_to_home() {
        let bytes = command_long_bytes(21, 48.2557, 11.5865, 0.0);
        let frame = build_frame(&bytes);
        match evaluate(frame) {
            Verdict::ForwardRewritten(f) => {
                use mavlink::commands::command_long_offsets::*;
                let payload = f.payload();
                let lat = f32::from_le_bytes(payload[PARAM5..PARAM5 + 4].try_into().unwrap());
                let lon = f32::from_le_bytes(payload[PARAM6..PARAM6 + 4].try_into().unwrap());
                let alt = f32::from_le_bytes(payload[PARAM7..PARAM7 + 4].try_into().unwrap());
                assert!((lat as f64 - HOME_POSITION.0).abs() < 1e-4);
                assert!((lon as f64 - HOME_POSITION.1).abs() < 1e-4);
                assert!(alt.is_nan());
            }
            _ => panic!("expected ForwardRewritten"),
        }
    }

    #[test]
    fn s3_unknown_command_is_dropped() {
        let bytes = command_long_bytes(999, 0.0, 0.0, 0.0);
        let frame = build_frame(&bytes);
        assert!(matches!(evaluate(frame), Verdict::Drop));
    }

    #[test]
    fn s4_command_int_fixed_point_inside_fence_forwards() {
        let bytes = command_int_bytes(480552968, 116523968, 0.0);
        let frame = build_frame(&bytes);
        assert!(matches!(evaluate(frame), Verdict::Forward(_)));
    }

    #[test]
    fn s5_nan_coordinate_is_dropped() {
        let bytes = command_long_bytes(22, f32::NAN, 11.6525, 0.0);
        let frame = build_frame(&bytes);
        assert!(matches!(evaluate(frame), Verdict::Drop));
    }

    #[test]
    fn rewrite_is_idempotent_on_a_second_pass() {
        let bytes = command_long_bytes(21, 48.2557, 11.5865, 0.0);
        let frame = build_frame(&bytes);
        let once = match evaluate(frame) {
            Verdict::ForwardRewritten(f) => f,
            _ => panic!("expected ForwardRewritten"),
        };
        let mut re_encoded = Vec::new();
        once.encode_to_bytes(&mut re_encoded);
        let twice_frame = build_frame(&re_encoded);
        match evaluate(twice_frame) {
            Verdict::Forward(f) => assert_eq!(f.as_bytes(), re_encoded.as_slice()),
            _ => panic!("expected already-home coordinate to forward, got different verdict"),
        }
    }
}
