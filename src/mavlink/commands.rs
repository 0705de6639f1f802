//! Typed payload decoders for the two navigation-carrying message ids.
//! Field layout follows MAVLink's `common` dialect wire order.

use super::frame::Frame;

/// Byte offset (within the payload) of each field the policy engine
/// reads or rewrites.
pub mod command_long_offsets {
    pub const PARAM5: usize = 16;
    pub const PARAM6: usize = 20;
    pub const PARAM7: usize = 24;
    pub const COMMAND: usize = 28;
}

pub mod command_int_offsets {
    pub const X: usize = 16;
    pub const Y: usize = 20;
    pub const Z: usize = 24;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandLong {
    pub param5: f32,
    pub param6: f32,
    pub param7: f32,
    pub command: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandInt {
    pub x: i32,
    pub y: i32,
    pub z: f32,
}

fn f32_at(payload: &[u8], offset: usize) -> Option<f32> {
    payload
        .get(offset..offset + 4)?
        .try_into()
        .ok()
        .map(f32::from_le_bytes)
}

fn i32_at(payload: &[u8], offset: usize) -> Option<i32> {
    payload
        .get(offset..offset + 4)?
        .try_into()
        .ok()
        .map(i32::from_le_bytes)
}

fn u16_at(payload: &[u8], offset: usize) -> Option<u16> {
    payload
        .get(offset..offset + 2)?
        .try_into()
        .ok()
        .map(u16::from_le_bytes)
}

/// Decode a COMMAND_LONG payload. Returns `None` if the payload is
/// too short to contain the fields the policy needs; such a frame is
/// treated the same as an unrecognized command and dropped.
pub fn decode_command_long(frame: &Frame) -> Option<CommandLong> {
    let payload = frame.payload();
    Some(CommandLong {
        param5: f32_at(payload, command_long_offsets::PARAM5)?,
        param6: f32_at(payload, command_long_offsets::PARAM6)?,
        param7: f32_at(payload, command_long_offsets::PARAM7)?,
        command: u16_at(payload, command_long_offsets::COMMAND)?,
    })
}

/// Decode a COMMAND_INT payload.
pub fn decode_command_int(frame: &Frame) -> Option<CommandInt> {
    let payload = frame.payload();
    Some(CommandInt {
        x: i32_at(payload, command_int_offsets::X)?,
        y: i32_at(payload, command_int_offsets::Y)?,
        z: f32_at(payload, command_int_offsets::Z)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mavlink::frame::MavVersion;

    fn command_long_frame(command: u16, param5: f32, param6: f32, param7: f32) -> Frame {
        let mut payload = vec![0u8; 33];
        payload[command_long_offsets::PARAM5..command_long_offsets::PARAM5 + 4]
            .copy_from_slice(&param5.to_le_bytes());
        payload[command_long_offsets::PARAM6..command_long_offsets::PARAM6 + 4]
            .copy_from_slice(&param6.to_le_bytes());
        payload[command_long_offsets::PARAM7..command_long_offsets::PARAM7 + 4]
            .copy_from_slice(&param7.to_le_bytes());
        payload[command_long_offsets::COMMAND..command_long_offsets::COMMAND + 2]
            .copy_from_slice(&command.to_le_bytes());

        let mut data = vec![0xFEu8, payload.len() as u8, 0, 1, 1, 76];
        data.extend_from_slice(&payload);
        data.extend_from_slice(&[0, 0]); // checksum, unused in this test
        Frame::for_test(data, MavVersion::V1, payload.len())
    }

    #[test]
    fn decodes_param5_6_7_and_command() {
        let frame = command_long_frame(21, 48.0550, 11.6525, 0.0);
        let cmd = decode_command_long(&frame).unwrap();
        assert_eq!(cmd.command, 21);
        assert!((cmd.param5 - 48.0550).abs() < 1e-4);
        assert!((cmd.param6 - 11.6525).abs() < 1e-4);
    }
}
