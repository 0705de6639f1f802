//! Compile-time deployment constants: the operating-area geofence and the
//! redirect target for out-of-fence navigation commands.
//!
//! These are deliberately not part of `Config`; operator configuration
//! of the policy itself is by recompilation, per the spec.

use super::geofence::Point;

/// Four WGS-84 vertices bounding the operating area.
pub const GEOFENCE_POLYGON: [Point; 4] = [
    Point::new(48.05550749800078, 11.651234342011845),
    Point::new(48.055803409139486, 11.653684004312566),
    Point::new(48.05469452629921, 11.654558805494695),
    Point::new(48.05404812004936, 11.652732871302717),
];

/// Redirect target for out-of-fence navigation commands. Altitude is
/// NaN: it carries no meaning for the home position, only latitude and
/// longitude do.
pub const HOME_POSITION: (f64, f64, f32) = (48.05502700126609, 11.652206077452211, f32::NAN);

// MAVLink message ids the policy dispatches on.
pub const MSG_ID_HEARTBEAT: u32 = 0;
pub const MSG_ID_PING: u32 = 4;
pub const MSG_ID_COMMAND_INT: u32 = 75;
pub const MSG_ID_COMMAND_LONG: u32 = 76;
pub const MSG_ID_PARAM_REQUEST_READ: u32 = 20;

// MAV_CMD command codes relevant to COMMAND_LONG's sub-policy.
pub const MAV_CMD_NAV_LAND: u16 = 21;
pub const MAV_CMD_NAV_TAKEOFF: u16 = 22;
pub const MAV_CMD_DO_SET_MODE: u16 = 176;
pub const MAV_CMD_COMPONENT_ARM_DISARM: u16 = 400;
pub const MAV_CMD_SET_MESSAGE_INTERVAL: u16 = 511;
pub const MAV_CMD_REQUEST_MESSAGE: u16 = 512;
