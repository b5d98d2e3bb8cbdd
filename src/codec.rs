//! Register codec: `GripperCommand` to the command block, status block to `GripperStatus`.
//!
//! Every register is a big-endian byte pair `[high, low]`; single byte
//! fields always sit in the high byte.
//!
//! | reg | command block      | status block            |
//! |-----|--------------------|-------------------------|
//! | 0   | `[flags, 0]`       | `[status, fault]`       |
//! | 1   | `[position, 0]`    | `[position, pos_req]`   |
//! | 2   | `[velocity, 0]`    | `[velocity, 0]`         |
//! | 3   | `[force, 0]`       | `[force, 0]`            |

use num::FromPrimitive;

use crate::command::{GripperCommand, MeasureInput};
use crate::error::GripperError;
use crate::status::{ActivationStatus, GripperFault, GripperStatus, MotionStatus};

/// Registers written per command.
pub const COMMAND_REGISTER_COUNT: usize = 4;
/// Registers needed to decode one status.
pub const STATUS_REGISTER_COUNT: usize = 4;

/// Activation request, echoed in the status byte.
pub const FLAG_ACT: u8 = 1 << 0;
/// Safe mode request, echoed in the status byte.
pub const FLAG_SAFE: u8 = 1 << 2;
/// Measurement enabled, echoed in the status byte.
pub const FLAG_MEASURE: u8 = 1 << 3;

/// Measurement select field of the action request, bits 3-4.
const MEASURE_SHIFT: u8 = 3;
const MEASURE_INPUT_1: u8 = 0b01;
const MEASURE_INPUT_0: u8 = 0b10;

/// Activation state field of the status byte, bits 4-5.
const ACTIVATION_SHIFT: u8 = 4;
/// Motion field of the status byte, bits 6-7.
const MOTION_SHIFT: u8 = 6;

const FAULT_CODE_MASK: u8 = 0x0F;

/// Pack a command into the command block. Never fails, numeric fields are saturated.
pub fn encode(command: &GripperCommand) -> [u16; COMMAND_REGISTER_COUNT] {
    let cmd = command.clamp();
    let mut req = 0;

    if cmd.activate {
        req |= FLAG_ACT;
    }
    if cmd.safe_mode {
        req |= FLAG_SAFE;
    }
    if cmd.measure {
        let select = match cmd.channel() {
            MeasureInput::Input1 => MEASURE_INPUT_1,
            MeasureInput::Input0 => MEASURE_INPUT_0,
        };
        req |= select << MEASURE_SHIFT;
    }

    [
        u16::from_be_bytes([req, 0]),
        u16::from_be_bytes([cmd.position_byte(), 0]),
        u16::from_be_bytes([cmd.velocity_byte(), 0]),
        u16::from_be_bytes([cmd.force_byte(), 0]),
    ]
}

/// Unpack a status block. Registers beyond the status block are ignored.
pub fn decode(registers: &[u16]) -> Result<GripperStatus, GripperError> {
    let [r0, r1, r2, r3] = match registers {
        [r0, r1, r2, r3, ..] => [*r0, *r1, *r2, *r3],
        _ => {
            return Err(GripperError::MalformedResponse {
                expected: STATUS_REGISTER_COUNT,
                actual: registers.len(),
            })
        }
    };
    let [status_byte, fault_code] = r0.to_be_bytes();
    let [position, position_request] = r1.to_be_bytes();
    let [velocity, _] = r2.to_be_bytes();
    let [force, _] = r3.to_be_bytes();

    let fault = match fault_code & FAULT_CODE_MASK {
        0 => None,
        code => Some(GripperFault::from_u8(code).unwrap_or(GripperFault::Unknown)),
    };

    let (activation, motion) = if GripperFault::is_major(fault_code) {
        (ActivationStatus::Fault, MotionStatus::Fault)
    } else {
        (
            ActivationStatus::from_u8((status_byte >> ACTIVATION_SHIFT) & 0b11)
                .unwrap_or(ActivationStatus::Unknown),
            MotionStatus::from_u8((status_byte >> MOTION_SHIFT) & 0b11)
                .unwrap_or(MotionStatus::Unknown),
        )
    };

    Ok(GripperStatus {
        act: status_byte & FLAG_ACT != 0,
        safe_mode: status_byte & FLAG_SAFE != 0,
        measure: status_byte & FLAG_MEASURE != 0,
        activation,
        motion,
        fault,
        fault_code,
        status_byte,
        position_request,
        position,
        velocity,
        force,
    })
}
