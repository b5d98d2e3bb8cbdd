use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The gripper's activation state, bits 4-5 of the gripper status byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationStatus {
    /// Gripper is in reset. See the fault status if the activation bit is set.
    Reset = 0,
    /// Activation in progress
    Activating = 1,
    /// Activation is completed
    Active = 3,
    /// A major fault is latched, a reset is required before any motion.
    Fault,
    /// Bit pattern not in the published map.
    Unknown,
}

/// Motion status, bits 6-7 of the gripper status byte.
/// Only meaningful while the gripper is active.
#[repr(u8)]
#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionStatus {
    /// Fingers are in motion towards the requested position.
    Moving = 0,
    /// Fingers stopped due to a contact while opening, before the requested position.
    ContactOpening = 1,
    /// Fingers stopped due to a contact while closing, before the requested position.
    ContactClosing = 2,
    /// Fingers are at the requested position. No object detected, or the object was dropped.
    AtRequested = 3,
    /// Stopped by a major fault.
    Fault,
    /// Bit pattern not in the published map.
    Unknown,
}

impl MotionStatus {
    /// Whether the fingers stopped on an object.
    pub fn detected_obj(&self) -> bool {
        matches!(self, MotionStatus::ContactOpening | MotionStatus::ContactClosing)
    }

    /// Whether the fingers are no longer moving, for whatever reason.
    pub fn stopped(&self) -> bool {
        !matches!(self, MotionStatus::Moving)
    }
}

/// Fault status, the low nibble of the fault byte.
/// Fault LED (red) is present on the gripper chassis,
/// LED can be blue, red or both and be solid or blinking.
#[repr(u8)]
#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GripperFault {
    /// Action delayed, the activation (re-activation) must be completed prior to performing the action
    ActionDelay = 0x05,
    /// The activation bit must be set prior to performing the action
    NotActivated = 0x07,
    /// Maximum operating temperature exceeded, let cool down
    OverHeated = 0x08,
    /// No communication during at least 1 second.
    NoComm = 0x09,
    /// Under minimum operating voltage
    UnderVoltage = 0x0A,
    /// Major fault 0x0B, raised by the gripper firmware, not by any command bit.
    MajorFault0B = 0x0B,
    /// Internal fault
    InternalFault = 0x0C,
    /// Activation fault, verify that no interference or other error occurred.
    ActivationFault = 0x0D,
    /// Overcurrent triggered.
    OverCurrent = 0x0E,
    /// Major fault 0x0F, raised by the gripper firmware, not by any command bit.
    MajorFault0F = 0x0F,
    /// Minor fault code not in the published map.
    /// Every code from `0x0A` up is mapped, so an unknown code is always minor.
    Unknown,
}

/// Lowest fault code of a major fault.
pub const MAJOR_FAULT_CODE: u8 = 0x0A;

impl GripperFault {
    /// Whether a raw fault nibble is a major fault.
    pub fn is_major(code: u8) -> bool {
        (code & 0x0F) >= MAJOR_FAULT_CODE
    }

    /// Major faults (LED blinking red/blue) need a reset, a rising edge on the activation bit.
    pub fn reset_required(&self) -> bool {
        match self {
            GripperFault::ActionDelay
            | GripperFault::NotActivated
            | GripperFault::OverHeated
            | GripperFault::NoComm
            | GripperFault::Unknown => false,
            GripperFault::UnderVoltage
            | GripperFault::MajorFault0B
            | GripperFault::InternalFault
            | GripperFault::ActivationFault
            | GripperFault::OverCurrent
            | GripperFault::MajorFault0F => true,
        }
    }
}

impl std::fmt::Display for GripperFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Robot Input / Status of the gripper
///
/// Decoded from the status block (4 registers).
/// A fresh snapshot per read, nothing is carried over between reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GripperStatus {
    /// Echo of the activation bit.
    pub act: bool,
    /// Echo of the safe mode bit.
    pub safe_mode: bool,
    /// Echo of the measure bit.
    pub measure: bool,
    /// Activation state of the gripper.
    pub activation: ActivationStatus,
    /// Current motion of the fingers.
    pub motion: MotionStatus,
    /// Decoded fault, `None` when the fault nibble is zero.
    pub fault: Option<GripperFault>,
    /// Raw fault byte, including the controller specific high nibble.
    pub fault_code: u8,
    /// Raw gripper status byte.
    pub status_byte: u8,
    /// Echo of the requested position, `0x00` to `0xFF`.
    pub position_request: u8,
    /// Actual position obtained via the encoders, `0x00` to `0xFF`.
    pub position: u8,
    /// Echo of the requested velocity.
    pub velocity: u8,
    /// Applied force, read instantaneously from the motor drive.
    pub force: u8,
}

impl GripperStatus {
    /// Controller specific fault bits, the masked high nibble of the fault byte (mask `0xF0`).
    pub fn k_flt(&self) -> u8 {
        self.fault_code & 0xF0
    }

    /// Whether a reset must be issued before motion commands are honored again.
    pub fn reset_required(&self) -> bool {
        GripperFault::is_major(self.fault_code)
    }

    /// Whether the gripper is activated and free of major faults.
    pub fn is_ready(&self) -> bool {
        self.activation == ActivationStatus::Active && !self.reset_required()
    }
}
