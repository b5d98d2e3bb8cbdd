use serde::{Deserialize, Serialize};

/// Largest value a single byte register field accepts.
pub const BYTE_MAX: i32 = u8::MAX as i32;

/// Measurement channel reported when `measure` is enabled.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeasureInput {
    /// Input `0`
    Input0 = 0,
    /// Input `1`, the channel the manual controller uses.
    #[default]
    Input1 = 1,
}

impl From<i32> for MeasureInput {
    /// Saturates to the nearest channel: anything `<= 0` is input 0.
    fn from(value: i32) -> Self {
        if value <= 0 {
            MeasureInput::Input0
        } else {
            MeasureInput::Input1
        }
    }
}

/// Robot Output / Functionalities
///
/// Written to the command block (4 holding registers).
/// Numeric fields are kept as `i32` so any integer can be handed over;
/// they are saturated to the device range when encoded, never rejected.
///
/// ## Reset
/// To reset the gripper send a command with `activate = false`.
///
/// ## Activating the gripper
/// To activate the gripper, send a command with `activate = true`.
///
/// `activate` needs to remain `true` in all following commands, otherwise the gripper will reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GripperCommand {
    /// Reduced-force operating mode.
    pub safe_mode: bool,
    /// First action to be made prior to any other actions, the activation bit will activate the gripper.
    /// Clear it to reset the gripper and clear any fault status.
    ///
    /// ## Warning
    /// when setting `activate = true`, the gripper will begin movement to complete its activation.
    ///
    /// ## Caution
    /// The bit must stay on afterward for any other action to be performed.
    pub activate: bool,
    /// Enable measurement/feedback reporting on the channel chosen by `measure_input`.
    pub measure: bool,
    /// Which measurement channel to report, `0` or `1`.
    pub measure_input: i32,
    /// Target finger position, `0x00` to `0xFF` in device units.
    ///
    /// `0` and `255` correspond to the two mechanical stops,
    /// with a quasi-linear relationship between the two values.
    pub position: i32,
    /// Closing and opening speed, `0x00` (minimum) to `0xFF` (maximum).
    /// Setting a speed alone will not initiate a motion.
    pub velocity: i32,
    /// Final gripping force, `0x00` (minimum) to `0xFF` (maximum).
    /// The force fixes the maximum current sent to the motor.
    /// If the current limit is exceeded, the fingers stop and report a contact.
    pub force: i32,
}

impl GripperCommand {
    /// Create a new default gripper command. An all-zero command resets the gripper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduced-force operating mode.
    pub fn safe_mode(mut self, b: bool) -> Self {
        self.safe_mode = b;
        self
    }
    /// Set the activation bit. Clearing it resets the gripper and its fault status.
    pub fn activate(mut self, b: bool) -> Self {
        self.activate = b;
        self
    }
    /// Enable measurement reporting.
    pub fn measure(mut self, b: bool) -> Self {
        self.measure = b;
        self
    }
    /// Measurement channel, saturated to `0..=1`.
    pub fn measure_input(mut self, input: i32) -> Self {
        self.measure_input = input;
        self
    }
    /// Target position in device units.
    pub fn position(mut self, pos: i32) -> Self {
        self.position = pos;
        self
    }
    /// Closing/opening speed in device units.
    pub fn velocity(mut self, vel: i32) -> Self {
        self.velocity = vel;
        self
    }
    /// Force limit in device units.
    pub fn force(mut self, force: i32) -> Self {
        self.force = force;
        self
    }

    /// Copy of this command with every numeric field saturated to its device range.
    pub fn clamp(&self) -> Self {
        Self {
            measure_input: MeasureInput::from(self.measure_input) as i32,
            position: self.position.clamp(0, BYTE_MAX),
            velocity: self.velocity.clamp(0, BYTE_MAX),
            force: self.force.clamp(0, BYTE_MAX),
            ..*self
        }
    }

    /// The measurement channel, saturated.
    pub fn channel(&self) -> MeasureInput {
        MeasureInput::from(self.measure_input)
    }

    /// Position as the byte that goes on the wire.
    pub fn position_byte(&self) -> u8 {
        saturate(self.position)
    }
    /// Velocity as the byte that goes on the wire.
    pub fn velocity_byte(&self) -> u8 {
        saturate(self.velocity)
    }
    /// Force as the byte that goes on the wire.
    pub fn force_byte(&self) -> u8 {
        saturate(self.force)
    }
}

fn saturate(value: i32) -> u8 {
    u8::try_from(value.clamp(0, BYTE_MAX)).unwrap_or(u8::MAX)
}
