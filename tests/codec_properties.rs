//! Property tests for the register codec.

use cmodel_gripper::{
    decode, encode, ActivationStatus, GripperCommand, GripperError, STATUS_REGISTER_COUNT,
};
use proptest::prelude::*;

fn any_command() -> impl Strategy<Value = GripperCommand> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        -3i32..5,
        any::<i32>(),
        any::<i32>(),
        any::<i32>(),
    )
        .prop_map(|(safe, act, measure, input, pos, vel, force)| {
            GripperCommand::new()
                .safe_mode(safe)
                .activate(act)
                .measure(measure)
                .measure_input(input)
                .position(pos)
                .velocity(vel)
                .force(force)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Position, velocity and force bytes survive an encoded block read back as status.
    #[test]
    fn prop_mirrored_bytes_round_trip(cmd in any_command()) {
        let clamped = cmd.clamp();
        let status = decode(&encode(&cmd)).map_err(|e| TestCaseError::fail(format!("{e}")))?;
        prop_assert_eq!(i32::from(status.position), clamped.position);
        prop_assert_eq!(i32::from(status.velocity), clamped.velocity);
        prop_assert_eq!(i32::from(status.force), clamped.force);
        prop_assert_eq!(status.fault, None);
        prop_assert_eq!(status.act, cmd.activate);
        prop_assert_eq!(status.safe_mode, cmd.safe_mode);
    }

    /// Out of range values clamp to the nearest bound.
    #[test]
    fn prop_out_of_range_saturates(value in any::<i32>()) {
        let regs = encode(&GripperCommand::new().position(value).velocity(value).force(value));
        let expected = u16::from_be_bytes([value.clamp(0, 255) as u8, 0]);
        prop_assert_eq!(regs[1], expected);
        prop_assert_eq!(regs[2], expected);
        prop_assert_eq!(regs[3], expected);
    }

    /// Clamping is idempotent and encoding does not depend on it.
    #[test]
    fn prop_clamp_idempotent(cmd in any_command()) {
        prop_assert_eq!(cmd.clamp().clamp(), cmd.clamp());
        prop_assert_eq!(encode(&cmd), encode(&cmd.clamp()));
    }

    /// Low bytes of the command block are reserved and always zero.
    #[test]
    fn prop_reserved_bytes_zero(cmd in any_command()) {
        for reg in encode(&cmd) {
            prop_assert_eq!(reg & 0x00FF, 0);
        }
    }

    /// Any block of at least the status length decodes, and decoding is deterministic.
    #[test]
    fn prop_decode_total_and_deterministic(regs in prop::collection::vec(any::<u16>(), STATUS_REGISTER_COUNT..8)) {
        let first = decode(&regs).map_err(|e| TestCaseError::fail(format!("{e}")))?;
        let second = decode(&regs).map_err(|e| TestCaseError::fail(format!("{e}")))?;
        prop_assert_eq!(first, second);
    }

    /// Blocks shorter than the status length are rejected.
    #[test]
    fn prop_short_block_malformed(regs in prop::collection::vec(any::<u16>(), 0..STATUS_REGISTER_COUNT)) {
        let short = matches!(
            decode(&regs),
            Err(GripperError::MalformedResponse { actual, .. }) if actual == regs.len()
        );
        prop_assert!(short);
    }
}

#[test]
fn unknown_status_pattern_decodes_to_unknown_twice() {
    // activation bits 4-5 = 0b10 is not in the map
    let regs = [0x2100, 0x0000, 0x0000, 0x0000];
    let first = decode(&regs).unwrap();
    assert_eq!(first.activation, ActivationStatus::Unknown);
    assert_eq!(decode(&regs).unwrap(), first);
}

#[test]
fn documented_open_example() {
    let cmd = GripperCommand::new()
        .safe_mode(false)
        .activate(true)
        .measure(true)
        .measure_input(1)
        .position(4095)
        .velocity(400)
        .force(200);
    assert_eq!(encode(&cmd), [0x0900, 0xFF00, 0xFF00, 0xC800]);
}

#[test]
fn documented_status_example() {
    let status = decode(&[0x0000, 0x7F00, 0x0000, 0x0000]).unwrap();
    assert_eq!(status.fault, None);
    assert_eq!(status.position, 127);
}
