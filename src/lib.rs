//! # cmodel-gripper
//!
//! `cmodel-gripper` is a library for driving a Robotiq C-Model gripper over Modbus,
//! as fitted to a UR5 arm.
//!
//! - [`codec`] translates a [`GripperCommand`] into the command register block and
//!   a status register block back into a [`GripperStatus`]. Pure, no I/O.
//! - [`GripperDriver`] re-sends the latest command at a fixed cadence (20 Hz by
//!   default) over Modbus TCP or RTU and publishes every decoded status.
//! - [`ManualController`] is the key table behind the `gripper-console` binary.
//!
//! ## Example
//! ```no_run
//! use cmodel_gripper::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GripperError> {
//!     let mut gripper = GripperDriver::tcp("192.168.1.11:502".parse().unwrap());
//!
//!     // reset, then activate and wait for the activation routine
//!     gripper.reset().await?.activate().await?.await_activate().await?;
//!
//!     // close at full speed and force, and see why the fingers stopped
//!     let motion = gripper.go_to(0xFF, 0xFF, 0xFF).await?.await_go_to().await?;
//!     println!("object detected: {}", motion.detected_obj());
//!
//!     // the raw codec needs no connection at all
//!     let registers = encode(&GripperCommand::new().activate(true).position(300));
//!     assert_eq!(registers[1], 0xFF00);
//!     Ok(())
//! }
//! ```

pub mod codec;
mod command;
mod config;
mod controller;
mod driver;
mod error;
mod link;
mod status;

pub use codec::{decode, encode, COMMAND_REGISTER_COUNT, STATUS_REGISTER_COUNT};
pub use command::{GripperCommand, MeasureInput};
pub use config::{ControllerConfig, DriverConfig, RegisterMap, Scaling, StatusRegisters, Transport};
pub use controller::{Key, ManualController};
pub use driver::{GripperDriver, MIN_PERIOD};
pub use error::GripperError;
pub use link::{ModbusLink, RegisterLink};
pub use status::{ActivationStatus, GripperFault, GripperStatus, MotionStatus, MAJOR_FAULT_CODE};
