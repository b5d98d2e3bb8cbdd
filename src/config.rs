use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::GripperError;

/// How the gripper is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transport {
    /// Modbus TCP, the gripper's ethernet adapter.
    Tcp { address: SocketAddr },
    /// Modbus RTU over an RS485 serial port.
    Rtu { path: String, baud_rate: u32 },
}

impl Transport {
    pub const DEFAULT_TCP_PORT: u16 = 502;
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;

    pub fn tcp(address: SocketAddr) -> Self {
        Transport::Tcp { address }
    }

    pub fn rtu(path: impl Into<String>) -> Self {
        Transport::Rtu {
            path: path.into(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
        }
    }
}

/// Where the status block is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusRegisters {
    Input,
    Holding,
}

/// Register addresses of the command and status blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterMap {
    pub command_address: u16,
    pub status_address: u16,
    pub status_registers: StatusRegisters,
}

impl RegisterMap {
    /// The ethernet adapter maps both blocks at zero, status in the input registers.
    pub const TCP: RegisterMap = RegisterMap {
        command_address: 0,
        status_address: 0,
        status_registers: StatusRegisters::Input,
    };
    /// The RS485 interface maps commands at `1000` and status at `2000`.
    pub const RTU: RegisterMap = RegisterMap {
        command_address: 1000,
        status_address: 2000,
        status_registers: StatusRegisters::Holding,
    };

    pub fn for_transport(transport: &Transport) -> Self {
        match transport {
            Transport::Tcp { .. } => Self::TCP,
            Transport::Rtu { .. } => Self::RTU,
        }
    }
}

/// Driver settings, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    pub transport: Transport,
    /// Modbus slave (unit) id.
    #[serde(default = "default_slave_id")]
    pub slave_id: u8,
    /// Command resend / status poll rate.
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
    /// Per request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Overrides the transport's default register map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registers: Option<RegisterMap>,
}

fn default_slave_id() -> u8 {
    DriverConfig::DEFAULT_SLAVE_ID
}

fn default_rate_hz() -> u32 {
    DriverConfig::DEFAULT_RATE_HZ
}

fn default_timeout_ms() -> u64 {
    500
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            transport: Transport::tcp(SocketAddr::from((
                [192, 168, 1, 11],
                Transport::DEFAULT_TCP_PORT,
            ))),
            slave_id: Self::DEFAULT_SLAVE_ID,
            rate_hz: Self::DEFAULT_RATE_HZ,
            timeout_ms: default_timeout_ms(),
            registers: None,
        }
    }
}

impl DriverConfig {
    /// The Default Modbus slave ID of robotiq gripper
    pub const DEFAULT_SLAVE_ID: u8 = 9;
    pub const DEFAULT_RATE_HZ: u32 = 20;
    /// Rates above this are capped.
    pub const MAX_RATE_HZ: u32 = 1000;

    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            ..Self::default()
        }
    }

    /// Tick period; a zero rate falls back to the default rate, and the rate
    /// is capped at `MAX_RATE_HZ`.
    pub fn period(&self) -> Duration {
        let hz = match self.rate_hz {
            0 => Self::DEFAULT_RATE_HZ,
            hz => hz.min(Self::MAX_RATE_HZ),
        };
        Duration::from_nanos(1_000_000_000 / u64::from(hz))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn register_map(&self) -> RegisterMap {
        self.registers
            .unwrap_or_else(|| RegisterMap::for_transport(&self.transport))
    }

    pub fn from_json(json: &str) -> Result<Self, GripperError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GripperError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GripperError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// How controller (UI) units become device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// `device = ui * 255 / full_scale`, rounded.
    #[default]
    Scaled,
    /// Hand the UI value over as is; the codec saturates it.
    Passthrough,
}

/// UI ranges of the manual controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub scaling: Scaling,
    pub position_full_scale: i32,
    pub velocity_full_scale: i32,
    pub force_full_scale: i32,
    /// Increment applied by the faster/slower and more/less force keys.
    pub step: i32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            scaling: Scaling::Scaled,
            position_full_scale: 4095,
            velocity_full_scale: 1000,
            force_full_scale: 1000,
            step: 25,
        }
    }
}
