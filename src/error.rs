use thiserror::Error;

use crate::status::GripperFault;

#[derive(Debug, Error)]
pub enum GripperError {
    #[error("malformed status response: expected at least {expected} registers, got {actual}")]
    MalformedResponse { expected: usize, actual: usize },
    #[error("std io error, serial or tcp comm error")]
    IOError(#[from] std::io::Error),
    #[error("Modbus protocol or transport error: {0}")]
    ModbusError(#[from] tokio_modbus::Error),
    #[error("A server (slave) exception: {0:?}")]
    ModbusException(#[from] tokio_modbus::Exception),
    #[error("gripper fault: {0}")]
    GripperFault(#[from] GripperFault),
    #[error("invalid configuration: {0}")]
    ConfigError(#[from] serde_json::Error),
}

impl GripperError {
    /// Whether the error came from the connection rather than from the data.
    pub fn is_transport(&self) -> bool {
        matches!(self, GripperError::IOError(_) | GripperError::ModbusError(_))
    }
}
