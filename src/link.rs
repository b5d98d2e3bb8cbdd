use std::future::Future;
use std::io;
use std::time::Duration;

use tokio_modbus::client::{self, rtu, tcp, Client as _, Reader as _, Writer as _};
use tokio_modbus::Slave;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::{DriverConfig, RegisterMap, StatusRegisters, Transport};
use crate::error::GripperError;

/// A register oriented connection to the gripper.
///
/// Implementors own the connection lifecycle; the driver only asks for a
/// command block to be written and a status block to be read.
pub trait RegisterLink {
    /// Write the command block.
    fn write_command(
        &mut self,
        registers: &[u16],
    ) -> impl Future<Output = Result<(), GripperError>> + Send;

    /// Read `count` status registers.
    fn read_status(
        &mut self,
        count: u16,
    ) -> impl Future<Output = Result<Vec<u16>, GripperError>> + Send;

    /// Close the connection, if any.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;
}

/// Modbus TCP or RTU link on top of `tokio-modbus`.
///
/// Connects on first use. Any transport error drops the context so the
/// next request reconnects.
pub struct ModbusLink {
    config: DriverConfig,
    registers: RegisterMap,
    ctx: Option<client::Context>,
}

impl ModbusLink {
    pub fn new(config: DriverConfig) -> Self {
        let registers = config.register_map();
        Self {
            config,
            registers,
            ctx: None,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.ctx.is_some()
    }

    async fn context(&mut self) -> Result<&mut client::Context, GripperError> {
        let ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => connect(&self.config).await?,
        };
        Ok(self.ctx.insert(ctx))
    }

    fn settle<T>(&mut self, result: Result<T, GripperError>) -> Result<T, GripperError> {
        if let Err(err) = &result {
            if err.is_transport() {
                warn!(error = %err, "modbus transport error, dropping connection");
                self.ctx = None;
            }
        }
        result
    }
}

impl RegisterLink for ModbusLink {
    async fn write_command(&mut self, registers: &[u16]) -> Result<(), GripperError> {
        let address = self.registers.command_address;
        let timeout = self.config.timeout();
        let ctx = self.context().await?;
        let result = with_timeout(timeout, ctx.write_multiple_registers(address, registers)).await;
        self.settle(result)
    }

    async fn read_status(&mut self, count: u16) -> Result<Vec<u16>, GripperError> {
        let RegisterMap {
            status_address,
            status_registers,
            ..
        } = self.registers;
        let timeout = self.config.timeout();
        let ctx = self.context().await?;
        let result = match status_registers {
            StatusRegisters::Input => {
                with_timeout(timeout, ctx.read_input_registers(status_address, count)).await
            }
            StatusRegisters::Holding => {
                with_timeout(timeout, ctx.read_holding_registers(status_address, count)).await
            }
        };
        self.settle(result)
    }

    async fn disconnect(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            match ctx.disconnect().await {
                Ok(_) => debug!("modbus connection closed"),
                Err(err) => warn!(error = %err, "failed to close modbus connection"),
            }
        }
    }
}

async fn connect(config: &DriverConfig) -> Result<client::Context, GripperError> {
    let slave = Slave(config.slave_id);
    match &config.transport {
        Transport::Tcp { address } => {
            let ctx = tokio::time::timeout(config.timeout(), tcp::connect_slave(*address, slave))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "modbus tcp connect timed out"))??;
            info!(%address, slave_id = config.slave_id, "connected to gripper over modbus tcp");
            Ok(ctx)
        }
        Transport::Rtu { path, baud_rate } => {
            let port = tokio_serial::new(path.as_str(), *baud_rate)
                .data_bits(tokio_serial::DataBits::Eight)
                .stop_bits(tokio_serial::StopBits::One)
                .parity(tokio_serial::Parity::None)
                .timeout(config.timeout())
                .open_native_async()
                .map_err(io::Error::from)?;
            info!(%path, baud_rate, slave_id = config.slave_id, "attached to gripper over modbus rtu");
            Ok(rtu::attach_slave(port, slave))
        }
    }
}

async fn with_timeout<T, E, F>(timeout: Duration, request: F) -> Result<T, GripperError>
where
    F: Future<Output = Result<Result<T, E>, tokio_modbus::Error>>,
    GripperError: From<E>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(response) => Ok(response??),
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "modbus request timed out").into()),
    }
}
