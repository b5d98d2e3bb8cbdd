use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::codec::{self, STATUS_REGISTER_COUNT};
use crate::command::GripperCommand;
use crate::config::{DriverConfig, Transport};
use crate::error::GripperError;
use crate::link::{ModbusLink, RegisterLink};
use crate::status::{ActivationStatus, GripperStatus, MotionStatus};

/// Polling period of the `await_*` helpers.
const POLL_PERIOD: Duration = Duration::from_millis(100);
/// Shortest tick period accepted by the driver.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Drives a gripper through a [`RegisterLink`].
///
/// Holds the last successfully decoded status so a malformed read never
/// replaces it with a partial one.
pub struct GripperDriver<L> {
    link: L,
    period: Duration,
    last_status: Option<GripperStatus>,
    fault_reported: bool,
}

impl GripperDriver<ModbusLink> {
    pub fn from_config(config: DriverConfig) -> Self {
        let period = config.period();
        Self::new(ModbusLink::new(config), period)
    }

    /// Constructor from the gripper's Modbus TCP address.
    pub fn tcp(address: SocketAddr) -> Self {
        Self::from_config(DriverConfig::new(Transport::tcp(address)))
    }

    /// Constructor from an RS485 serial port path.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self::from_config(DriverConfig::new(Transport::rtu(path)))
    }
}

impl<L: RegisterLink> GripperDriver<L> {
    /// Periods shorter than [`MIN_PERIOD`] are raised to it.
    pub fn new(link: L, period: Duration) -> Self {
        Self {
            link,
            period: period.max(MIN_PERIOD),
            last_status: None,
            fault_reported: false,
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Last successfully decoded status.
    pub fn last_status(&self) -> Option<GripperStatus> {
        self.last_status
    }

    /// Write a `GripperCommand` to the gripper.
    pub async fn write_async(&mut self, cmd: &GripperCommand) -> Result<(), GripperError> {
        self.link.write_command(&codec::encode(cmd)).await
    }

    /// Read a fresh `GripperStatus` from the gripper.
    pub async fn read_async(&mut self) -> Result<GripperStatus, GripperError> {
        let registers = self.link.read_status(STATUS_REGISTER_COUNT as u16).await?;
        let status = codec::decode(&registers)?;
        self.last_status = Some(status);
        Ok(status)
    }

    /// One control tick: send `cmd`, then read back the status.
    ///
    /// A malformed status read is treated as stale and the previous status is
    /// returned instead. Transport errors are returned to the caller.
    pub async fn tick(
        &mut self,
        cmd: &GripperCommand,
    ) -> Result<Option<GripperStatus>, GripperError> {
        self.write_async(cmd).await?;
        match self.read_async().await {
            Ok(status) => {
                debug!(?status, "gripper status");
                self.check_fault(cmd, &status);
                Ok(Some(status))
            }
            Err(err @ GripperError::MalformedResponse { .. }) => {
                warn!(error = %err, "stale status read, keeping previous status");
                Ok(self.last_status)
            }
            Err(err) => Err(err),
        }
    }

    fn check_fault(&mut self, cmd: &GripperCommand, status: &GripperStatus) {
        let latched = cmd.activate && status.reset_required();
        if latched && !self.fault_reported {
            error!(
                fault = ?status.fault,
                "gripper fault latched, send a reset (activate = false) before further motion"
            );
        }
        self.fault_reported = latched;
    }

    /// Resend the latest command every period until the command channel
    /// closes or `shutdown` resolves.
    ///
    /// A new command is sent as soon as it arrives. Every decoded status is
    /// published on `status`. Transport errors are logged and retried on the
    /// next tick.
    pub async fn run<F>(
        &mut self,
        mut commands: watch::Receiver<GripperCommand>,
        status: watch::Sender<Option<GripperStatus>>,
        shutdown: F,
    ) where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        info!(period = ?self.period, "gripper driver started");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                changed = commands.changed() => {
                    if changed.is_err() {
                        debug!("command channel closed");
                        break;
                    }
                }
                _ = interval.tick() => {}
            }

            let cmd = *commands.borrow_and_update();
            match self.tick(&cmd).await {
                Ok(Some(latest)) => {
                    status.send_replace(Some(latest));
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, "gripper tick failed, retrying next tick"),
            }
        }

        self.link.disconnect().await;
        info!("gripper driver stopped");
    }

    /// Clear the activation bit, to reset fault.
    pub async fn reset(&mut self) -> Result<&mut Self, GripperError> {
        self.write_async(&GripperCommand::new()).await?;
        Ok(self)
    }

    /// Set the activation bit to start initialization of the gripper.
    pub async fn activate(&mut self) -> Result<&mut Self, GripperError> {
        self.write_async(&GripperCommand::new().activate(true)).await?;
        Ok(self)
    }

    /// Wait for the initialization process to finish.
    pub async fn await_activate(&mut self) -> Result<&mut Self, GripperError> {
        loop {
            if let Some(status) = self.poll().await? {
                if status.activation == ActivationStatus::Active {
                    break;
                }
                if let Some(fault) = status.fault.filter(|f| f.reset_required()) {
                    return Err(fault.into());
                }
            }
            tokio::time::sleep(POLL_PERIOD).await;
        }
        Ok(self)
    }

    /// Command the gripper to go to a position with the given velocity and
    /// force, all in device units.
    pub async fn go_to(
        &mut self,
        position: i32,
        velocity: i32,
        force: i32,
    ) -> Result<&mut Self, GripperError> {
        let cmd = GripperCommand::new()
            .activate(true)
            .position(position)
            .velocity(velocity)
            .force(force);
        self.write_async(&cmd).await?;
        Ok(self)
    }

    /// Wait for the fingers to stop, returning why they stopped.
    pub async fn await_go_to(&mut self) -> Result<MotionStatus, GripperError> {
        loop {
            if let Some(status) = self.poll().await? {
                if let Some(fault) = status.fault.filter(|f| f.reset_required()) {
                    return Err(fault.into());
                }
                if status.motion.stopped() {
                    return Ok(status.motion);
                }
            }
            tokio::time::sleep(POLL_PERIOD).await;
        }
    }

    async fn poll(&mut self) -> Result<Option<GripperStatus>, GripperError> {
        match self.read_async().await {
            Ok(status) => Ok(Some(status)),
            Err(GripperError::MalformedResponse { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
