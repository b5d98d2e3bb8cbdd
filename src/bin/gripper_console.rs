use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{oneshot, watch};
use tracing::info;

use cmodel_gripper::{
    ControllerConfig, DriverConfig, GripperDriver, GripperStatus, Key, ManualController, Scaling,
    Transport,
};

/// Drive a C-Model gripper from the terminal.
#[derive(Parser, Debug)]
#[command(name = "gripper-console", version, about)]
struct Cli {
    /// Gripper Modbus TCP address, e.g. 192.168.1.11:502
    #[arg(long, conflicts_with = "rtu")]
    tcp: Option<SocketAddr>,
    /// Serial port of an RS485 (Modbus RTU) gripper
    #[arg(long)]
    rtu: Option<String>,
    /// Serial baud rate
    #[arg(long, default_value_t = Transport::DEFAULT_BAUD_RATE)]
    baud: u32,
    /// Modbus slave id
    #[arg(long)]
    slave: Option<u8>,
    /// JSON driver configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Command resend rate in Hz
    #[arg(long)]
    rate_hz: Option<u32>,
    /// Hand UI values to the gripper unscaled, saturated to 0-255
    #[arg(long)]
    passthrough: bool,
}

impl Cli {
    fn driver_config(&self) -> Result<DriverConfig> {
        let mut config = match &self.config {
            Some(path) => DriverConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None if self.tcp.is_none() && self.rtu.is_none() => {
                bail!("either --tcp, --rtu or --config is required")
            }
            None => DriverConfig::default(),
        };
        if let Some(address) = self.tcp {
            config.transport = Transport::tcp(address);
        }
        if let Some(path) = &self.rtu {
            config.transport = Transport::Rtu {
                path: path.clone(),
                baud_rate: self.baud,
            };
        }
        if let Some(slave) = self.slave {
            config.slave_id = slave;
        }
        if let Some(rate) = self.rate_hz {
            config.rate_hz = rate;
        }
        Ok(config)
    }

    fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            scaling: if self.passthrough {
                Scaling::Passthrough
            } else {
                Scaling::Scaled
            },
            ..ControllerConfig::default()
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn status_line(status: Option<GripperStatus>) -> String {
    match status {
        Some(s) => format!(
            "Status: activation = {:?}, motion = {:?}, fault = {:?}, position = {}, force = {}\n",
            s.activation, s.motion, s.fault, s.position, s.force
        ),
        None => "Status: no status received yet\n".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.driver_config()?;
    let mut controller = ManualController::new(cli.controller_config());

    info!(transport = ?config.transport, rate_hz = config.rate_hz, "starting gripper console");

    let (command_tx, command_rx) = watch::channel(controller.command());
    let (status_tx, status_rx) = watch::channel(None);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let mut driver = GripperDriver::from_config(config);
    let driver_task = tokio::spawn(async move {
        driver
            .run(command_rx, status_tx, async {
                let _ = stop_rx.await;
            })
            .await;
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let prompt = format!("{}{}", status_line(*status_rx.borrow()), controller.prompt());
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match Key::parse(&line) {
            Key::Quit => break,
            key => {
                if controller.apply(key) {
                    command_tx.send_replace(controller.command());
                }
            }
        }
    }

    let _ = stop_tx.send(());
    driver_task.await.context("gripper driver task failed")?;
    Ok(())
}
