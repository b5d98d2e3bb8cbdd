//! Driver behaviour against an in-memory register link.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cmodel_gripper::{
    encode, ActivationStatus, GripperCommand, GripperDriver, GripperError, GripperFault,
    MotionStatus, RegisterLink,
};
use tokio::sync::{watch, Notify};

enum Reply {
    Status(Vec<u16>),
    Broken,
}

#[derive(Default)]
struct Shared {
    writes: Vec<Vec<u16>>,
    replies: VecDeque<Reply>,
    fallback: Vec<u16>,
    fail_writes: usize,
    disconnected: bool,
}

/// Records every command block and answers reads from a script.
#[derive(Clone)]
struct MockLink {
    shared: Arc<Mutex<Shared>>,
    notify_after: Option<(usize, Arc<Notify>)>,
}

impl MockLink {
    fn new(fallback: Vec<u16>) -> Self {
        let shared = Shared {
            fallback,
            ..Shared::default()
        };
        Self {
            shared: Arc::new(Mutex::new(shared)),
            notify_after: None,
        }
    }

    fn notify_after(mut self, writes: usize, notify: Arc<Notify>) -> Self {
        self.notify_after = Some((writes, notify));
        self
    }

    fn push(&self, reply: Reply) {
        self.shared.lock().unwrap().replies.push_back(reply);
    }

    fn writes(&self) -> Vec<Vec<u16>> {
        self.shared.lock().unwrap().writes.clone()
    }
}

impl RegisterLink for MockLink {
    async fn write_command(&mut self, registers: &[u16]) -> Result<(), GripperError> {
        let count = {
            let mut shared = self.shared.lock().unwrap();
            if shared.fail_writes > 0 {
                shared.fail_writes -= 1;
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "link dropped").into());
            }
            shared.writes.push(registers.to_vec());
            shared.writes.len()
        };
        if let Some((target, notify)) = &self.notify_after {
            if count == *target {
                notify.notify_one();
            }
        }
        Ok(())
    }

    async fn read_status(&mut self, count: u16) -> Result<Vec<u16>, GripperError> {
        let mut shared = self.shared.lock().unwrap();
        match shared.replies.pop_front() {
            Some(Reply::Status(regs)) => Ok(regs),
            Some(Reply::Broken) => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "read failed").into())
            }
            None => Ok(shared.fallback.iter().copied().take(count.into()).collect()),
        }
    }

    async fn disconnect(&mut self) {
        self.shared.lock().unwrap().disconnected = true;
    }
}

const ACTIVE_AT_REQUESTED: [u16; 4] = [0xF100, 0x8080, 0x4000, 0x2000];
const ACTIVE_MOVING: [u16; 4] = [0x3100, 0x4080, 0x4000, 0x1000];

fn driver(link: MockLink) -> GripperDriver<MockLink> {
    GripperDriver::new(link, Duration::from_millis(5))
}

#[tokio::test]
async fn tick_writes_encoded_command_and_decodes_status() {
    let link = MockLink::new(ACTIVE_AT_REQUESTED.to_vec());
    let mut driver = driver(link.clone());
    let cmd = GripperCommand::new().activate(true).position(0x80).velocity(0x40).force(0x20);

    let status = driver.tick(&cmd).await.unwrap().unwrap();

    assert_eq!(link.writes(), vec![encode(&cmd).to_vec()]);
    assert_eq!(status.activation, ActivationStatus::Active);
    assert_eq!(status.motion, MotionStatus::AtRequested);
    assert_eq!(status.position, 0x80);
    assert_eq!(driver.last_status(), Some(status));
}

#[tokio::test]
async fn short_read_keeps_previous_status() {
    let link = MockLink::new(ACTIVE_AT_REQUESTED.to_vec());
    let mut driver = driver(link.clone());
    let cmd = GripperCommand::new().activate(true);

    let first = driver.tick(&cmd).await.unwrap();
    link.push(Reply::Status(vec![0x0000, 0x0000]));
    let second = driver.tick(&cmd).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(driver.last_status(), first);
}

#[tokio::test]
async fn short_read_before_any_status_yields_none() {
    let link = MockLink::new(vec![0x0000]);
    let mut driver = driver(link);
    assert_eq!(driver.tick(&GripperCommand::new()).await.unwrap(), None);
    assert!(matches!(
        driver.read_async().await,
        Err(GripperError::MalformedResponse { expected: 4, actual: 1 })
    ));
}

#[tokio::test]
async fn transport_errors_surface_from_tick() {
    let link = MockLink::new(ACTIVE_AT_REQUESTED.to_vec());
    link.push(Reply::Broken);
    let mut driver = driver(link);
    let err = driver.tick(&GripperCommand::new()).await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn run_resends_latest_command_every_tick() {
    let done = Arc::new(Notify::new());
    let link = MockLink::new(ACTIVE_AT_REQUESTED.to_vec()).notify_after(5, done.clone());
    let mut driver = driver(link.clone());
    let cmd = GripperCommand::new().activate(true).position(200);

    let (_command_tx, command_rx) = watch::channel(cmd);
    let (status_tx, status_rx) = watch::channel(None);
    driver.run(command_rx, status_tx, done.notified()).await;

    let writes = link.writes();
    assert!(writes.len() >= 5);
    assert!(writes.iter().all(|w| *w == encode(&cmd).to_vec()));
    assert_eq!(status_rx.borrow().map(|s| s.position), Some(0x80));
    assert!(link.shared.lock().unwrap().disconnected);
}

#[tokio::test]
async fn run_survives_a_dropped_link() {
    let done = Arc::new(Notify::new());
    let link = MockLink::new(ACTIVE_AT_REQUESTED.to_vec()).notify_after(3, done.clone());
    link.shared.lock().unwrap().fail_writes = 2;
    let mut driver = driver(link.clone());

    let (_command_tx, command_rx) = watch::channel(GripperCommand::new().activate(true));
    let (status_tx, status_rx) = watch::channel(None);
    driver.run(command_rx, status_tx, done.notified()).await;

    assert_eq!(link.writes().len(), 3);
    assert!(status_rx.borrow().is_some());
}

#[tokio::test]
async fn run_picks_up_new_commands_and_stops_when_sender_drops() {
    let link = MockLink::new(ACTIVE_AT_REQUESTED.to_vec());
    let mut driver = driver(link.clone());
    let first = GripperCommand::new().activate(true).position(10);
    let second = GripperCommand::new().activate(true).position(250);

    let (command_tx, command_rx) = watch::channel(first);
    let (status_tx, _status_rx) = watch::channel(None);
    let feeder = async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        command_tx.send_replace(second);
        tokio::time::sleep(Duration::from_millis(20)).await;
    };
    tokio::join!(driver.run(command_rx, status_tx, std::future::pending()), feeder);

    let writes = link.writes();
    assert_eq!(writes.first(), Some(&encode(&first).to_vec()));
    assert_eq!(writes.last(), Some(&encode(&second).to_vec()));
    assert!(link.shared.lock().unwrap().disconnected);
}

#[tokio::test]
async fn await_activate_polls_until_active() {
    let link = MockLink::new(ACTIVE_AT_REQUESTED.to_vec());
    link.push(Reply::Status(vec![0x0100, 0, 0, 0]));
    link.push(Reply::Status(vec![0x1100, 0, 0, 0]));
    let mut driver = driver(link.clone());

    driver.reset().await.unwrap().activate().await.unwrap().await_activate().await.unwrap();

    assert_eq!(
        link.writes(),
        vec![
            encode(&GripperCommand::new()).to_vec(),
            encode(&GripperCommand::new().activate(true)).to_vec(),
        ]
    );
    assert_eq!(driver.last_status().map(|s| s.activation), Some(ActivationStatus::Active));
}

#[tokio::test]
async fn await_activate_reports_major_fault() {
    let link = MockLink::new(vec![0x010D, 0, 0, 0]);
    let mut driver = driver(link);
    match driver.await_activate().await {
        Err(GripperError::GripperFault(fault)) => assert_eq!(fault, GripperFault::ActivationFault),
        other => panic!("expected activation fault, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn await_go_to_returns_stop_reason() {
    let link = MockLink::new([0xB100, 0xC0C0, 0, 0].to_vec());
    link.push(Reply::Status(ACTIVE_MOVING.to_vec()));
    link.push(Reply::Status(vec![0x3100]));
    let mut driver = driver(link.clone());

    let motion = driver.go_to(0xFF, 300, -1).await.unwrap().await_go_to().await.unwrap();

    assert_eq!(motion, MotionStatus::ContactClosing);
    assert_eq!(link.writes(), vec![vec![0x0100, 0xFF00, 0xFF00, 0x0000]]);
}

#[tokio::test]
async fn unlisted_minor_fault_does_not_block_activation() {
    let link = MockLink::new(vec![0xF103, 0x8080, 0, 0]);
    let mut driver = driver(link);
    driver.await_activate().await.unwrap();
    let status = driver.last_status().unwrap();
    assert_eq!(status.fault, Some(GripperFault::Unknown));
    assert_eq!(status.motion, MotionStatus::AtRequested);
}

#[tokio::test]
async fn run_with_zero_period_still_ticks() {
    let done = Arc::new(Notify::new());
    let link = MockLink::new(ACTIVE_AT_REQUESTED.to_vec()).notify_after(3, done.clone());
    let mut driver = GripperDriver::new(link.clone(), Duration::ZERO);

    let (_command_tx, command_rx) = watch::channel(GripperCommand::new().activate(true));
    let (status_tx, _status_rx) = watch::channel(None);
    driver.run(command_rx, status_tx, done.notified()).await;

    assert!(link.writes().len() >= 3);
}
