use cmodel_gripper::*;

#[tokio::main]
async fn main() -> Result<(), GripperError> {
    // The gripper's Modbus TCP address
    let address = "192.168.1.11:502".parse().expect("valid socket address");

    // nothing is opened until the first request
    let mut gripper = GripperDriver::tcp(address);

    // Reset and Activation of Gripper
    //
    // reset gripper, recommended
    gripper.reset().await?;
    // activate the gripper, it will try to open and close.
    gripper.activate().await?.await_activate().await?;
    println!("finished activation.");
    tokio::time::sleep(std::time::Duration::from_millis(1000)).await;

    // Basic Gripper Command
    //
    // position, velocity and force in device units; out of range values saturate
    gripper.go_to(0x08, 0x00, 0x00).await?;
    let motion = gripper.await_go_to().await?;
    println!("Motion Status : {:?}", motion);

    // Chained command
    let motion = gripper.go_to(0xFF, 0xFF, 0xFF).await?.await_go_to().await?;
    println!("Object detected : {}", motion.detected_obj());

    // Gripper Command
    //
    // a null command, all zero, will deactivate and reset the gripper
    let cmd_null = GripperCommand::new();
    // the open preset of the manual controller, written through the driver
    let cmd_open = GripperCommand::new()
        .activate(true)
        .measure(true)
        .measure_input(1)
        .position(4095)
        .velocity(400)
        .force(200);
    println!("open preset registers : {:04X?}", encode(&cmd_open));

    gripper.write_async(&cmd_open).await?;
    while gripper.read_async().await?.motion == MotionStatus::Moving {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    // Periodic driver
    //
    // resend the latest command at 20 Hz for two seconds, then reset
    let (command_tx, command_rx) = tokio::sync::watch::channel(cmd_open);
    let (status_tx, mut status_rx) = tokio::sync::watch::channel(None);
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        gripper
            .run(command_rx, status_tx, async {
                let _ = stop_rx.await;
            })
            .await;
    });

    if status_rx.changed().await.is_ok() {
        println!("latest status : {:?}", *status_rx.borrow());
    }
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    command_tx.send_replace(cmd_null);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let _ = stop_tx.send(());
    let _ = task.await;
    Ok(())
}
