//! Haptic control task
//!
//! Runs the control loop as fast as the executor allows, yielding after
//! every iteration so the encoder and serial tasks stay responsive.
//! Failures are logged on change only; at several kHz anything else
//! would flood the RTT buffer.

use defmt::*;
use embassy_futures::yield_now;

use haptic_core::control::{ControlLoop, LoopFault};
use haptic_core::kinematics::KinematicsError;
use haptic_drivers::motor::TorqueMotorBank;
use haptic_hal_rp2040::{EmbassyClock, HostTx, PwmMotorBank};

use crate::channels::{CONTACT, MOTOR_OVERRIDE};
use crate::config::BOARD_MOTORS;

/// The control loop as wired on this board
pub type BoardLoop = ControlLoop<
    'static,
    EmbassyClock,
    TorqueMotorBank<PwmMotorBank<'static, BOARD_MOTORS>>,
    HostTx,
>;

/// Smallest torque treated as touching the virtual object (N·m)
const CONTACT_TORQUE_NM: f32 = 1e-4;

/// Interval between loop rate reports (µs)
const RATE_WINDOW_US: u64 = 1_000_000;

#[embassy_executor::task]
pub async fn control_task(mut control: BoardLoop) {
    info!(
        "Control task started: {} topology, {} model",
        control.topology().name(),
        control.model().name()
    );

    let mut kinematics: Option<KinematicsError> = None;
    let mut fault: Option<LoopFault> = None;
    let mut in_contact = false;
    let mut window_start_us: u64 = 0;
    let mut iterations: u32 = 0;

    loop {
        while let Ok(command) = MOTOR_OVERRIDE.try_receive() {
            match control.apply_override(command) {
                Ok(()) => info!("Motor {} override: duty {}", command.motor + 1, command.duty),
                Err(e) => warn!("Motor {} override failed: {:?}", command.motor + 1, e),
            }
        }

        let report = control.step();

        if report.kinematics != kinematics {
            match report.kinematics {
                Some(e) => warn!("Pose solve failed: {:?}, holding last pose", e),
                None => info!("Pose solve recovered"),
            }
            kinematics = report.kinematics;
        }

        if report.fault != fault {
            if let Some(e) = report.fault {
                warn!("Control fault: {:?}", e);
            }
            fault = report.fault;
        }

        let touching = report.actuated
            && report
                .torques
                .as_slice()
                .iter()
                .any(|t| t.abs() > CONTACT_TORQUE_NM);
        if touching != in_contact {
            in_contact = touching;
            CONTACT.signal(touching);
        }

        iterations = iterations.wrapping_add(1);
        let elapsed = report.timestamp_us.saturating_sub(window_start_us);
        if elapsed >= RATE_WINDOW_US {
            trace!("Control loop: {} iterations in {} us", iterations, elapsed);
            iterations = 0;
            window_start_us = report.timestamp_us;
        }

        yield_now().await;
    }
}
