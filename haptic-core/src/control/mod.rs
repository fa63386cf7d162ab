//! Real-time control loop
//!
//! One [`ControlLoop::step`] is one haptic iteration:
//!
//! 1. Sample the clock
//! 2. Snapshot the encoder counts
//! 3. Solve the pose; a failed solve holds the previous pose and skips 4-6
//! 4. Render the active [`ForceModel`]
//! 5. Map forces to motor torques
//! 6. Command the motors
//! 7. Answer a pending telemetry request, then a pending teleoperation ping
//!
//! Nothing in a step waits on anything except the blocking UART write of an
//! owed frame. The caller logs from the returned [`IterationReport`].

pub mod pose;

pub use pose::{Pose, PoseSolver};

use nalgebra::Vector3;

use haptic_hal::{Clock, UartTx};
use haptic_protocol::telemetry::{
    encode_hand, encode_linear, encode_planar, encode_spatial, encode_teleop,
};
use haptic_protocol::{MotorOverride, ProtocolState, TelemetryBuffer, TelemetryError};

use crate::config::{DeviceConfig, Topology};
use crate::encoder::{EncoderBank, MAX_AXES};
use crate::environment::{EnvironmentInput, ForceCommand, ForceModel, MAX_TRACKED_POINTS};
use crate::jacobian::TorqueCommand;
use crate::kinematics::{HandleState, KinematicsError};

/// Longest time step handed to a model (s)
///
/// A stalled executor or a long UART write must not integrate a simulated
/// mass over the whole gap.
pub const MAX_RENDER_DT_S: f32 = 0.01;

/// Torque sink for the control loop
///
/// Implemented by the drivers crate on top of a duty-cycle
/// [`haptic_hal::MotorOutput`]. Motors are zero-based.
pub trait TorqueActuator {
    /// Error type for output operations
    type Error;

    /// Drive `motor` with `torque_nm` (N·m)
    fn apply_torque(&mut self, motor: u8, torque_nm: f32) -> Result<(), Self::Error>;

    /// Drive `motor` with a raw signed duty fraction, bypassing the torque gain
    fn set_duty(&mut self, motor: u8, duty: f32) -> Result<(), Self::Error>;

    /// Zero every motor
    fn stop_all(&mut self) -> Result<(), Self::Error>;
}

/// Something that went wrong during a step, other than the pose solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopFault {
    /// The actuator rejected a command
    Actuator,
    /// The UART rejected a frame
    Serial,
    /// A frame could not be encoded
    Telemetry(TelemetryError),
    /// The model produced a NaN or infinite force
    NonFiniteForce,
}

/// Outcome of one [`ControlLoop::step`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IterationReport {
    /// Clock value sampled at the start of the step (µs)
    pub timestamp_us: u64,
    /// Set when the pose solve or torque mapping failed
    pub kinematics: Option<KinematicsError>,
    /// Torques computed this step (zero when not actuated)
    pub torques: TorqueCommand,
    /// Model parameter reported in telemetry
    pub parameter: f32,
    /// Time step handed to the model (s), zero when nothing was rendered
    pub dt_s: f32,
    /// Whether motors were commanded from this step's torques
    pub actuated: bool,
    pub telemetry_sent: bool,
    pub teleop_sent: bool,
    pub fault: Option<LoopFault>,
}

impl IterationReport {
    fn new(timestamp_us: u64) -> Self {
        Self {
            timestamp_us,
            kinematics: None,
            torques: TorqueCommand::zero(),
            parameter: 0.0,
            dt_s: 0.0,
            actuated: false,
            telemetry_sent: false,
            teleop_sent: false,
            fault: None,
        }
    }

    fn record(&mut self, fault: LoopFault) {
        if self.fault.is_none() {
            self.fault = Some(fault);
        }
    }
}

/// The haptic control loop of one device
///
/// Borrows the shared encoder counts and protocol flags; owns everything
/// else it touches.
pub struct ControlLoop<'a, C, A, T> {
    clock: C,
    actuator: A,
    uart: T,
    encoders: &'a EncoderBank,
    protocol: &'a ProtocolState,
    solver: PoseSolver,
    model: ForceModel,
    handles: [HandleState; MAX_TRACKED_POINTS],
    pose: Pose,
    command: ForceCommand,
    last_render_us: Option<u64>,
    /// Duty held by a host override; such motors ignore computed torque
    overrides: [Option<f32>; MAX_AXES],
}

impl<'a, C, A, T> ControlLoop<'a, C, A, T>
where
    C: Clock,
    A: TorqueActuator,
    T: UartTx,
{
    pub fn new(
        config: &DeviceConfig,
        clock: C,
        actuator: A,
        uart: T,
        encoders: &'a EncoderBank,
        protocol: &'a ProtocolState,
    ) -> Self {
        Self {
            clock,
            actuator,
            uart,
            encoders,
            protocol,
            solver: PoseSolver::new(config),
            model: config.environment.clone(),
            handles: [HandleState::new(); MAX_TRACKED_POINTS],
            pose: Pose::default(),
            command: ForceCommand::free(Vector3::zeros()),
            last_render_us: None,
            overrides: [None; MAX_AXES],
        }
    }

    pub fn topology(&self) -> Topology {
        self.solver.topology()
    }

    /// Last successfully solved pose
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn model(&self) -> &ForceModel {
        &self.model
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn uart(&self) -> &T {
        &self.uart
    }

    /// Whether `motor` is held by a host override
    pub fn is_overridden(&self, motor: usize) -> bool {
        self.overrides.get(motor).is_some_and(Option::is_some)
    }

    /// Execute a host motor override immediately
    ///
    /// A nonzero duty latches the motor out of torque control; a zero duty
    /// stops it and hands it back.
    pub fn apply_override(&mut self, command: MotorOverride) -> Result<(), LoopFault> {
        let Some(slot) = self.overrides.get_mut(command.motor as usize) else {
            return Ok(());
        };
        *slot = (command.duty != 0.0).then_some(command.duty);
        self.actuator
            .set_duty(command.motor, command.duty)
            .map_err(|_| LoopFault::Actuator)
    }

    /// Zero every motor and drop all overrides
    pub fn stop(&mut self) -> Result<(), LoopFault> {
        self.overrides = [None; MAX_AXES];
        self.actuator.stop_all().map_err(|_| LoopFault::Actuator)
    }

    /// Run one iteration
    pub fn step(&mut self) -> IterationReport {
        let now_us = self.clock.now_us();
        let mut report = IterationReport::new(now_us);
        let ticks = self.encoders.snapshot();

        match self.solver.solve(&ticks) {
            Ok(pose) => {
                for (handle, point) in self.handles.iter_mut().zip(&pose.points[..pose.count]) {
                    handle.update(*point, now_us);
                }
                self.pose = pose;
                self.render(now_us, &mut report);
            }
            Err(error) => {
                // Time spent without a pose must not reach the model as one long step
                self.last_render_us = Some(now_us);
                report.kinematics = Some(error);
            }
        }

        report.parameter = self.command.parameter;
        self.serve_host(&mut report);
        report
    }

    fn render(&mut self, now_us: u64, report: &mut IterationReport) {
        let dt = self
            .last_render_us
            .map_or(0.0, |last| now_us.saturating_sub(last) as f32 * 1e-6)
            .min(MAX_RENDER_DT_S);
        self.last_render_us = Some(now_us);
        report.dt_s = dt;

        let local = self.pose.primary();
        let layout = self.topology().teleop_layout();
        // Axes the partner does not send follow the local handle
        let remote = self.protocol.remote_position(layout).map(|remote| {
            let y = if layout.field_count() > 1 { remote.y } else { local.y };
            Vector3::new(remote.x, y, local.z)
        });
        let input = EnvironmentInput::new(&self.handles[..self.pose.count], dt).with_remote(remote);
        self.command = self.model.render(&input);

        if !self.command.is_finite() {
            report.record(LoopFault::NonFiniteForce);
            return;
        }
        let torques = match self.solver.torques(&self.pose, &self.command) {
            Ok(torques) => torques,
            Err(error) => {
                report.kinematics = Some(error);
                return;
            }
        };
        if !torques.is_finite() {
            report.record(LoopFault::NonFiniteForce);
            return;
        }

        report.torques = torques;
        match self.actuate(&torques) {
            Ok(()) => report.actuated = true,
            Err(fault) => report.record(fault),
        }
    }

    fn actuate(&mut self, torques: &TorqueCommand) -> Result<(), LoopFault> {
        for motor in 0..self.topology().motor_count() {
            if self.overrides[motor].is_some() {
                continue;
            }
            self.actuator
                .apply_torque(motor as u8, torques.get(motor))
                .map_err(|_| LoopFault::Actuator)?;
        }
        Ok(())
    }

    fn serve_host(&mut self, report: &mut IterationReport) {
        if self.protocol.telemetry_due() {
            match self.send_telemetry() {
                Ok(()) => {
                    self.protocol.complete_telemetry();
                    report.telemetry_sent = true;
                }
                Err(fault) => report.record(fault),
            }
        }

        if self.protocol.teleop_pending() > 0 {
            let position = self.pose.primary();
            let frame = encode_teleop(self.topology().teleop_layout(), [position.x, position.y]);
            match self.write_frame(frame) {
                Ok(()) => {
                    self.protocol.complete_teleop();
                    report.teleop_sent = true;
                }
                Err(fault) => report.record(fault),
            }
        }
    }

    fn send_telemetry(&mut self) -> Result<(), LoopFault> {
        let p = self.pose.primary();
        let proxy = self.command.proxy;
        let parameter = self.command.parameter;
        let frame = match self.topology() {
            Topology::Linear => encode_linear(p.x, parameter),
            Topology::Planar => encode_planar([p.x, p.y], [proxy.x, proxy.y], parameter),
            Topology::Delta => encode_spatial([p.x, p.y, p.z]),
            Topology::Hand => encode_hand([p.x, p.y, p.z]),
        };
        self.write_frame(frame)
    }

    fn write_frame(&mut self, frame: Result<TelemetryBuffer, TelemetryError>) -> Result<(), LoopFault> {
        let frame = frame.map_err(LoopFault::Telemetry)?;
        self.uart
            .write_blocking(&frame)
            .map_err(|_| LoopFault::Serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use std::vec::Vec;

    use haptic_protocol::{Message, TeleopLayout};

    use crate::environment::{MassSpringDamper, Spring, Teleoperation};
    use crate::jacobian::linear_torque;
    use crate::kinematics::{joint_angle, RotaryGeometry};

    /// Advances by `step_us` on every read
    struct StepClock {
        now: Cell<u64>,
        step_us: u64,
    }

    impl StepClock {
        fn new(step_us: u64) -> Self {
            Self {
                now: Cell::new(0),
                step_us,
            }
        }
    }

    impl Clock for StepClock {
        fn now_us(&self) -> u64 {
            let now = self.now.get();
            self.now.set(now + self.step_us);
            now
        }
    }

    #[derive(Default)]
    struct MockActuator {
        torques: [f32; MAX_AXES],
        duties: [Option<f32>; MAX_AXES],
        torque_calls: usize,
        fail: bool,
    }

    impl TorqueActuator for MockActuator {
        type Error = ();

        fn apply_torque(&mut self, motor: u8, torque_nm: f32) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.torque_calls += 1;
            self.torques[motor as usize] = torque_nm;
            Ok(())
        }

        fn set_duty(&mut self, motor: u8, duty: f32) -> Result<(), ()> {
            self.duties[motor as usize] = Some(duty);
            Ok(())
        }

        fn stop_all(&mut self) -> Result<(), ()> {
            self.torques = [0.0; MAX_AXES];
            self.duties = [Some(0.0); MAX_AXES];
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockUart {
        written: Vec<Vec<u8>>,
        fail: bool,
    }

    impl UartTx for MockUart {
        type Error = ();

        fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.written.push(data.to_vec());
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    const CW_SEQUENCE: [(bool, bool); 4] = [(false, false), (true, false), (true, true), (false, true)];

    /// Feed `steps` clockwise transitions to a fresh axis
    fn turn(bank: &EncoderBank, axis: usize, steps: usize) {
        for k in 1..=steps {
            let (a, b) = CW_SEQUENCE[k % 4];
            bank.on_edge(axis, a, b);
        }
    }

    fn spring_config() -> DeviceConfig {
        let mut config = DeviceConfig::default();
        config.environment = ForceModel::Spring(Spring {
            stiffness: 500.0,
            rest: [0.0; 3],
        });
        config
    }

    type TestLoop<'a> = ControlLoop<'a, StepClock, MockActuator, MockUart>;

    fn control<'a>(config: &DeviceConfig, encoders: &'a EncoderBank, protocol: &'a ProtocolState) -> TestLoop<'a> {
        ControlLoop::new(
            config,
            StepClock::new(1_000),
            MockActuator::default(),
            MockUart::default(),
            encoders,
            protocol,
        )
    }

    #[test]
    fn test_linear_spring_drives_motor() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        turn(&encoders, 0, 12);
        let mut control = control(&spring_config(), &encoders, &protocol);

        let report = control.step();
        assert!(report.actuated);
        assert_eq!(report.kinematics, None);
        assert_eq!(report.fault, None);

        let geometry = RotaryGeometry::default();
        let x = geometry.linear_position(joint_angle(12, 48));
        let expected = linear_torque(&geometry, -x * 500.0 * 0.001);
        assert!((control.actuator().torques[0] - expected).abs() < 1e-6);
        assert_eq!(control.actuator().torque_calls, 1);
    }

    #[test]
    fn test_telemetry_sent_once_per_request() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&spring_config(), &encoders, &protocol);

        assert!(!control.step().telemetry_sent);

        protocol.apply(&Message::DataRequest);
        assert!(control.step().telemetry_sent);
        assert!(!control.step().telemetry_sent);
        assert_eq!(control.uart().written.len(), 1);
        assert_eq!(control.uart().written[0].as_slice(), b"0.000000\t0.000000\t l");

        // Request without acknowledge stays pending
        protocol.apply(&Message::DataRequest);
        assert!(!control.step().telemetry_sent);
        protocol.apply(&Message::Ack);
        assert!(control.step().telemetry_sent);
        assert_eq!(control.uart().written.len(), 2);
    }

    #[test]
    fn test_failed_solve_holds_pose_and_skips_actuation() {
        let mut config = spring_config();
        config.device.topology = Topology::Delta;
        config.delta.re = 5.0;
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&config, &encoders, &protocol);

        protocol.apply(&Message::DataRequest);
        let report = control.step();
        assert_eq!(report.kinematics, Some(KinematicsError::NoIntersection));
        assert!(!report.actuated);
        assert_eq!(control.actuator().torque_calls, 0);
        // Telemetry still answers with the held pose
        assert!(report.telemetry_sent);
        assert_eq!(control.pose().count, 0);
    }

    #[test]
    fn test_delta_home_telemetry() {
        let mut config = DeviceConfig::default();
        config.device.topology = Topology::Delta;
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&config, &encoders, &protocol);

        protocol.apply(&Message::DataRequest);
        let report = control.step();
        assert!(report.actuated);
        assert_eq!(control.actuator().torque_calls, 3);
        let frame = core::str::from_utf8(&control.uart().written[0]).unwrap();
        let body = frame.strip_suffix(" l").unwrap();
        let fields: Vec<f32> = body
            .split('\t')
            .filter(|f| !f.is_empty())
            .map(|f| f.parse().unwrap())
            .collect();
        assert_eq!(fields.len(), 3);
        assert!(fields[0].abs() < 1e-3);
        assert!(fields[1].abs() < 1e-3);
        assert!((fields[2] + 47.06).abs() < 0.01);
    }

    #[test]
    fn test_override_latches_motor() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        turn(&encoders, 0, 12);
        let mut control = control(&spring_config(), &encoders, &protocol);

        control
            .apply_override(MotorOverride { motor: 0, duty: 0.25 })
            .unwrap();
        assert_eq!(control.actuator().duties[0], Some(0.25));
        assert!(control.is_overridden(0));

        control.step();
        assert_eq!(control.actuator().torque_calls, 0);

        control
            .apply_override(MotorOverride { motor: 0, duty: 0.0 })
            .unwrap();
        assert!(!control.is_overridden(0));
        control.step();
        assert_eq!(control.actuator().torque_calls, 1);
        assert!(control.actuator().torques[0] != 0.0);
    }

    #[test]
    fn test_override_beyond_axes_is_ignored() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&spring_config(), &encoders, &protocol);
        assert_eq!(
            control.apply_override(MotorOverride { motor: 9, duty: 0.25 }),
            Ok(())
        );
        assert_eq!(control.actuator().duties, [None; MAX_AXES]);
    }

    #[test]
    fn test_teleoperation_round_trip() {
        let mut config = DeviceConfig::default();
        config.environment = ForceModel::Teleoperation(Teleoperation::default());
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&config, &encoders, &protocol);

        // Partner at x = 10 mm
        let raw = haptic_protocol::pack_position(10.0, TeleopLayout::Linear.offset());
        protocol.apply(&Message::TeleopPosition { raw: [raw, 0] });
        let report = control.step();
        assert!(report.teleop_sent);
        assert!(report.torques.get(0) != 0.0);
        assert_eq!(protocol.teleop_pending(), 0);
        // Local position 0 mm packs to (0 + 90)·100 = 9000
        assert_eq!(control.uart().written[0].as_slice(), &[b'p', 0x23, 0x28, b'l']);
        assert!(!control.step().teleop_sent);
    }

    fn delta_teleop_config() -> DeviceConfig {
        let mut config = DeviceConfig::default();
        config.device.topology = Topology::Delta;
        config.environment = ForceModel::Teleoperation(Teleoperation {
            stiffness: 200.0,
            damping: 0.0,
        });
        config
    }

    fn send_planar_partner(protocol: &ProtocolState, x: f32, y: f32) {
        let offset = TeleopLayout::Planar.offset();
        protocol.apply(&Message::TeleopPosition {
            raw: [
                haptic_protocol::pack_position(x, offset),
                haptic_protocol::pack_position(y, offset),
            ],
        });
    }

    #[test]
    fn test_delta_teleop_matching_partner_is_free() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&delta_teleop_config(), &encoders, &protocol);

        // Thumb hangs at z = -47 mm; the partner only sends x and y
        send_planar_partner(&protocol, 0.0, 0.0);
        let report = control.step();
        assert!(report.actuated);
        assert_eq!(control.command.primary_force().z, 0.0);
        assert!(control.command.primary_force().norm() < 1e-4);
        for motor in 0..3 {
            assert!(report.torques.get(motor).abs() < 1e-5);
        }
    }

    #[test]
    fn test_delta_teleop_pulls_in_plane_only() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&delta_teleop_config(), &encoders, &protocol);

        send_planar_partner(&protocol, 10.0, 0.0);
        control.step();
        let force = control.command.primary_force();
        // 10 mm at 200 N/m
        assert!((force.x - 2.0).abs() < 1e-3);
        assert_eq!(force.z, 0.0);
        assert!((control.command.proxy.z - control.pose().primary().z).abs() < 1e-6);
    }

    #[test]
    fn test_failed_solve_does_not_stretch_next_step() {
        let mut broken = DeviceConfig::default();
        broken.device.topology = Topology::Delta;
        broken.delta.re = 5.0;
        broken.environment = ForceModel::MassSpringDamper(MassSpringDamper::default());
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&broken, &encoders, &protocol);

        for _ in 0..50 {
            assert!(control.step().kinematics.is_some());
        }

        let mut healthy = broken.clone();
        healthy.delta = DeviceConfig::default().delta;
        control.solver = PoseSolver::new(&healthy);

        let report = control.step();
        assert_eq!(report.kinematics, None);
        assert!((report.dt_s - 0.001).abs() < 1e-9);
        let ForceModel::MassSpringDamper(model) = control.model() else {
            panic!("model changed");
        };
        assert!(model.state().velocity.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_render_step_is_capped() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = ControlLoop::new(
            &spring_config(),
            StepClock::new(2_000_000),
            MockActuator::default(),
            MockUart::default(),
            &encoders,
            &protocol,
        );
        assert_eq!(control.step().dt_s, 0.0);
        assert_eq!(control.step().dt_s, MAX_RENDER_DT_S);
    }

    #[test]
    fn test_override_burst_applied_in_order() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        turn(&encoders, 0, 12);
        let mut control = control(&spring_config(), &encoders, &protocol);

        // "m11m10" in one read: on, then off again
        let mut parser = haptic_protocol::MessageParser::new(TeleopLayout::Linear);
        let mut commands = Vec::new();
        parser.feed_bytes(b"m11m10", |message| {
            if let Some(command) = protocol.apply(&message) {
                commands.push(command);
            }
        });
        assert_eq!(commands.len(), 2);
        for command in commands {
            control.apply_override(command).unwrap();
        }

        assert!(!control.is_overridden(0));
        assert_eq!(control.actuator().duties[0], Some(0.0));
        control.step();
        assert_eq!(control.actuator().torque_calls, 1);
    }

    #[test]
    fn test_serial_failure_keeps_request_pending() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&spring_config(), &encoders, &protocol);
        control.uart.fail = true;

        protocol.apply(&Message::DataRequest);
        let report = control.step();
        assert_eq!(report.fault, Some(LoopFault::Serial));
        assert!(!report.telemetry_sent);
        assert!(protocol.telemetry_due());

        control.uart.fail = false;
        assert!(control.step().telemetry_sent);
    }

    #[test]
    fn test_actuator_failure_is_reported() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&spring_config(), &encoders, &protocol);
        control.actuator.fail = true;
        let report = control.step();
        assert_eq!(report.fault, Some(LoopFault::Actuator));
        assert!(!report.actuated);
    }

    #[test]
    fn test_non_finite_force_is_not_actuated() {
        let mut config = DeviceConfig::default();
        config.environment = ForceModel::Spring(Spring {
            stiffness: f32::INFINITY,
            rest: [1.0, 0.0, 0.0],
        });
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&config, &encoders, &protocol);
        let report = control.step();
        assert_eq!(report.fault, Some(LoopFault::NonFiniteForce));
        assert_eq!(control.actuator().torque_calls, 0);
    }

    #[test]
    fn test_stop_clears_overrides() {
        let encoders = EncoderBank::new();
        let protocol = ProtocolState::new();
        let mut control = control(&spring_config(), &encoders, &protocol);
        control
            .apply_override(MotorOverride { motor: 2, duty: 0.25 })
            .unwrap();
        control.stop().unwrap();
        assert!(!control.is_overridden(2));
        assert_eq!(control.actuator().duties[2], Some(0.0));
    }
}
