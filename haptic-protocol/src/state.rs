//! Shared protocol flags
//!
//! [`ProtocolState`] is the only protocol state shared between the serial
//! receive context and the control loop. The receive side only sets flags
//! ([`ProtocolState::apply`]); the control loop tests them and clears what
//! it consumed. Every field is an atomic, so the struct can live in a
//! `static` and be shared by reference without a lock.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::message::{Message, MotorOverride, TeleopLayout};
use crate::packed::unpack_position;

/// Remote handle position delivered by a teleoperation partner (mm)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RemotePosition {
    pub x: f32,
    /// Always zero for the linear layout
    pub y: f32,
}

/// Request/acknowledge/teleoperation flags
#[derive(Debug)]
pub struct ProtocolState {
    acknowledged: AtomicBool,
    data_requested: AtomicBool,
    teleop_requested: AtomicU32,
    link_alive: AtomicBool,
    /// Both packed fields in one word so a reader never sees half an update
    remote_raw: AtomicU32,
    remote_valid: AtomicBool,
    opaque_bytes: AtomicU32,
}

impl Default for ProtocolState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolState {
    /// Power-on state
    ///
    /// The acknowledge flag starts set so the host's first request is
    /// answered without a preceding `'1'`.
    pub const fn new() -> Self {
        Self {
            acknowledged: AtomicBool::new(true),
            data_requested: AtomicBool::new(false),
            teleop_requested: AtomicU32::new(0),
            link_alive: AtomicBool::new(false),
            remote_raw: AtomicU32::new(0),
            remote_valid: AtomicBool::new(false),
            opaque_bytes: AtomicU32::new(0),
        }
    }

    /// Return to the power-on state
    pub fn reset(&self) {
        self.acknowledged.store(true, Ordering::Release);
        self.data_requested.store(false, Ordering::Release);
        self.teleop_requested.store(0, Ordering::Release);
        self.link_alive.store(false, Ordering::Release);
        self.remote_valid.store(false, Ordering::Release);
        self.remote_raw.store(0, Ordering::Release);
        self.opaque_bytes.store(0, Ordering::Release);
    }

    // ---- receive side ----

    /// Record the side effects of one decoded message
    ///
    /// Returns the motor command to execute immediately, if the message
    /// carries one.
    pub fn apply(&self, message: &Message) -> Option<MotorOverride> {
        self.link_alive.store(true, Ordering::Release);
        match *message {
            Message::Ack => self.acknowledged.store(true, Ordering::Release),
            Message::DataRequest => self.data_requested.store(true, Ordering::Release),
            Message::Ping => {}
            Message::Motor { .. } => return message.motor_override(),
            Message::TeleopPosition { raw } => {
                let word = ((raw[0] as u32) << 16) | raw[1] as u32;
                self.remote_raw.store(word, Ordering::Release);
                self.remote_valid.store(true, Ordering::Release);
                self.teleop_requested.fetch_add(1, Ordering::AcqRel);
            }
            Message::TeleopPing => {
                self.teleop_requested.fetch_add(1, Ordering::AcqRel);
            }
            Message::Opaque { len, .. } => {
                let len = u32::try_from(len).unwrap_or(u32::MAX);
                // Counter only, wrap is harmless
                self.opaque_bytes.fetch_add(len, Ordering::Relaxed);
            }
        }
        None
    }

    // ---- control loop side ----

    /// Whether a telemetry frame is owed to the host
    pub fn telemetry_due(&self) -> bool {
        self.acknowledged.load(Ordering::Acquire) && self.data_requested.load(Ordering::Acquire)
    }

    /// Clear the acknowledge/request pair after a frame has been sent
    pub fn complete_telemetry(&self) {
        self.acknowledged.store(false, Ordering::Release);
        self.data_requested.store(false, Ordering::Release);
    }

    /// Number of teleoperation requests since the last position was sent
    pub fn teleop_pending(&self) -> u32 {
        self.teleop_requested.load(Ordering::Acquire)
    }

    /// Clear the teleoperation counter after a position has been sent
    pub fn complete_teleop(&self) {
        self.teleop_requested.store(0, Ordering::Release);
    }

    /// Latest remote position, decoded for `layout`
    pub fn remote_position(&self, layout: TeleopLayout) -> Option<RemotePosition> {
        if !self.remote_valid.load(Ordering::Acquire) {
            return None;
        }
        let word = self.remote_raw.load(Ordering::Acquire);
        let offset = layout.offset();
        let x = unpack_position((word >> 16) as u16, offset);
        let y = match layout {
            TeleopLayout::Linear => 0.0,
            TeleopLayout::Planar => unpack_position(word as u16, offset),
        };
        Some(RemotePosition { x, y })
    }

    /// Whether any message has been decoded since power-on
    pub fn link_alive(&self) -> bool {
        self.link_alive.load(Ordering::Acquire)
    }

    /// Total bytes swallowed in opaque blobs
    pub fn opaque_bytes(&self) -> u32 {
        self.opaque_bytes.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageParser;

    fn receive(state: &ProtocolState, parser: &mut MessageParser, bytes: &[u8]) {
        parser.feed_bytes(bytes, |m| {
            state.apply(&m);
        });
    }

    /// Mirrors the control loop: send once if due, then clear
    fn poll(state: &ProtocolState) -> bool {
        if state.telemetry_due() {
            state.complete_telemetry();
            true
        } else {
            false
        }
    }

    #[test]
    fn test_initial_state() {
        let state = ProtocolState::new();
        assert!(!state.telemetry_due());
        assert!(!state.link_alive());
        assert_eq!(state.teleop_pending(), 0);
        assert_eq!(state.remote_position(TeleopLayout::Linear), None);
    }

    #[test]
    fn test_first_request_answered_without_ack() {
        let state = ProtocolState::new();
        let mut parser = MessageParser::new(TeleopLayout::Linear);
        receive(&state, &mut parser, b"3");
        assert!(poll(&state));
        assert!(!poll(&state));
    }

    #[test]
    fn test_request_then_ack_sends_once() {
        let state = ProtocolState::new();
        let mut parser = MessageParser::new(TeleopLayout::Linear);
        // Consume the power-on acknowledge
        receive(&state, &mut parser, b"3");
        assert!(poll(&state));

        receive(&state, &mut parser, b"31");
        assert!(poll(&state));
        assert!(!poll(&state));
    }

    #[test]
    fn test_ack_then_request_sends_once() {
        let state = ProtocolState::new();
        let mut parser = MessageParser::new(TeleopLayout::Linear);
        receive(&state, &mut parser, b"3");
        assert!(poll(&state));

        receive(&state, &mut parser, b"13");
        assert!(poll(&state));
        assert!(!poll(&state));
    }

    #[test]
    fn test_request_without_ack_waits() {
        let state = ProtocolState::new();
        let mut parser = MessageParser::new(TeleopLayout::Linear);
        receive(&state, &mut parser, b"3");
        assert!(poll(&state));

        receive(&state, &mut parser, b"3");
        assert!(!poll(&state));
        receive(&state, &mut parser, b"1");
        assert!(poll(&state));
    }

    #[test]
    fn test_teleop_position_sets_remote_and_counter() {
        let state = ProtocolState::new();
        let mut parser = MessageParser::new(TeleopLayout::Planar);
        // x = 20250 → 2.5 mm, y = 19900 → -1.0 mm
        receive(&state, &mut parser, &[b'p', 0x4F, 0x1A, 0x4D, 0xBC]);

        assert_eq!(state.teleop_pending(), 1);
        let remote = state.remote_position(TeleopLayout::Planar).unwrap();
        assert!((remote.x - 2.5).abs() < 1e-3);
        assert!((remote.y + 1.0).abs() < 1e-3);

        receive(&state, &mut parser, b"t");
        assert_eq!(state.teleop_pending(), 2);
        state.complete_teleop();
        assert_eq!(state.teleop_pending(), 0);
        // Remote target survives the clear
        assert!(state.remote_position(TeleopLayout::Planar).is_some());
    }

    #[test]
    fn test_motor_message_returns_override() {
        let state = ProtocolState::new();
        let cmd = state.apply(&Message::Motor {
            id: b'1',
            level: b'1',
        });
        assert_eq!(
            cmd,
            Some(MotorOverride {
                motor: 0,
                duty: 0.25
            })
        );
        assert!(state.link_alive());
    }

    #[test]
    fn test_any_message_marks_link_alive() {
        let state = ProtocolState::new();
        state.apply(&Message::Ping);
        assert!(state.link_alive());
        assert!(!state.telemetry_due());
    }

    #[test]
    fn test_opaque_bytes_accumulate() {
        let state = ProtocolState::new();
        state.apply(&Message::Opaque {
            leading: b'x',
            len: 5,
        });
        state.apply(&Message::Opaque {
            leading: b'y',
            len: 3,
        });
        assert_eq!(state.opaque_bytes(), 8);
    }

    #[test]
    fn test_reset_restores_power_on_state() {
        let state = ProtocolState::new();
        state.apply(&Message::TeleopPosition { raw: [9000, 0] });
        state.apply(&Message::DataRequest);
        state.complete_telemetry();
        state.reset();
        assert!(!state.link_alive());
        assert_eq!(state.remote_position(TeleopLayout::Linear), None);
        state.apply(&Message::DataRequest);
        assert!(state.telemetry_due());
    }

    #[test]
    fn test_burst_yields_every_override_in_order() {
        let state = ProtocolState::new();
        let mut parser = MessageParser::new(TeleopLayout::Linear);
        let mut commands: heapless::Vec<MotorOverride, 4> = heapless::Vec::new();
        parser.feed_bytes(b"m11m21m10", |m| {
            if let Some(command) = state.apply(&m) {
                commands.push(command).unwrap();
            }
        });
        let seen: heapless::Vec<(u8, f32), 4> = commands.iter().map(|c| (c.motor, c.duty)).collect();
        assert_eq!(seen.as_slice(), &[(0, 0.25), (1, 0.25), (0, 0.0)]);
    }
}
