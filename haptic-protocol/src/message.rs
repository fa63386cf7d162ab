//! Inbound message decoding
//!
//! The leading byte of every message selects a fixed payload length:
//!
//! - `'1'` acknowledge, `'2'` ping, `'3'` data request, `'t'` teleop ping: no payload
//! - `'m'` motor override: motor id digit, level digit
//! - `'p'` teleoperation position: one or two big-endian u16 fields
//!
//! Anything else is swallowed as an opaque blob up to the terminator `'l'`.
//! The blob is counted but never interpreted, so a corrupted byte costs at
//! most one message instead of stream synchronization.

use heapless::Vec;

// Message type IDs: Host → Device
pub const MSG_ACK: u8 = b'1';
pub const MSG_PING: u8 = b'2';
pub const MSG_DATA_REQUEST: u8 = b'3';
pub const MSG_MOTOR: u8 = b'm';
pub const MSG_TELEOP_POSITION: u8 = b'p';
pub const MSG_TELEOP_PING: u8 = b't';

/// End-of-message marker for opaque blobs and outbound telemetry
pub const TERMINATOR: u8 = b'l';

/// Bytes of the last message kept for inspection (leading byte included)
pub const MAX_BLOB_LEN: usize = 32;

/// Payload length of a motor override
const MOTOR_PAYLOAD_LEN: usize = 2;

/// Duty applied when a motor override asks for level `'1'`
pub const OVERRIDE_ON_DUTY: f32 = 0.25;

/// Shape of the teleoperation position payload
///
/// A 1-DOF device exchanges a single coordinate, a 2-DOF device two.
/// The offset shifts the physical range (mm) into positive values before
/// packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TeleopLayout {
    /// One field, offset 90 mm
    #[default]
    Linear,
    /// Two fields (x, y), offset 200 mm
    Planar,
}

impl TeleopLayout {
    /// Number of u16 fields in the payload
    pub const fn field_count(self) -> usize {
        match self {
            TeleopLayout::Linear => 1,
            TeleopLayout::Planar => 2,
        }
    }

    /// Payload length in bytes
    pub const fn payload_len(self) -> usize {
        self.field_count() * 2
    }

    /// Offset added before packing and subtracted after unpacking (mm)
    pub const fn offset(self) -> f32 {
        match self {
            TeleopLayout::Linear => 90.0,
            TeleopLayout::Planar => 200.0,
        }
    }
}

/// Immediate motor command requested by the host
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorOverride {
    /// Zero-based motor index
    pub motor: u8,
    /// Duty fraction to apply
    pub duty: f32,
}

impl MotorOverride {
    /// Interpret the two ASCII digits of an `'m'` payload
    ///
    /// Motors are numbered `'1'..='7'` on the wire. Levels other than
    /// `'0'` and `'1'` have no effect.
    pub fn from_digits(id: u8, level: u8) -> Option<Self> {
        let motor = match id {
            b'1'..=b'7' => id - b'1',
            _ => return None,
        };
        let duty = match level {
            b'0' => 0.0,
            b'1' => OVERRIDE_ON_DUTY,
            _ => return None,
        };
        Some(Self { motor, duty })
    }
}

/// A decoded inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Host acknowledged the last telemetry
    Ack,
    /// Debug ping, no effect beyond marking the link alive
    Ping,
    /// Host requests one telemetry frame
    DataRequest,
    /// Direct motor override (raw ASCII digits)
    Motor { id: u8, level: u8 },
    /// Remote handle position as packed fields; unused fields are zero
    TeleopPosition { raw: [u16; 2] },
    /// Teleoperation partner requests our position
    TeleopPing,
    /// Unrecognized leading byte, `len` bytes swallowed before the terminator
    Opaque { leading: u8, len: usize },
}

impl Message {
    /// Motor command carried by this message, if any
    pub fn motor_override(&self) -> Option<MotorOverride> {
        match *self {
            Message::Motor { id, level } => MotorOverride::from_digits(id, level),
            _ => None,
        }
    }
}

/// Byte-at-a-time parser for the inbound stream
#[derive(Debug, Clone)]
pub struct MessageParser {
    layout: TeleopLayout,
    state: ParseState,
    expected: usize,
    blob_len: usize,
    buffer: Vec<u8, MAX_BLOB_LEN>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for a leading byte
    Idle,
    /// Reading a fixed-length payload
    Payload,
    /// Swallowing an unknown message until the terminator
    Opaque,
}

impl MessageParser {
    /// Create a parser for the given teleoperation payload shape
    pub fn new(layout: TeleopLayout) -> Self {
        Self {
            layout,
            state: ParseState::Idle,
            expected: 0,
            blob_len: 0,
            buffer: Vec::new(),
        }
    }

    /// Teleoperation payload shape this parser expects
    pub fn layout(&self) -> TeleopLayout {
        self.layout
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::Idle;
        self.expected = 0;
        self.blob_len = 0;
        self.buffer.clear();
    }

    /// Bytes of the most recent (or in-progress) message
    ///
    /// Opaque blobs longer than [`MAX_BLOB_LEN`] are truncated here; their
    /// full length is still reported in [`Message::Opaque`].
    pub fn last_received(&self) -> &[u8] {
        &self.buffer
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Some(message)` when a message completes.
    pub fn feed(&mut self, byte: u8) -> Option<Message> {
        match self.state {
            ParseState::Idle => {
                self.buffer.clear();
                let _ = self.buffer.push(byte);
                match byte {
                    MSG_ACK => Some(Message::Ack),
                    MSG_PING => Some(Message::Ping),
                    MSG_DATA_REQUEST => Some(Message::DataRequest),
                    MSG_TELEOP_PING => Some(Message::TeleopPing),
                    MSG_MOTOR => {
                        self.begin_payload(MOTOR_PAYLOAD_LEN);
                        None
                    }
                    MSG_TELEOP_POSITION => {
                        self.begin_payload(self.layout.payload_len());
                        None
                    }
                    // A stray terminator closes nothing; treat it as an empty blob
                    TERMINATOR => Some(Message::Opaque {
                        leading: byte,
                        len: 0,
                    }),
                    _ => {
                        self.blob_len = 0;
                        self.state = ParseState::Opaque;
                        None
                    }
                }
            }
            ParseState::Payload => {
                let _ = self.buffer.push(byte);
                if self.buffer.len() > self.expected {
                    self.state = ParseState::Idle;
                    Some(self.decode_payload())
                } else {
                    None
                }
            }
            ParseState::Opaque => {
                if byte == TERMINATOR {
                    self.state = ParseState::Idle;
                    let leading = self.buffer.first().copied().unwrap_or(0);
                    Some(Message::Opaque {
                        leading,
                        len: self.blob_len,
                    })
                } else {
                    self.blob_len = self.blob_len.saturating_add(1);
                    // Keep what fits, count the rest
                    let _ = self.buffer.push(byte);
                    None
                }
            }
        }
    }

    /// Feed multiple bytes, calling `on_message` for every completed message
    pub fn feed_bytes<F: FnMut(Message)>(&mut self, bytes: &[u8], mut on_message: F) {
        for &byte in bytes {
            if let Some(message) = self.feed(byte) {
                on_message(message);
            }
        }
    }

    fn begin_payload(&mut self, len: usize) {
        self.expected = len;
        self.state = ParseState::Payload;
    }

    fn decode_payload(&self) -> Message {
        let leading = self.buffer[0];
        let payload = &self.buffer[1..];
        if leading == MSG_MOTOR {
            return Message::Motor {
                id: payload[0],
                level: payload[1],
            };
        }

        let mut raw = [0u16; 2];
        for (field, chunk) in raw.iter_mut().zip(payload.chunks_exact(2)) {
            *field = u16::from_be_bytes([chunk[0], chunk[1]]);
        }
        Message::TeleopPosition { raw }
    }
}
