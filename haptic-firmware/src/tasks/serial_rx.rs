//! Host UART receive task
//!
//! Reads the inbound byte stream, decodes messages and publishes them to
//! the shared protocol state. Motor overrides are forwarded to the
//! control task.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use haptic_protocol::{Message, MessageParser, TeleopLayout};

use crate::channels::{MOTOR_OVERRIDE, PROTOCOL};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Serial RX task - receives and decodes host messages
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx, layout: TeleopLayout) {
    info!("Serial RX task started");

    let mut parser = MessageParser::new(layout);
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    if let Some(message) = parser.feed(byte) {
                        handle_message(message);
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

fn handle_message(message: Message) {
    match message {
        Message::Ack | Message::DataRequest | Message::TeleopPing => {
            trace!("{:?}", message);
        }
        Message::Ping => debug!("Ping"),
        Message::TeleopPosition { raw } => trace!("Teleop position {:?}", raw),
        Message::Motor { id, level } => {
            debug!("Motor message: id={} level={}", id as char, level as char)
        }
        Message::Opaque { leading, len } => {
            debug!("Ignored blob: leading {=u8:#x}, {} bytes", leading, len)
        }
    }

    if let Some(command) = PROTOCOL.apply(&message) {
        if MOTOR_OVERRIDE.try_send(command).is_err() {
            warn!("Override channel full, dropping motor {} command", command.motor + 1);
        }
    }
}
