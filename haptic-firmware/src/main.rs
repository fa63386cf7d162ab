//! Haptic - Desktop Haptic Device Firmware
//!
//! Main firmware binary for RP2040-based haptic controllers with up to
//! three force-feedback motors, two vibration motors and two FSRs.
//!
//! Pin map:
//! - UART0 to host: GPIO0 (TX), GPIO1 (RX), 115200 baud
//! - Encoders A/B: axis 0 GPIO2/3, axis 1 GPIO4/5, axis 2 GPIO6/7
//! - Force motors PWM/DIR: GPIO8/9, GPIO10/11, GPIO12/13
//! - Vibration motors PWM: GPIO14, GPIO16
//! - FSRs: ADC0 (GPIO26), ADC1 (GPIO27)

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm, PwmOutput};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use haptic_core::control::ControlLoop;
use haptic_drivers::motor::{TorqueMotorBank, VibrationMotors};
use haptic_drivers::sensor::Fsr;
use haptic_hal_rp2040::{
    AdcInputs, EmbassyClock, HostTx, MotorChannel, PwmMotorBank, QuadraturePins,
};

use crate::channels::{ENCODERS, PROTOCOL};
use crate::config::load_config;
use crate::tasks::FeedbackConfig;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// PWM wrap value: 125 MHz / (6249 + 1) = 20 kHz, above hearing
const PWM_TOP: u16 = 6249;

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Haptic firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // Setup UART for the host link
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("UART initialized");

    // Force-feedback motors: PWM on channel A of slices 4-6, direction
    // on the odd pin next to it. Start at 0% duty.
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = PWM_TOP;
    pwm_config.compare_a = 0;

    let motors = PwmMotorBank::new([
        MotorChannel::new(
            channel_a(Pwm::new_output_a(p.PWM_SLICE4, p.PIN_8, pwm_config.clone())),
            Output::new(p.PIN_9, Level::Low),
        ),
        MotorChannel::new(
            channel_a(Pwm::new_output_a(p.PWM_SLICE5, p.PIN_10, pwm_config.clone())),
            Output::new(p.PIN_11, Level::Low),
        ),
        MotorChannel::new(
            channel_a(Pwm::new_output_a(p.PWM_SLICE6, p.PIN_12, pwm_config.clone())),
            Output::new(p.PIN_13, Level::Low),
        ),
    ]);
    let actuator = TorqueMotorBank::new(motors, config.device.torque_to_duty);

    let vibration = VibrationMotors::new(PwmMotorBank::new([
        MotorChannel::unidirectional(channel_a(Pwm::new_output_a(
            p.PWM_SLICE7,
            p.PIN_14,
            pwm_config.clone(),
        ))),
        MotorChannel::unidirectional(channel_a(Pwm::new_output_a(
            p.PWM_SLICE0,
            p.PIN_16,
            pwm_config,
        ))),
    ]));
    info!("Motors initialized ({} torque, 2 vibration)", config::BOARD_MOTORS);

    // FSRs on ADC0/ADC1
    let adc = Adc::new_blocking(p.ADC, AdcConfig::default());
    let fsr_inputs = AdcInputs::new(
        adc,
        [
            Channel::new_pin(p.PIN_26, Pull::None),
            Channel::new_pin(p.PIN_27, Pull::None),
        ],
    );
    let fsr = Fsr::new(fsr_inputs, [0, 1], config.fsr);

    let encoders = [
        QuadraturePins::new(p.PIN_2, p.PIN_3),
        QuadraturePins::new(p.PIN_4, p.PIN_5),
        QuadraturePins::new(p.PIN_6, p.PIN_7),
    ];

    let control = ControlLoop::new(
        &config,
        EmbassyClock,
        actuator,
        HostTx::new(tx),
        &ENCODERS,
        &PROTOCOL,
    );

    let feedback_config = FeedbackConfig {
        fsr_enabled: config.fsr.enabled,
        ..FeedbackConfig::default()
    };

    // Spawn tasks
    info!("Spawning tasks...");

    for (axis, pins) in encoders.into_iter().enumerate() {
        spawner.spawn(tasks::encoder_task(axis, pins)).unwrap();
    }
    spawner
        .spawn(tasks::serial_rx_task(
            rx,
            config.device.topology.teleop_layout(),
        ))
        .unwrap();
    spawner.spawn(tasks::control_task(control)).unwrap();
    spawner
        .spawn(tasks::feedback_task(fsr, vibration, feedback_config))
        .unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!(
            "Main loop heartbeat (host link: {})",
            PROTOCOL.link_alive()
        );
    }
}

/// Channel A of a slice configured with `Pwm::new_output_a`
fn channel_a(pwm: Pwm<'static>) -> PwmOutput<'static> {
    let (a, _) = pwm.split();
    unwrap!(a)
}
