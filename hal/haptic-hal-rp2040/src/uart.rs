//! Host serial transmit

use embassy_rp::uart::BufferedUartTx;
use embedded_io::Write;
use haptic_hal::UartTx;

/// [`UartTx`] over the transmit half of a buffered UART
///
/// Writes block only while the transmit ring buffer is full.
pub struct HostTx {
    tx: BufferedUartTx,
}

impl HostTx {
    pub fn new(tx: BufferedUartTx) -> Self {
        Self { tx }
    }
}

impl UartTx for HostTx {
    type Error = embassy_rp::uart::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(&mut self.tx)
    }
}
