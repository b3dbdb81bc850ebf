//! Weather station serial adapters.
//!
//! - **`target_os = "espidf"`**: [`UartSerial`] polls the UART driver
//!   installed by [`hw_init`](crate::drivers::hw_init) without blocking.
//! - **host**: [`SimSerial`] plays back queued bytes for tests and
//!   simulation.

use heapless::Deque;

use crate::app::ports::SerialPort;

/// Non-blocking reader on the weather station UART.
#[cfg(target_os = "espidf")]
pub struct UartSerial {
    port: i32,
}

#[cfg(target_os = "espidf")]
impl UartSerial {
    pub fn new() -> Self {
        Self { port: crate::pins::WS_UART_PORT }
    }
}

#[cfg(target_os = "espidf")]
impl SerialPort for UartSerial {
    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = 0u8;
        // SAFETY: driver installed in hw_init; zero timeout never blocks.
        let n = unsafe {
            esp_idf_svc::sys::uart_read_bytes(self.port, (&raw mut byte).cast(), 1, 0)
        };
        (n == 1).then_some(byte)
    }
}

/// Receive queue capacity of the simulated link.
pub const SIM_CAPACITY: usize = 256;

/// In-memory byte source.  Bytes beyond capacity are dropped, like a UART
/// FIFO overrun.
#[derive(Default)]
pub struct SimSerial {
    rx: Deque<u8, SIM_CAPACITY>,
}

impl SimSerial {
    pub fn new() -> Self {
        Self { rx: Deque::new() }
    }

    /// Queue bytes for reception.  Returns how many fitted.
    pub fn inject(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().take_while(|&&b| self.rx.push_back(b).is_ok()).count()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl SerialPort for SimSerial {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}
