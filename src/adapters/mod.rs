//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements  | Connects to                         |
//! |-------------|-------------|-------------------------------------|
//! | `hardware`  | IoPort      | 74HC165 / 74HC595 chains, LEDC PWM  |
//! | `host`      | HostPort    | Stand-in for the remote host runtime|
//! | `log_sink`  | EventSink   | Serial log output                   |
//! | `nvs`       | ConfigPort  | NVS / in-memory store               |
//! | `serial`    | SerialPort  | Weather station UART / sim queue    |
//! | `time`      | -           | ESP32 system timer                  |

pub mod hardware;
pub mod host;
pub mod log_sink;
pub mod nvs;
pub mod serial;
pub mod time;
