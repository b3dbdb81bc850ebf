//! GPIO / peripheral pin assignments for the TSBoard main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.
//!
//! Pins 0, 18–19, 21–23, 25–27 are also claimed by the LAN8720 Ethernet PHY
//! on boards fitted with it; the network stack owns those, not this crate.

// ---------------------------------------------------------------------------
// Output shift register (74HC595 × 2, 16 outputs)
// ---------------------------------------------------------------------------

/// Output enable (active LOW).
pub const SR_OUT_OE_GPIO: i32 = 15;
/// Storage-register clock: rising edge latches the shifted image onto the pins.
pub const SR_OUT_STCP_GPIO: i32 = 2;
/// Master reset (active LOW): clears the shift stage.
pub const SR_OUT_MR_GPIO: i32 = 12;
/// Shift-register clock.
pub const SR_OUT_SHCP_GPIO: i32 = 14;
/// Serial data out (MSB first).
pub const SR_OUT_SDOUT_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Input shift register (74HC165 × 2, 16 inputs, active LOW sensing)
// ---------------------------------------------------------------------------

/// Chip enable (active LOW).
pub const SR_IN_CE_GPIO: i32 = 5;
/// Clock pulse.
pub const SR_IN_CP_GPIO: i32 = 18;
/// Parallel load (active LOW): latches the input pins into the register.
pub const SR_IN_PL_GPIO: i32 = 19;
/// Serial data in (Q7).
pub const SR_IN_SDIN_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// PWM outputs (switch slots 16–19)
// ---------------------------------------------------------------------------

pub const PWM0_GPIO: i32 = 32;
pub const PWM1_GPIO: i32 = 33;
pub const PWM2_GPIO: i32 = 25;
pub const PWM3_GPIO: i32 = 26;

/// PWM pins in channel order.
pub const PWM_GPIOS: [i32; 4] = [PWM0_GPIO, PWM1_GPIO, PWM2_GPIO, PWM3_GPIO];

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the switch PWM outputs (1 kHz).
pub const PWM_FREQ_HZ: u32 = 1_000;

// ---------------------------------------------------------------------------
// Network configuration button / LED (owned by the host runtime)
// ---------------------------------------------------------------------------

pub const AP_SET_BUTTON_GPIO: i32 = 34;
pub const AP_LED_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Weather station UART
// ---------------------------------------------------------------------------

pub const WS_UART_RX_GPIO: i32 = 16;
pub const WS_UART_TX_GPIO: i32 = 17;
/// UART port used for the weather station link.
pub const WS_UART_PORT: i32 = 1;
pub const WS_UART_BAUD: u32 = 9_600;
