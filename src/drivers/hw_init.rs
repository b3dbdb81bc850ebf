//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions, the LEDC timer/channels for the switch PWM
//! outputs and the weather station UART using raw ESP-IDF sys calls.
//! Called once from `main()` before the control loop starts.
//!
//! The thin [`SysPin`], [`SysInput`] and [`LedcChannel`] handles expose the
//! configured peripherals through the `embedded-hal` traits the drivers are
//! generic over.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    UartInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::UartInitFailed(rc) => write!(f, "UART driver install failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
        init_ledc()?;
        init_uart()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn config_pins(pins: &[i32], mode: gpio_mode_t) -> Result<(), HwInitError> {
    for &pin in pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    unsafe { config_pins(&[pins::SR_IN_SDIN_GPIO], gpio_mode_t_GPIO_MODE_INPUT)? };
    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let output_pins = [
        pins::SR_OUT_OE_GPIO,
        pins::SR_OUT_STCP_GPIO,
        pins::SR_OUT_MR_GPIO,
        pins::SR_OUT_SHCP_GPIO,
        pins::SR_OUT_SDOUT_GPIO,
        pins::SR_IN_CE_GPIO,
        pins::SR_IN_CP_GPIO,
        pins::SR_IN_PL_GPIO,
    ];
    unsafe { config_pins(&output_pins, gpio_mode_t_GPIO_MODE_OUTPUT)? };

    // 74HC165 idle: chip disabled and not loading until the first read.
    for (pin, level) in [
        (pins::SR_IN_CE_GPIO, 1),
        (pins::SR_IN_CP_GPIO, 0),
        (pins::SR_IN_PL_GPIO, 1),
    ] {
        let ret = unsafe { gpio_set_level(pin, level) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }
    info!("hw_init: GPIO outputs configured");
    Ok(())
}

/// Push-pull output configured by [`init_peripherals`].
pub struct SysPin(pub i32);

/// Input configured by [`init_peripherals`].
pub struct SysInput(pub i32);

impl embedded_hal::digital::ErrorType for SysPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::ErrorType for SysInput {
    type Error = core::convert::Infallible;
}

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::OutputPin for SysPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        // SAFETY: register write on a pin configured as output during init.
        unsafe { gpio_set_level(self.0, 0) };
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        // SAFETY: as above.
        unsafe { gpio_set_level(self.0, 1) };
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl embedded_hal::digital::OutputPin for SysPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::InputPin for SysInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        // SAFETY: read-only register access on a configured input pin.
        Ok(unsafe { gpio_get_level(self.0) } != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

/// Open inputs float high, which reads as "nothing active" after inversion.
#[cfg(not(target_os = "espidf"))]
impl embedded_hal::digital::InputPin for SysInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: single main-task context via init_peripherals().
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    for (i, &gpio) in pins::PWM_GPIOS.iter().enumerate() {
        let ret = unsafe {
            ledc_channel_config(&ledc_channel_config_t {
                speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
                channel: ledc_channel_t_LEDC_CHANNEL_0 + i as u32,
                timer_sel: ledc_timer_t_LEDC_TIMER_0,
                gpio_num: gpio,
                duty: 0,
                hpoint: 0,
                ..Default::default()
            })
        };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::LedcInitFailed(ret));
        }
    }

    info!("hw_init: LEDC configured (PWM0-3 = CH0-3, {} Hz)", pins::PWM_FREQ_HZ);
    Ok(())
}

/// LEDC duty that holds the output constantly high (`2^resolution`).
pub const LEDC_FULL_ON_DUTY: u32 = 1 << crate::pins::PWM_RESOLUTION_BITS;

/// One LEDC channel on the shared 8-bit timer.
pub struct LedcChannel {
    channel: u32,
    /// Raw value last written to the duty register.
    raw_duty: Option<u32>,
}

impl LedcChannel {
    pub const fn new(channel: u32) -> Self {
        Self { channel, raw_duty: None }
    }

    pub fn raw_duty(&self) -> Option<u32> {
        self.raw_duty
    }

    #[cfg(target_os = "espidf")]
    fn write_raw(&mut self, duty: u32) {
        // SAFETY: channel configured in init_ledc(); only the control loop
        // writes duty registers.
        unsafe {
            ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel, duty);
            ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel);
        }
        self.raw_duty = Some(duty);
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_raw(&mut self, duty: u32) {
        let _ = self.channel;
        self.raw_duty = Some(duty);
    }
}

impl embedded_hal::pwm::ErrorType for LedcChannel {
    type Error = core::convert::Infallible;
}

impl embedded_hal::pwm::SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        (1u16 << crate::pins::PWM_RESOLUTION_BITS) - 1
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.write_raw(u32::from(duty));
        Ok(())
    }

    /// `max_duty_cycle` still leaves one low tick per period on LEDC.
    fn set_duty_cycle_fully_on(&mut self) -> Result<(), Self::Error> {
        self.write_raw(LEDC_FULL_ON_DUTY);
        Ok(())
    }
}

// ── Weather station UART ─────────────────────────────────────

/// Driver-side receive buffer (bytes).
pub const WS_UART_RX_BUFFER: i32 = 256;

#[cfg(target_os = "espidf")]
unsafe fn init_uart() -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: pins::WS_UART_BAUD as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    // SAFETY: single main-task context via init_peripherals().
    let ret = unsafe {
        uart_driver_install(
            pins::WS_UART_PORT,
            WS_UART_RX_BUFFER,
            0,
            0,
            core::ptr::null_mut(),
            0,
        )
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::UartInitFailed(ret));
    }
    let ret = unsafe { uart_param_config(pins::WS_UART_PORT, &cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::UartInitFailed(ret));
    }
    let ret = unsafe {
        uart_set_pin(
            pins::WS_UART_PORT,
            pins::WS_UART_TX_GPIO,
            pins::WS_UART_RX_GPIO,
            UART_PIN_NO_CHANGE,
            UART_PIN_NO_CHANGE,
        )
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::UartInitFailed(ret));
    }

    info!("hw_init: weather UART{} at {} baud", pins::WS_UART_PORT, pins::WS_UART_BAUD);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::pwm::SetDutyCycle;

    #[test]
    fn ledc_channel_is_eight_bit() {
        assert_eq!(LedcChannel::new(0).max_duty_cycle(), 255);
    }

    #[test]
    fn ledc_extremes_hold_the_pin_steady() {
        use crate::drivers::pwm::PwmBank;

        let mut bank = PwmBank::new([LedcChannel::new(0), LedcChannel::new(1), LedcChannel::new(2), LedcChannel::new(3)]);
        bank.apply(&[0, 50, 100, 99]).unwrap();
        let raw = bank.channels().each_ref().map(LedcChannel::raw_duty);
        assert_eq!(raw, [Some(0), Some(127), Some(LEDC_FULL_ON_DUTY), Some(252)]);
        assert_eq!(LEDC_FULL_ON_DUTY, 256);
    }

    #[test]
    fn host_init_is_a_no_op() {
        assert_eq!(init_peripherals(), Ok(()));
    }
}
