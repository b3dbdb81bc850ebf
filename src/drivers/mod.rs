//! Register transport drivers, PWM bank and hardware initialisation.

pub mod hw_init;
pub mod pwm;
pub mod shift_register;
