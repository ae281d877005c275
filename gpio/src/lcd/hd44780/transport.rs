//! Clocking a single nibble into the controller.
use crate::delay::Delay;
use crate::lcd::hd44780::pins::{Session, Signal};
use crate::{GpioError, GpioResult, PinPlatform};
use log::trace;

/// Data setup time before E rises, E high pulse width and data hold time after E falls.
pub const NIBBLE_SETUP_US: u32 = 1;
pub const ENABLE_PULSE_US: u32 = 1;
pub const NIBBLE_HOLD_US: u32 = 1;

/// Presents `value` on DB4..DB7 (LSb on DB4) and pulses E.
///
/// The data lines are settled before E rises and are not touched again until after the hold
/// time following the falling edge. There is no acknowledgement from the controller.
///
/// # Errors
/// - `GpioError::InvalidArgument` if `value` does not fit in 4 bits.
pub fn send_nibble<P: PinPlatform, D: Delay + ?Sized>(
    session: &mut Session<'_, P>,
    delay: &mut D,
    value: u8,
) -> GpioResult<()> {
    if value > 0b1111 {
        return Err(GpioError::InvalidArgument);
    }
    trace!("Writing nibble: {:04b}", value);

    session.set(Signal::E, false)?;
    for (bit, signal) in Signal::DATA.into_iter().enumerate() {
        session.set(signal, value & (1 << bit) != 0)?;
    }
    delay.delay_us(NIBBLE_SETUP_US);

    session.set(Signal::E, true)?;
    delay.delay_us(ENABLE_PULSE_US);
    session.set(Signal::E, false)?;
    delay.delay_us(NIBBLE_HOLD_US);

    Ok(())
}
