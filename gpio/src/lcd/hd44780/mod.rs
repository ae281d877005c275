//! HD44780 character LCD in 4-bit mode, bit-banged over GPIO lines.
//!
//! Typical use:
//! 1. [PinManager::acquire_all] claims the wired lines and yields a [Session].
//! 2. [GpioHD44780Driver::init] runs the power-on sequence and returns the driver.
//! 3. Bytes go out through [HD44780Driver], or a [stream::DataSink]/[stream::CommandSink].
//!
//! The controller is never read from. Nothing it does is acknowledged, so a display that
//! does not update is not detectable here.
pub mod driver;
pub mod pins;
pub mod stream;
pub mod transport;
#[cfg(test)]
mod testing;

pub use driver::{Command, GpioHD44780Driver, HD44780Driver};
pub use pins::{Line, LineSet, LineState, PinManager, PinMap, Session, Signal};
