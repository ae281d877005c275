pub mod delay;
pub mod gpiod;
pub mod lcd;
pub mod raw;

use crate::lcd::hd44780::pins::Signal;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("line {0:?} is not acquired")]
    NotAcquired(Signal),
    #[error("pins unavailable: {0:?}")]
    PinsUnavailable(Vec<Signal>),
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Pin ownership and output primitives of the host platform.
///
/// Physical ids are whatever the backend uses to address a line (a BCM GPIO number, a
/// character device line offset, ...).
pub trait PinPlatform: Debug {
    /// Claims exclusive ownership of the line.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the id does not exist on this platform.
    /// - `GpioError::AlreadyInUse` if the line is already claimed.
    fn claim(&mut self, physical_id: u32, name: &str) -> GpioResult<()>;

    /// Returns a claimed line to the platform. Freeing an unclaimed line does nothing.
    fn free(&mut self, physical_id: u32);

    /// Switches a claimed line to output mode, driving it to `level` right away.
    fn set_direction_output(&mut self, physical_id: u32, level: bool) -> GpioResult<()>;

    /// Drives an output line high (`true`) or low (`false`).
    fn set_level(&mut self, physical_id: u32, level: bool) -> GpioResult<()>;
}

impl<T: PinPlatform + ?Sized> PinPlatform for &mut T {
    fn claim(&mut self, physical_id: u32, name: &str) -> GpioResult<()> {
        (**self).claim(physical_id, name)
    }

    fn free(&mut self, physical_id: u32) {
        (**self).free(physical_id)
    }

    fn set_direction_output(&mut self, physical_id: u32, level: bool) -> GpioResult<()> {
        (**self).set_direction_output(physical_id, level)
    }

    fn set_level(&mut self, physical_id: u32, level: bool) -> GpioResult<()> {
        (**self).set_level(physical_id, level)
    }
}
