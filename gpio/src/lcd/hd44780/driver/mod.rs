mod gpio;

use crate::GpioResult;
pub use gpio::*;
use std::fmt::Debug;

/// Instruction codes used by this driver.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum Command {
    /// Repeated function set, resynchronizes the interface from any state.
    Resync = 0x33,
    /// Function set switching the interface to 4 bits.
    FourBitMode = 0x32,
    /// 4-bit, 2 lines, 5x8 font.
    FunctionSet = 0x28,
    /// Display on, cursor off, blink off.
    DisplayOn = 0x0C,
    ClearDisplay = 0x01,
    /// Increment cursor, no shift.
    EntryMode = 0x06,
    /// DDRAM address 0x40, start of the second line.
    SecondLine = 0xC0,
}

impl Command {
    /// Power-on initialization for 4-bit operation, in order.
    pub const INIT_SEQUENCE: [Command; 6] = [
        Command::Resync,
        Command::FourBitMode,
        Command::FunctionSet,
        Command::DisplayOn,
        Command::ClearDisplay,
        Command::EntryMode,
    ];
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command as u8
    }
}

pub trait HD44780Driver: Debug {
    /// Sends a command to the HD44780 controller.
    /// Sets the RS pin to 0 (command).
    fn send_command(&mut self, command: u8) -> GpioResult<()>;

    /// Sends data to the HD44780 controller.
    /// Sets the RS pin to 1 (data).
    fn send_data(&mut self, data: u8) -> GpioResult<()>;

    /// Moves the cursor to the start of the second line.
    fn next_line(&mut self) -> GpioResult<()> {
        self.send_command(Command::SecondLine.into())
    }
}

impl<T: HD44780Driver + ?Sized> HD44780Driver for &mut T {
    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        (**self).send_command(command)
    }

    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        (**self).send_data(data)
    }
}
