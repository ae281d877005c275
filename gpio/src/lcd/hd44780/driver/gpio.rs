use crate::delay::Delay;
use crate::lcd::hd44780::driver::{Command, HD44780Driver};
use crate::lcd::hd44780::pins::{Session, Signal};
use crate::lcd::hd44780::transport::send_nibble;
use crate::{GpioResult, PinPlatform};
use log::{info, trace};

/// RS settle time before the first nibble.
pub const RS_SETUP_US: u32 = 1;
/// Execution time allowed after every byte. Clear display is not given extra time.
pub const EXECUTION_US: u32 = 50;
/// Additional wait after each initialization step.
pub const INIT_STEP_US: u32 = 50;

/// HD44780 driven in 4-bit mode over GPIO lines held by a [Session].
///
/// RW is driven low when the session is formed and never raised, the controller is only
/// written to.
#[derive(Debug)]
pub struct GpioHD44780Driver<'a, P: PinPlatform, D: Delay> {
    session: Session<'a, P>,
    delay: D,
}

impl<'a, P: PinPlatform, D: Delay> GpioHD44780Driver<'a, P, D> {
    /// Runs the power-on initialization on a freshly formed session.
    ///
    /// The driver can only be obtained through this, so no other traffic can reach the
    /// controller before the sequence has completed.
    pub fn init(session: Session<'a, P>, delay: D) -> GpioResult<Self> {
        let mut driver = GpioHD44780Driver { session, delay };

        for command in Command::INIT_SEQUENCE {
            driver.send_command(command.into())?;
            driver.delay.delay_us(INIT_STEP_US);
        }

        info!("HD44780 initialized");
        Ok(driver)
    }

    fn send(&mut self, data: u8, rs: bool) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);

        self.session.set(Signal::RS, rs)?;
        self.delay.delay_us(RS_SETUP_US);

        send_nibble(&mut self.session, &mut self.delay, (data >> 4) & 0x0F)?;
        send_nibble(&mut self.session, &mut self.delay, data & 0x0F)?;

        self.delay.delay_us(EXECUTION_US);
        Ok(())
    }

    pub fn session(&self) -> &Session<'a, P> {
        &self.session
    }

    /// Releases every line. Dropping the driver has the same effect.
    pub fn release(mut self) {
        self.session.release_all();
    }
}

impl<P: PinPlatform, D: Delay> HD44780Driver for GpioHD44780Driver<'_, P, D> {
    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        self.send(command, false)
    }

    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.send(data, true)
    }
}
