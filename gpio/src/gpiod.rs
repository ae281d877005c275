//! Pin platform backed by the Linux GPIO character device, through the gpiod library.
use crate::{GpioError, GpioResult, PinPlatform};
use bitvec::vec::BitVec;
use log::{trace, warn};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

/// GpiodPlatform hands out lines of a single GPIO chip.
///
/// Claiming only books the line locally. The kernel request is made when the line is switched
/// to output, and a line held by another consumer fails at that point.
pub struct GpiodPlatform {
    chip: gpiod::Chip,
    used_pins: BitVec,
    consumers: HashMap<u32, String>,
    outputs: HashMap<u32, gpiod::Lines<gpiod::Output>>,
}

impl GpiodPlatform {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        Self {
            chip,
            used_pins: BitVec::repeat(false, n),
            consumers: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    pub fn open(path: &str) -> GpioResult<Self> {
        Ok(Self::new(gpiod::Chip::new(path)?))
    }

    fn count(&self) -> usize {
        self.chip.num_lines() as usize
    }

    fn is_claimed(&self, physical_id: u32) -> bool {
        self.used_pins
            .get(physical_id as usize)
            .map(|bit| *bit)
            .unwrap_or(false)
    }
}

impl Debug for GpiodPlatform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodPlatform({})", self.chip.name())
    }
}

impl PinPlatform for GpiodPlatform {
    fn claim(&mut self, physical_id: u32, name: &str) -> GpioResult<()> {
        let index = physical_id as usize;
        if index >= self.count() {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        self.used_pins.set(index, true);
        self.consumers.insert(physical_id, name.to_string());
        Ok(())
    }

    fn free(&mut self, physical_id: u32) {
        if !self.is_claimed(physical_id) {
            return;
        }

        // Dropping the request hands the line back to the kernel
        self.outputs.remove(&physical_id);
        self.consumers.remove(&physical_id);
        self.used_pins.set(physical_id as usize, false);
        trace!("{:?}[{}] freed", self, physical_id);
    }

    fn set_direction_output(&mut self, physical_id: u32, level: bool) -> GpioResult<()> {
        if !self.is_claimed(physical_id) {
            return Err(GpioError::InvalidArgument);
        }

        let consumer = self
            .consumers
            .get(&physical_id)
            .cloned()
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
        let line = self
            .chip
            .request_lines(
                gpiod::Options::output([physical_id])
                    .values([level])
                    .consumer(consumer),
            )
            .inspect_err(|err| warn!("{:?}[{}] request failed: {}", self, physical_id, err))?;
        self.outputs.insert(physical_id, line);
        Ok(())
    }

    fn set_level(&mut self, physical_id: u32, level: bool) -> GpioResult<()> {
        let line = self
            .outputs
            .get(&physical_id)
            .ok_or(GpioError::InvalidArgument)?;
        line.set_values([level])?;
        Ok(())
    }
}
