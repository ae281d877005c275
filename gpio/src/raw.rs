//! Pin platform poking the BCM283x GPIO registers through a memory map.
use crate::{GpioError, GpioResult, PinPlatform};
use bitvec::vec::BitVec;
use log::trace;
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;

const FUNCTION_INPUT: u8 = 0b000;
const FUNCTION_OUTPUT: u8 = 0b001;

pub struct RawPlatform {
    mmap: MmapRaw,
    used_pins: BitVec,
}

impl RawPlatform {
    // 0x7e200000
    // #[cfg(target_pointer_width = "64")]
    // const GPIO_BASE: u32 = 0xFE200000;
    const GPIO_BASE: u32 = 0x3F200000;

    const PIN_COUNT: usize = 58;

    fn create(path: &str, offset: u64) -> GpioResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let mmap = MmapOptions::new()
            .offset(offset)
            .len(4096)
            .map_raw(&file)?;

        Ok(RawPlatform {
            mmap,
            used_pins: BitVec::repeat(false, Self::PIN_COUNT),
        })
    }

    /// `/dev/gpiomem` already starts at the GPIO block.
    pub fn new_gpiomem() -> GpioResult<Self> {
        Self::create("/dev/gpiomem", 0)
    }

    pub fn new_mem() -> GpioResult<Self> {
        Self::create("/dev/mem", Self::GPIO_BASE as u64)
    }

    fn check_index(physical_id: u32) -> GpioResult<usize> {
        let pin_index = physical_id as usize;
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }
        Ok(pin_index)
    }

    fn raw_set_pin_function(&self, pin_index: usize, function: u8) -> GpioResult<()> {
        if function > 0b111 {
            return Err(GpioError::InvalidArgument);
        }

        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        // GPFSELn register
        let register_ptr = unsafe { mmap.add(pin_index / 10) };
        let shift = (pin_index % 10) * 3;

        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b111 << shift);
        register_value |= (function as u32) << shift;
        unsafe { register_ptr.write_volatile(register_value) };

        Ok(())
    }

    fn raw_set_pin_output(&self, pin_index: usize, high: bool) {
        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        // GPSETn/GPCLRn register
        let register_ptr =
            unsafe { mmap.add(if high { 0x1c / 4 } else { 0x28 / 4 } + pin_index / 32) };
        let shift = pin_index % 32;

        unsafe { register_ptr.write_volatile(1 << shift) };
    }

    fn is_claimed(&self, pin_index: usize) -> bool {
        self.used_pins[pin_index]
    }
}

impl Debug for RawPlatform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawPlatform({:?})", self.mmap.as_ptr().addr())
    }
}

impl PinPlatform for RawPlatform {
    fn claim(&mut self, physical_id: u32, name: &str) -> GpioResult<()> {
        let pin_index = Self::check_index(physical_id)?;

        if self.is_claimed(pin_index) {
            return Err(GpioError::AlreadyInUse);
        }

        self.used_pins.set(pin_index, true);
        trace!("{:?}[{}] claimed as {}", self, pin_index, name);
        Ok(())
    }

    fn free(&mut self, physical_id: u32) {
        let Ok(pin_index) = Self::check_index(physical_id) else {
            return;
        };
        if !self.is_claimed(pin_index) {
            return;
        }

        _ = self.raw_set_pin_function(pin_index, FUNCTION_INPUT);
        self.used_pins.set(pin_index, false);
    }

    fn set_direction_output(&mut self, physical_id: u32, level: bool) -> GpioResult<()> {
        let pin_index = Self::check_index(physical_id)?;
        if !self.is_claimed(pin_index) {
            return Err(GpioError::InvalidArgument);
        }

        // Latch the level first so the pin does not glitch when it becomes an output
        self.raw_set_pin_output(pin_index, level);
        self.raw_set_pin_function(pin_index, FUNCTION_OUTPUT)
    }

    fn set_level(&mut self, physical_id: u32, level: bool) -> GpioResult<()> {
        let pin_index = Self::check_index(physical_id)?;
        if !self.is_claimed(pin_index) {
            return Err(GpioError::InvalidArgument);
        }

        self.raw_set_pin_output(pin_index, level);
        Ok(())
    }
}
