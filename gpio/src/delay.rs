//! Blocking delay primitive used for controller setup/hold and execution times.
use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

pub trait Delay: Debug {
    /// Blocks for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Sleeps the current thread.
///
/// The OS may oversleep (often by tens of microseconds), which only ever lengthens the
/// controller timings, never shortens them.
#[derive(Debug, Default, Copy, Clone)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_us(&mut self, us: u32) {
        sleep(Duration::from_micros(us as u64));
    }
}
