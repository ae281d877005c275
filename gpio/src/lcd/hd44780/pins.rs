//! Ownership of the lines the controller is wired to.
//!
//! A [Session] can only be obtained from [PinManager::acquire_all], which either claims every
//! line of the [LineSet] or none of them. Lines are released by [Session::release_all] or when
//! the session is dropped.
use crate::{GpioError, GpioResult, PinPlatform};
use log::{debug, trace, warn};

/// Logical signal of the 4-bit HD44780 interface.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Signal {
    /// Enable
    E,
    /// Read/Write
    RW,
    /// Register-Select
    RS,
    DB4,
    DB5,
    DB6,
    DB7,
}

impl Signal {
    /// Acquisition order.
    pub const ALL: [Signal; 7] = [
        Signal::E,
        Signal::RW,
        Signal::RS,
        Signal::DB4,
        Signal::DB5,
        Signal::DB6,
        Signal::DB7,
    ];

    /// Data lines, least significant bit first.
    pub const DATA: [Signal; 4] = [Signal::DB4, Signal::DB5, Signal::DB6, Signal::DB7];

    /// Name handed to the platform when claiming the line.
    pub fn name(&self) -> &'static str {
        match self {
            Signal::E => "HD44780_E",
            Signal::RW => "HD44780_RW",
            Signal::RS => "HD44780_RS",
            Signal::DB4 => "HD44780_DB4",
            Signal::DB5 => "HD44780_DB5",
            Signal::DB6 => "HD44780_DB6",
            Signal::DB7 => "HD44780_DB7",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Board wiring: which physical line each signal is connected to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PinMap {
    pub rs: u32,
    pub rw: u32,
    pub e: u32,
    /// DB4 first.
    pub data: [u32; 4],
}

impl PinMap {
    pub fn physical_id(&self, signal: Signal) -> u32 {
        match signal {
            Signal::E => self.e,
            Signal::RW => self.rw,
            Signal::RS => self.rs,
            Signal::DB4 => self.data[0],
            Signal::DB5 => self.data[1],
            Signal::DB6 => self.data[2],
            Signal::DB7 => self.data[3],
        }
    }
}

impl Default for PinMap {
    fn default() -> Self {
        PinMap {
            rs: 0,
            rw: 8,
            e: 1,
            data: [13, 14, 15, 16],
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LineState {
    Unacquired,
    Acquired,
    Released,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub signal: Signal,
    pub physical_id: u32,
    state: LineState,
}

impl Line {
    pub fn name(&self) -> &'static str {
        self.signal.name()
    }

    pub fn state(&self) -> LineState {
        self.state
    }
}

/// The lines required by the protocol, in [Signal::ALL] order.
#[derive(Debug, Clone)]
pub struct LineSet {
    lines: [Line; 7],
}

impl LineSet {
    pub fn new(map: &PinMap) -> Self {
        LineSet {
            lines: Signal::ALL.map(|signal| Line {
                signal,
                physical_id: map.physical_id(signal),
                state: LineState::Unacquired,
            }),
        }
    }

    pub fn get(&self, signal: Signal) -> &Line {
        &self.lines[signal.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    pub fn all_acquired(&self) -> bool {
        self.lines.iter().all(|line| line.state == LineState::Acquired)
    }
}

/// Owns the platform and the [LineSet] for the lifetime of the driver.
#[derive(Debug)]
pub struct PinManager<P: PinPlatform> {
    platform: P,
    lines: LineSet,
}

impl<P: PinPlatform> PinManager<P> {
    pub fn new(platform: P, map: &PinMap) -> Self {
        PinManager {
            platform,
            lines: LineSet::new(map),
        }
    }

    pub fn lines(&self) -> &LineSet {
        &self.lines
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Claims every line, then configures all of them as outputs driven low.
    ///
    /// Every claim is attempted even after a failure. If any claim or direction change fails,
    /// all lines claimed during this call are freed again before returning.
    ///
    /// # Errors
    /// - `GpioError::PinsUnavailable` listing every line that could not be claimed or configured.
    pub fn acquire_all(&mut self) -> GpioResult<Session<'_, P>> {
        let mut failed = Vec::new();

        for line in self.lines.lines.iter_mut() {
            match self.platform.claim(line.physical_id, line.name()) {
                Ok(()) => {
                    trace!("Claimed {} ({})", line.name(), line.physical_id);
                    line.state = LineState::Acquired;
                }
                Err(err) => {
                    warn!("Failed to claim {} ({}): {}", line.name(), line.physical_id, err);
                    failed.push(line.signal);
                }
            }
        }

        if failed.is_empty() {
            for line in self.lines.lines.iter() {
                if let Err(err) = self.platform.set_direction_output(line.physical_id, false) {
                    warn!(
                        "Failed to set {} ({}) as output: {}",
                        line.name(),
                        line.physical_id,
                        err
                    );
                    failed.push(line.signal);
                }
            }
        }

        if !failed.is_empty() {
            self.release_acquired();
            return Err(GpioError::PinsUnavailable(failed));
        }

        debug!("Acquired all {} lines", self.lines.lines.len());
        Ok(Session { manager: self })
    }

    /// Frees every line currently in [LineState::Acquired] state.
    fn release_acquired(&mut self) {
        for line in self.lines.lines.iter_mut() {
            if line.state == LineState::Acquired {
                self.platform.free(line.physical_id);
                line.state = LineState::Released;
                trace!("Freed {} ({})", line.name(), line.physical_id);
            }
        }
    }
}

/// Exclusive ownership of every line in the [LineSet].
///
/// Releasing is idempotent, and also happens on drop.
#[derive(Debug)]
pub struct Session<'a, P: PinPlatform> {
    manager: &'a mut PinManager<P>,
}

impl<P: PinPlatform> Session<'_, P> {
    /// Drives the line of `signal` to `level`.
    ///
    /// # Errors
    /// - `GpioError::NotAcquired` once the session has been released.
    pub fn set(&mut self, signal: Signal, level: bool) -> GpioResult<()> {
        let line = self.manager.lines.get(signal);
        if line.state != LineState::Acquired {
            return Err(GpioError::NotAcquired(signal));
        }
        self.manager.platform.set_level(line.physical_id, level)
    }

    pub fn lines(&self) -> &LineSet {
        &self.manager.lines
    }

    pub fn is_active(&self) -> bool {
        self.manager.lines.all_acquired()
    }

    /// Frees every line still held. Lines already released are skipped.
    pub fn release_all(&mut self) {
        if self.manager.lines.iter().any(|line| line.state == LineState::Acquired) {
            debug!("Releasing lines");
        }
        self.manager.release_acquired();
    }
}

impl<P: PinPlatform> Drop for Session<'_, P> {
    fn drop(&mut self) {
        self.release_all();
    }
}
