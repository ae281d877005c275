//! Recording fakes of the pin and delay primitives.
use crate::delay::Delay;
use crate::lcd::hd44780::pins::{PinMap, Signal};
use crate::{GpioError, GpioResult, PinPlatform};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::rc::Rc;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Event {
    Claim(u32),
    Free(u32),
    Output(u32, bool),
    Level(u32, bool),
    Delay(u32),
}

/// Event log shared between the fake platform and the fake delay.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<Event>>>);

impl Recorder {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug)]
pub struct FakePlatform {
    log: Recorder,
    failing_claims: Vec<u32>,
    failing_outputs: Vec<u32>,
    held: Vec<u32>,
    claim_attempts: usize,
    claims: usize,
    frees: usize,
}

impl FakePlatform {
    pub fn new(log: &Recorder) -> Self {
        FakePlatform {
            log: log.clone(),
            failing_claims: Vec::new(),
            failing_outputs: Vec::new(),
            held: Vec::new(),
            claim_attempts: 0,
            claims: 0,
            frees: 0,
        }
    }

    pub fn failing_claim(mut self, physical_id: u32) -> Self {
        self.failing_claims.push(physical_id);
        self
    }

    pub fn failing_output(mut self, physical_id: u32) -> Self {
        self.failing_outputs.push(physical_id);
        self
    }

    pub fn claim_attempts(&self) -> usize {
        self.claim_attempts
    }

    pub fn claims(&self) -> usize {
        self.claims
    }

    pub fn frees(&self) -> usize {
        self.frees
    }

    pub fn held(&self) -> &[u32] {
        &self.held
    }
}

impl PinPlatform for FakePlatform {
    fn claim(&mut self, physical_id: u32, _name: &str) -> GpioResult<()> {
        self.claim_attempts += 1;
        if self.failing_claims.contains(&physical_id) {
            return Err(GpioError::InvalidArgument);
        }
        if self.held.contains(&physical_id) {
            return Err(GpioError::AlreadyInUse);
        }
        self.held.push(physical_id);
        self.claims += 1;
        self.log.push(Event::Claim(physical_id));
        Ok(())
    }

    fn free(&mut self, physical_id: u32) {
        if let Some(pos) = self.held.iter().position(|&id| id == physical_id) {
            self.held.remove(pos);
        }
        self.frees += 1;
        self.log.push(Event::Free(physical_id));
    }

    fn set_direction_output(&mut self, physical_id: u32, level: bool) -> GpioResult<()> {
        if self.failing_outputs.contains(&physical_id) {
            return Err(GpioError::Io(ErrorKind::PermissionDenied));
        }
        self.log.push(Event::Output(physical_id, level));
        Ok(())
    }

    fn set_level(&mut self, physical_id: u32, level: bool) -> GpioResult<()> {
        if !self.held.contains(&physical_id) {
            return Err(GpioError::InvalidArgument);
        }
        self.log.push(Event::Level(physical_id, level));
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeDelay {
    log: Recorder,
}

impl FakeDelay {
    pub fn new(log: &Recorder) -> Self {
        FakeDelay { log: log.clone() }
    }
}

impl Delay for FakeDelay {
    fn delay_us(&mut self, us: u32) {
        self.log.push(Event::Delay(us));
    }
}

/// A value latched by the controller on a falling edge of E.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Latch {
    /// RS level at the time of the edge.
    pub rs: bool,
    pub nibble: u8,
}

/// Replays the recorded pin levels and returns what the controller latched.
///
/// Panics if a data line or RS changes while E is high.
pub fn latched(events: &[Event], map: &PinMap) -> Vec<Latch> {
    let mut levels: HashMap<u32, bool> = HashMap::new();
    let mut latches = Vec::new();

    for event in events {
        let (id, level) = match *event {
            Event::Output(id, level) | Event::Level(id, level) => (id, level),
            _ => continue,
        };
        let enable_high = levels.get(&map.e).copied().unwrap_or(false);

        if id == map.e {
            if enable_high && !level {
                let mut nibble = 0u8;
                for (bit, signal) in Signal::DATA.iter().enumerate() {
                    if levels.get(&map.physical_id(*signal)).copied().unwrap_or(false) {
                        nibble |= 1 << bit;
                    }
                }
                latches.push(Latch {
                    rs: levels.get(&map.rs).copied().unwrap_or(false),
                    nibble,
                });
            }
        } else if enable_high {
            assert_eq!(
                levels.get(&id).copied().unwrap_or(false),
                level,
                "line {} changed while E was high",
                id
            );
        }

        levels.insert(id, level);
    }

    latches
}

/// Pairs latched nibbles back into bytes.
pub fn latched_bytes(events: &[Event], map: &PinMap) -> Vec<(bool, u8)> {
    latched(events, map)
        .chunks(2)
        .map(|pair| {
            assert_eq!(pair.len(), 2, "odd number of nibbles");
            assert_eq!(pair[0].rs, pair[1].rs, "RS changed between nibbles");
            (pair[0].rs, (pair[0].nibble << 4) | pair[1].nibble)
        })
        .collect()
}
