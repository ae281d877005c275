//! Byte streams written to the display.
//!
//! [DataSink] prints every byte, except line feeds which move the cursor to the second line.
//! [CommandSink] sends every byte as an instruction.
use crate::lcd::hd44780::driver::HD44780Driver;
use crate::GpioError;
use log::{debug, warn};
use std::io::{self, ErrorKind, Read, Write};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum StreamError {
    /// The source could not be read. Bytes sent before the failure stay on the display.
    #[error("failed to copy bytes from source: {0}")]
    TransportCopy(ErrorKind),
    #[error(transparent)]
    Gpio(#[from] GpioError),
}

/// How a single byte maps onto the controller.
trait ByteMapping {
    fn put(&mut self, byte: u8) -> Result<(), GpioError>;
}

/// Copies `source` byte by byte into `sink` until end of input.
///
/// Returns the amount of bytes consumed. A read error aborts the remaining bytes.
fn copy_from<S: ByteMapping, R: Read>(sink: &mut S, mut source: R) -> Result<usize, StreamError> {
    let mut count = 0;
    let mut byte = [0u8; 1];

    loop {
        match source.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                sink.put(byte[0])?;
                count += 1;
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!("Copy aborted after {} bytes: {}", count, err);
                return Err(StreamError::TransportCopy(err.kind()));
            }
        }
    }

    debug!("Copied {} bytes", count);
    Ok(count)
}

/// Sends as much of `buf` as the driver takes.
///
/// A failure after the first byte is reported as a short write, the next call surfaces it.
fn put_all<S: ByteMapping>(sink: &mut S, buf: &[u8]) -> io::Result<usize> {
    for (sent, &byte) in buf.iter().enumerate() {
        if let Err(err) = sink.put(byte) {
            if sent == 0 {
                return Err(io::Error::other(err));
            }
            warn!("Short write after {} bytes: {}", sent, err);
            return Ok(sent);
        }
    }
    Ok(buf.len())
}

/// Display text. `\n` jumps to the start of the second line.
#[derive(Debug)]
pub struct DataSink<T: HD44780Driver> {
    driver: T,
}

impl<T: HD44780Driver> DataSink<T> {
    pub fn new(driver: T) -> Self {
        DataSink { driver }
    }

    pub fn write_from<R: Read>(&mut self, source: R) -> Result<usize, StreamError> {
        copy_from(self, source)
    }

    pub fn into_inner(self) -> T {
        self.driver
    }
}

impl<T: HD44780Driver> ByteMapping for DataSink<T> {
    fn put(&mut self, byte: u8) -> Result<(), GpioError> {
        if byte == b'\n' {
            self.driver.next_line()
        } else {
            self.driver.send_data(byte)
        }
    }
}

impl<T: HD44780Driver> Write for DataSink<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        put_all(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Raw instruction bytes.
#[derive(Debug)]
pub struct CommandSink<T: HD44780Driver> {
    driver: T,
}

impl<T: HD44780Driver> CommandSink<T> {
    pub fn new(driver: T) -> Self {
        CommandSink { driver }
    }

    pub fn write_from<R: Read>(&mut self, source: R) -> Result<usize, StreamError> {
        copy_from(self, source)
    }

    pub fn into_inner(self) -> T {
        self.driver
    }
}

impl<T: HD44780Driver> ByteMapping for CommandSink<T> {
    fn put(&mut self, byte: u8) -> Result<(), GpioError> {
        self.driver.send_command(byte)
    }
}

impl<T: HD44780Driver> Write for CommandSink<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        put_all(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
