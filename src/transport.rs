// Copyright 2021 Locha Mesh Developers <contact@locha.io>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Serial transport
//!
//! The byte level capabilities the protocol engine needs from a serial
//! connection, and their implementation on top of the `serial` crate.

use std::{io, time::Duration};

use serial::SerialPort;

use crate::{Error, Result};

/// Read timeout used while polling for the power cycle.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(10);
/// Read timeout used once the MCU started sending a frame.
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// A serial connection to the MCU.
pub trait Transport {
    /// Read up to `buf.len()` bytes, returning fewer when the read timeout
    /// expires first.
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `data`.
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;

    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Switch the local side of the link to another baud rate.
    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()>;

    /// Discard any input received so far.
    fn clear_input(&mut self) -> io::Result<()>;
}

impl<P> Transport for P
where
    P: SerialPort,
{
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut count = 0;
        while count < buf.len() {
            match self.read(&mut buf[count..]) {
                Ok(0) => break,
                Ok(n) => count += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e),
            }
        }

        Ok(count)
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data)?;
        self.flush()
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        SerialPort::set_timeout(self, timeout)?;
        Ok(())
    }

    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()> {
        let rate = serial::BaudRate::from_speed(baud as usize);
        self.reconfigure(&|settings| settings.set_baud_rate(rate))?;
        Ok(())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        let mut scratch = [0u8; 64];
        loop {
            match self.read(&mut scratch) {
                Ok(0) => return Ok(()),
                Ok(n) => log::trace!("discarded {} stale bytes", n),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
}

/// Serial port settings expected by the bootloader: 8 data bits, even
/// parity and 1 stop bit.
pub fn port_settings(baud: u32) -> serial::PortSettings {
    serial::PortSettings {
        baud_rate: serial::BaudRate::from_speed(baud as usize),
        char_size: serial::CharSize::Bits8,
        parity: serial::Parity::ParityEven,
        stop_bits: serial::StopBits::Stop1,
        flow_control: serial::FlowControl::FlowNone,
    }
}

/// Open and configure the serial port at `path`.
pub fn open(path: &str, baud: u32) -> Result<serial::SystemPort> {
    let unavailable = |source: io::Error| Error::TransportUnavailable {
        port: path.to_owned(),
        source,
    };

    let mut port = serial::open(path).map_err(|e| unavailable(e.into()))?;
    port.configure(&port_settings(baud))
        .map_err(|e| unavailable(e.into()))?;
    SerialPort::set_timeout(&mut port, POLL_TIMEOUT)
        .map_err(|e| unavailable(e.into()))?;

    log::debug!("opened `{}` at {} baud", path, baud);

    Ok(port)
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;

    use super::*;

    /// Serial port handing out scripted read results, one per call.
    /// Reads time out once the script is exhausted.
    struct DummySerialPort {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
        flushed: bool,
        timeout: Duration,
    }

    impl DummySerialPort {
        fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            DummySerialPort {
                reads: reads.into(),
                written: Vec::new(),
                flushed: false,
                timeout: Duration::from_millis(0),
            }
        }
    }

    impl SerialPort for DummySerialPort {
        fn timeout(&self) -> Duration {
            self.timeout
        }
        fn set_timeout(&mut self, timeout: Duration) -> serial::Result<()> {
            self.timeout = timeout;
            Ok(())
        }
        fn configure(
            &mut self,
            _settings: &serial::PortSettings,
        ) -> serial::Result<()> {
            unreachable!()
        }
        fn reconfigure(
            &mut self,
            _setup: &dyn Fn(
                &mut dyn serial::SerialPortSettings,
            ) -> serial::Result<()>,
        ) -> serial::Result<()> {
            unreachable!()
        }
        fn set_rts(&mut self, _level: bool) -> serial::Result<()> {
            unreachable!()
        }
        fn set_dtr(&mut self, _level: bool) -> serial::Result<()> {
            unreachable!()
        }
        fn read_cts(&mut self) -> serial::Result<bool> {
            unreachable!()
        }
        fn read_dsr(&mut self) -> serial::Result<bool> {
            unreachable!()
        }
        fn read_ri(&mut self) -> serial::Result<bool> {
            unreachable!()
        }
        fn read_cd(&mut self) -> serial::Result<bool> {
            unreachable!()
        }
    }

    impl io::Read for DummySerialPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(mut data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    if n < data.len() {
                        self.reads.push_front(Ok(data.split_off(n)));
                    }
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
            }
        }
    }

    impl io::Write for DummySerialPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            self.flushed = true;
            Ok(())
        }
    }

    #[test]
    fn test_read_bytes_joins_partial_reads() {
        let mut port = DummySerialPort::new(vec![Ok(vec![1, 2]), Ok(vec![3])]);
        let mut buf = [0u8; 8];
        assert_eq!(port.read_bytes(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_read_bytes_stops_when_full() {
        let mut port =
            DummySerialPort::new(vec![Ok(vec![1, 2]), Ok(vec![3, 4, 5])]);
        let mut buf = [0u8; 4];
        assert_eq!(port.read_bytes(&mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);

        let mut buf = [0u8; 4];
        assert_eq!(port.read_bytes(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 5);
    }

    #[test]
    fn test_read_bytes_timeout() {
        let mut port = DummySerialPort::new(Vec::new());
        let mut buf = [0u8; 4];
        assert_eq!(port.read_bytes(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_bytes_error() {
        let mut port = DummySerialPort::new(vec![
            Ok(vec![1]),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")),
        ]);
        let mut buf = [0u8; 4];
        let err = port.read_bytes(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_clear_input() {
        let mut port = DummySerialPort::new(vec![
            Ok(vec![0xAA; 100]),
            Ok(vec![0x46, 0xB9]),
            Ok(vec![0x16]),
        ]);
        port.clear_input().unwrap();
        assert!(port.reads.is_empty());

        // Nothing pending.
        port.clear_input().unwrap();
    }

    #[test]
    fn test_write_bytes_and_timeout() {
        let mut port = DummySerialPort::new(Vec::new());
        port.write_bytes(&[0x7F, 0x7F]).unwrap();
        assert_eq!(port.written, [0x7F, 0x7F]);
        assert!(port.flushed);

        port.set_read_timeout(POLL_TIMEOUT).unwrap();
        assert_eq!(SerialPort::timeout(&port), POLL_TIMEOUT);
    }

    #[test]
    fn test_port_settings() {
        let settings = port_settings(115200);
        assert_eq!(settings.baud_rate, serial::BaudRate::Baud115200);
        assert_eq!(settings.char_size, serial::CharSize::Bits8);
        assert_eq!(settings.parity, serial::Parity::ParityEven);
        assert_eq!(settings.stop_bits, serial::StopBits::Stop1);

        let settings = port_settings(57600);
        assert_eq!(settings.baud_rate, serial::BaudRate::Baud57600);
    }
}
