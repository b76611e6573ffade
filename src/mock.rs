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

//! Scripted in-memory transport used by the unit tests.

use std::{cell::RefCell, collections::VecDeque, io, rc::Rc, time::Duration};

use crate::transport::Transport;

#[derive(Debug, Default)]
pub struct MockTransport {
    /// Bytes available for reading.
    pub rx: VecDeque<u8>,
    /// Bytes made available after each write, in order. `None` means the
    /// MCU stays silent for that write.
    pub replies: VecDeque<Option<Vec<u8>>>,
    /// Every buffer written. Shared so it can be inspected after the
    /// transport was dropped with a failed session.
    pub log: Rc<RefCell<Vec<Vec<u8>>>>,
    /// Every read timeout set, with the number of writes done before.
    pub timeouts: Vec<(usize, Duration)>,
    pub baud: Option<u32>,
    /// Baud rate in effect for each write.
    pub write_bauds: Vec<Option<u32>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `data` readable right away.
    pub fn queue(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// Make `data` readable after the next unanswered write.
    pub fn reply(&mut self, data: Vec<u8>) {
        self.replies.push_back(Some(data));
    }

    /// Don't answer the next `count` writes.
    pub fn silence(&mut self, count: usize) {
        self.replies.extend((0..count).map(|_| None));
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.log.borrow().clone()
    }

    /// Read timeout currently in effect.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeouts.last().map(|&(_, timeout)| timeout)
    }

    pub fn written_bytes(&self) -> usize {
        self.log.borrow().iter().map(Vec::len).sum()
    }
}

impl Transport for MockTransport {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }

        Ok(n)
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.log.borrow_mut().push(data.to_vec());
        self.write_bauds.push(self.baud);
        if let Some(Some(reply)) = self.replies.pop_front() {
            self.rx.extend(reply);
        }

        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        let writes = self.log.borrow().len();
        self.timeouts.push((writes, timeout));
        Ok(())
    }

    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()> {
        self.baud = Some(baud);
        Ok(())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.rx.clear();
        Ok(())
    }
}
