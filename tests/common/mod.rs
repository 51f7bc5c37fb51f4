#![allow(dead_code)]

use mercury236_lib::protocol::crc16;
use mercury236_lib::session::{Channel, Session, SessionConfig};
use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

/// In-memory meter: every written frame consumes the next scripted reply,
/// `None` meaning the meter stays silent.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    pub replies: VecDeque<Option<Vec<u8>>>,
    pub written: Vec<Vec<u8>>,
    pub discarded: usize,
    /// Largest number of bytes handed out per read, 0 for unlimited.
    pub chunk_size: usize,
    /// Time every read takes before it hands out data.
    pub read_delay: Duration,
    pub write_times: Vec<Instant>,
    pub reads: Vec<ReadCall>,
    pending: Vec<u8>,
}

/// One `read_timeout` call as seen by the meter.
#[derive(Debug, Clone, Copy)]
pub struct ReadCall {
    /// Index of the frame written before this read.
    pub after_write: usize,
    pub at: Instant,
    pub timeout: Duration,
}

impl ScriptedChannel {
    pub fn new<I: IntoIterator<Item = Option<Vec<u8>>>>(replies: I) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn commands(&self) -> Vec<u8> {
        self.written.iter().map(|frame| frame[1]).collect()
    }
}

impl Channel for ScriptedChannel {
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        self.written.push(buffer.to_vec());
        self.write_times.push(Instant::now());
        self.pending = self.replies.pop_front().flatten().unwrap_or_default();
        Ok(())
    }

    fn read_timeout(&mut self, buffer: &mut [u8], timeout: Duration) -> io::Result<usize> {
        self.reads.push(ReadCall {
            after_write: self.written.len().saturating_sub(1),
            at: Instant::now(),
            timeout,
        });
        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay);
        }
        let mut n = self.pending.len().min(buffer.len());
        if self.chunk_size > 0 {
            n = n.min(self.chunk_size);
        }
        buffer[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.discarded += 1;
        Ok(())
    }
}

/// Appends the CRC trailer to `bytes`.
pub fn frame(bytes: &[u8]) -> Vec<u8> {
    let mut buffer = bytes.to_vec();
    buffer.extend_from_slice(&crc16(bytes).to_le_bytes());
    buffer
}

pub fn status(code: u8) -> Option<Vec<u8>> {
    Some(frame(&[0x00, code]))
}

pub fn ok() -> Option<Vec<u8>> {
    status(0x00)
}

pub fn reply(payload: &[u8]) -> Option<Vec<u8>> {
    let mut bytes = vec![0x00];
    bytes.extend_from_slice(payload);
    Some(frame(&bytes))
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        settle_delay: Duration::ZERO,
        channel_timeout: Duration::from_millis(10),
        ..Default::default()
    }
}

pub fn session<I: IntoIterator<Item = Option<Vec<u8>>>>(replies: I) -> Session<ScriptedChannel> {
    Session::new(ScriptedChannel::new(replies), test_config())
}
