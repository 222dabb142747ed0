//! Scripted in-memory transport

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;

use teleshake::Transport;
use teleshake_transport::{Error, Result};

/// How the fake device answers one telegram
#[derive(Debug, Clone)]
pub enum Reply {
    /// Echo the request with the dirty bit cleared
    Echo,
    /// Say nothing
    Silent,
    /// Answer with these exact bytes
    Bytes(Vec<u8>),
}

#[derive(Debug, Default)]
struct State {
    connected: bool,
    refuse_connect: bool,
    fail_writes: bool,
    silent_by_default: bool,
    chunk: Option<usize>,
    sent: Vec<Vec<u8>>,
    rx: BytesMut,
    script: VecDeque<Reply>,
}

/// Clones share state, so a test can keep one handle after boxing another
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<State>>,
}

impl FakeTransport {
    /// Echoes every telegram as executed
    pub fn new() -> Self {
        Self::default()
    }

    /// Never answers unless scripted
    pub fn silent() -> Self {
        let fake = Self::default();
        fake.state.lock().silent_by_default = true;
        fake
    }

    pub fn refusing() -> Self {
        let fake = Self::default();
        fake.state.lock().refuse_connect = true;
        fake
    }

    /// Queue the answer for the next unscripted telegram
    pub fn script(&self, reply: Reply) -> &Self {
        self.state.lock().script.push_back(reply);
        self
    }

    /// Put bytes on the line without a request, e.g. a reply arriving late
    pub fn inject(&self, bytes: &[u8]) {
        self.state.lock().rx.extend_from_slice(bytes);
    }

    /// Deliver at most `n` bytes per read
    pub fn trickle(&self, n: usize) {
        self.state.lock().chunk = Some(n);
    }

    pub fn fail_writes(&self) {
        self.state.lock().fail_writes = true;
    }

    pub fn boxed(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().sent.clone()
    }

    /// Command byte of every telegram sent so far
    pub fn commands(&self) -> Vec<u8> {
        self.state.lock().sent.iter().map(|t| t[1]).collect()
    }

    pub fn count(&self, command: u8) -> usize {
        self.commands().iter().filter(|&&c| c == command).count()
    }
}

/// Response a well-behaved device gives to `request`
pub fn executed(request: &[u8]) -> Vec<u8> {
    let mut frame = request.to_vec();
    frame[0] &= !0x20;
    frame[5] = frame[..5].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    frame
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.refuse_connect {
            return Err(Error::Open {
                port: "FAKE".into(),
                source: tokio_serial::Error::new(tokio_serial::ErrorKind::NoDevice, "no such port"),
            });
        }
        state.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.state.lock().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write failed",
            )));
        }
        state.sent.push(data.to_vec());

        let default = if state.silent_by_default {
            Reply::Silent
        } else {
            Reply::Echo
        };
        match state.script.pop_front().unwrap_or(default) {
            Reply::Echo if data.len() == 6 => {
                let frame = executed(data);
                state.rx.extend_from_slice(&frame);
            }
            Reply::Echo | Reply::Silent => {}
            Reply::Bytes(bytes) => state.rx.extend_from_slice(&bytes),
        }
        Ok(())
    }

    async fn read_available(&mut self) -> Result<BytesMut> {
        let mut state = self.state.lock();
        let n = state.chunk.unwrap_or(usize::MAX).min(state.rx.len());
        Ok(state.rx.split_to(n))
    }

    fn port_name(&self) -> String {
        "FAKE".to_string()
    }
}
