//! Shared test helpers: a scripted in-memory client connection and polling
//! utilities.

#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use taskyard::core::ClientConn;

/// Scripted in-memory client connection recording everything written to it,
/// plus when it was read and closed.
#[derive(Clone)]
pub struct MockConn {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    payload: Option<String>,
    fail_read: bool,
    writes: Vec<String>,
    closed: bool,
    read_at: Option<Instant>,
    closed_at: Option<Instant>,
}

impl MockConn {
    /// A connection whose next read yields `payload`.
    pub fn with_payload(payload: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                payload: Some(payload.to_string()),
                ..MockState::default()
            })),
        }
    }

    /// A connection whose reads fail with a scripted I/O error.
    pub fn failing() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                fail_read: true,
                ..MockState::default()
            })),
        }
    }

    /// Everything written so far, concatenated.
    pub fn response(&self) -> String {
        self.inner.lock().writes.concat()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn read_at(&self) -> Option<Instant> {
        self.inner.lock().read_at
    }

    pub fn closed_at(&self) -> Option<Instant> {
        self.inner.lock().closed_at
    }
}

impl ClientConn for MockConn {
    fn read_payload(&self) -> io::Result<String> {
        let mut state = self.inner.lock();
        if state.read_at.is_none() {
            state.read_at = Some(Instant::now());
        }
        if state.fail_read {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "scripted read failure",
            ));
        }
        state
            .payload
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "payload already consumed"))
    }

    fn send_text(&self, text: &str) -> io::Result<()> {
        self.inner.lock().writes.push(text.to_string());
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        let mut state = self.inner.lock();
        state.closed = true;
        if state.closed_at.is_none() {
            state.closed_at = Some(Instant::now());
        }
        Ok(())
    }
}

/// Poll `cond` every few milliseconds until it holds or `timeout` expires.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Descriptor JSON in the wire format the server parses.
pub fn descriptor_json(count: u32, chance: u32, min_ms: u64, max_ms: u64) -> String {
    format!(
        r#"{{"count":{count},"interruption_chance":{chance},"min_duration_ms":{min_ms},"max_duration_ms":{max_ms}}}"#
    )
}
