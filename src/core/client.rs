//! Client connection seam between the core and the transport layer.

use std::io;

/// Shared handle to a submitting client's connection.
///
/// Implementations are cheaply cloneable handles over a shared socket: once a
/// connection is bound as the active client it is held by both the admission
/// dispatcher (which read its descriptor) and the scheduler (the sole writer
/// of completion data). Tests substitute scripted in-memory handles.
pub trait ClientConn: Clone + Send + 'static {
    /// Read one request payload from the client, blocking until data arrives.
    ///
    /// # Errors
    ///
    /// Propagates transport-level read failures, including a client that
    /// disconnects before sending anything.
    fn read_payload(&self) -> io::Result<String>;

    /// Write a text fragment to the client.
    ///
    /// # Errors
    ///
    /// Propagates transport-level write failures.
    fn send_text(&self, text: &str) -> io::Result<()>;

    /// Shut down and close the connection.
    ///
    /// # Errors
    ///
    /// Propagates transport-level shutdown failures.
    fn close(&self) -> io::Result<()>;
}

/// One-shot callback fired when a batch completes, invoked with the active
/// client, the number of tasks accounted for, and the elapsed milliseconds.
pub type CompletionCallback<C> = Box<dyn FnOnce(C, u64, u64) + Send + 'static>;
