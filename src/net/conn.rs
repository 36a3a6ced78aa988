//! TCP connection handle implementing the core client seam.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::client::ClientConn;

/// Read buffer size for descriptor framing.
const READ_BUF_LEN: usize = 256;

/// Cheaply cloneable handle to an accepted client socket.
///
/// Reading uses drain-until-idle framing: one blocking read, then
/// nonblocking reads until the socket reports no more buffered data. This is
/// the wire compatibility contract: it requires the sender to write the
/// whole payload in a single burst and is fragile under fragmentation, so a
/// delimiter- or length-framed protocol should replace it if the wire format
/// ever changes.
#[derive(Clone)]
pub struct Connection {
    stream: Arc<Mutex<TcpStream>>,
    peer: SocketAddr,
}

impl Connection {
    /// Wrap an accepted stream.
    ///
    /// # Errors
    ///
    /// Fails if the peer address cannot be read from the socket.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let peer = stream.peer_addr()?;
        Ok(Self {
            stream: Arc::new(Mutex::new(stream)),
            peer,
        })
    }

    /// Remote address of the client.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl ClientConn for Connection {
    fn read_payload(&self) -> io::Result<String> {
        let stream = self.stream.lock();
        let mut raw: &TcpStream = &stream;
        let mut buf = [0_u8; READ_BUF_LEN];
        let mut data = Vec::new();

        let n = raw.read(&mut buf)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "client closed before sending a payload",
            ));
        }
        data.extend_from_slice(&buf[..n]);

        // Drain whatever else is already buffered without blocking.
        raw.set_nonblocking(true)?;
        let drained = loop {
            match raw.read(&mut buf) {
                Ok(0) => break Ok(()),
                Ok(n) => data.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        raw.set_nonblocking(false)?;
        drained?;

        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn send_text(&self, text: &str) -> io::Result<()> {
        let stream = self.stream.lock();
        let mut raw: &TcpStream = &stream;
        raw.write_all(text.as_bytes())
    }

    fn close(&self) -> io::Result<()> {
        self.stream.lock().shutdown(Shutdown::Both)
    }
}
