//! # Joystick Server Module
//!
//! This module abstracts over the networking side of the excavator executable. The server listens
//! for joystick datagrams from the sender and hands the control loop the most recent one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{io::ErrorKind, net::{SocketAddr, UdpSocket}};
use comms_if::net::{self, NetError, NetParams, MAX_DATAGRAM_LEN};
use log::{trace, warn};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the excavator executable.
///
/// The server never blocks: each call to [`JsServer::get_demands`] reads every datagram which has
/// arrived since the last call and keeps only the freshest.
pub struct JsServer {
    socket: UdpSocket,

    buf: Vec<u8>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`JsServer`]
#[derive(thiserror::Error, Debug)]
pub enum JsServerError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not get the local address of the socket: {0}")]
    AddrError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JsServer {
    /// Create a new instance of the joystick server, bound to the endpoint in the parameters.
    ///
    /// This function does not wait for the sender before returning.
    pub fn new(params: &NetParams) -> Result<Self, JsServerError> {
        Self::bind(&params.js_bind_endpoint)
    }

    /// Create a server bound to the given endpoint.
    pub fn bind(endpoint: &str) -> Result<Self, JsServerError> {
        let socket = net::bind_receiver(endpoint)?;

        Ok(Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM_LEN],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, JsServerError> {
        self.socket.local_addr().map_err(JsServerError::AddrError)
    }

    /// Retrieve the freshest joystick datagram received since the last call.
    ///
    /// `None` is returned if nothing has arrived, in which case the caller should hold the current
    /// commands.
    pub fn get_demands(&mut self) -> Option<String> {
        let mut latest = None;
        let mut num_read = 0usize;

        loop {
            match self.socket.recv_from(&mut self.buf) {
                Ok((n, _)) => {
                    num_read += 1;
                    latest = Some(String::from_utf8_lossy(&self.buf[..n]).into_owned());
                },
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Could not read from the joystick socket: {}", e);
                    break
                }
            }
        }

        if num_read > 1 {
            trace!("Discarded {} stale joystick datagrams", num_read - 1);
        }

        latest
    }
}

impl From<NetError> for JsServerError {
    fn from(e: NetError) -> Self {
        JsServerError::SocketError(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{thread, time::Duration};

    #[test]
    fn test_keeps_freshest() {
        let mut server = JsServer::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();

        assert_eq!(server.get_demands(), None);

        let tx = UdpSocket::bind("127.0.0.1:0").unwrap();
        tx.send_to(b"[0.1, 0.0, 0.0, 0.0]", addr).unwrap();
        tx.send_to(b"[0.2, 0.0, 0.0, 0.0]", addr).unwrap();
        tx.send_to(b"[0.3, 0.0, 0.0, 0.0]", addr).unwrap();

        // Loopback delivery is quick but not instant
        thread::sleep(Duration::from_millis(50));

        assert_eq!(server.get_demands().as_deref(), Some("[0.3, 0.0, 0.0, 0.0]"));

        // Everything was drained
        assert_eq!(server.get_demands(), None);
    }
}
