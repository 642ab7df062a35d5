//! # Joystick Client
//!
//! Sends joystick axes to the excavator, one datagram per cycle. Nothing is acknowledged, a lost
//! datagram is replaced by the next one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{net::{SocketAddr, UdpSocket}, time::Duration};
use comms_if::{eqpt::exc::JsAxes, net::{self, NetError, NetParams}};
use log::trace;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct JsClient {
    socket: UdpSocket,

    target: SocketAddr,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum JsClientError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not send to {0}: {1}")]
    SendError(SocketAddr, std::io::Error),

    #[error("Send period must be a positive number of seconds which fits a duration, got {0} s")]
    InvalidPeriod(f64),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Time between datagrams.
pub fn send_period(period_s: f64) -> Result<Duration, JsClientError> {
    match Duration::try_from_secs_f64(period_s) {
        Ok(d) if d > Duration::ZERO => Ok(d),
        _ => Err(JsClientError::InvalidPeriod(period_s))
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JsClient {
    /// Create a client sending to the target in the parameters, or to `target` if given.
    pub fn new(params: &NetParams, target: Option<&str>) -> Result<Self, JsClientError> {
        let (socket, target) = net::bind_sender(
            &params.js_sender_bind_endpoint,
            target.unwrap_or(&params.js_target_endpoint)
        ).map_err(JsClientError::SocketError)?;

        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send one set of axes.
    pub fn send(&self, axes: &JsAxes) -> Result<(), JsClientError> {
        let msg = axes.to_wire();
        trace!("Sending {}", msg);

        self.socket
            .send_to(msg.as_bytes(), self.target)
            .map_err(|e| JsClientError::SendError(self.target, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_send_period() {
        assert_eq!(send_period(0.05).unwrap(), Duration::from_millis(50));

        for bad in &[0.0, -0.05, f64::NAN, f64::INFINITY, 1e20] {
            assert!(matches!(send_period(*bad), Err(JsClientError::InvalidPeriod(_))));
        }
    }

    #[test]
    fn test_send() {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
        let rx_addr = rx.local_addr().unwrap().to_string();

        let params = NetParams {
            js_bind_endpoint: String::from("0.0.0.0:9999"),
            js_target_endpoint: String::from("192.168.10.2:9999"),
            js_sender_bind_endpoint: String::from("127.0.0.1:0"),
        };

        // The override wins over the parameter file
        let client = JsClient::new(&params, Some(&rx_addr)).unwrap();
        assert_eq!(client.target().to_string(), rx_addr);

        client.send(&JsAxes([0.0, -0.25, 0.5, 1.0])).unwrap();

        let mut buf = [0u8; 64];
        let (n, _) = rx.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"[0.0, -0.25, 0.5, 1.0]");
    }
}
