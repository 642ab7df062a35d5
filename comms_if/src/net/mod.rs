//! # Network Module
//!
//! This module provides the network parameters and socket setup shared by the joystick sender and
//! the excavator. Joystick demands travel over UDP: a lost or late datagram is simply superseded
//! by the next one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Largest datagram the receiver will read. A four axis list is well under this.
pub const MAX_DATAGRAM_LEN: usize = 1024;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters, normally loaded from `net.toml`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NetParams {
    /// Endpoint the excavator binds to and receives joystick demands on, e.g. `0.0.0.0:9999`
    pub js_bind_endpoint: String,

    /// Endpoint the joystick sender transmits to, e.g. `192.168.10.2:9999`
    pub js_target_endpoint: String,

    /// Local endpoint the joystick sender binds to before transmitting
    #[serde(default = "default_sender_bind")]
    pub js_sender_bind_endpoint: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Could not resolve the endpoint \"{0}\": {1}")]
    ResolveError(String, std::io::Error),

    #[error("The endpoint \"{0}\" did not resolve to any address")]
    NoAddress(String),

    #[error("Could not bind a socket to {0}: {1}")]
    BindError(SocketAddr, std::io::Error),

    #[error("Could not configure the socket: {0}")]
    SocketOptionError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Resolve an endpoint string into the first socket address it refers to.
pub fn resolve_endpoint(endpoint: &str) -> Result<SocketAddr, NetError> {
    endpoint
        .to_socket_addrs()
        .map_err(|e| NetError::ResolveError(endpoint.to_string(), e))?
        .next()
        .ok_or_else(|| NetError::NoAddress(endpoint.to_string()))
}

/// Bind a non-blocking UDP socket for receiving demands.
///
/// Non-blocking so the control loop can drain every pending datagram each cycle and never waits on
/// the network.
pub fn bind_receiver(endpoint: &str) -> Result<UdpSocket, NetError> {
    let addr = resolve_endpoint(endpoint)?;

    let socket = UdpSocket::bind(addr)
        .map_err(|e| NetError::BindError(addr, e))?;
    socket
        .set_nonblocking(true)
        .map_err(NetError::SocketOptionError)?;

    Ok(socket)
}

/// Bind a UDP socket for sending demands to the given target.
///
/// Returns the socket and the resolved target address.
pub fn bind_sender(
    bind_endpoint: &str,
    target_endpoint: &str
) -> Result<(UdpSocket, SocketAddr), NetError> {
    let bind_addr = resolve_endpoint(bind_endpoint)?;
    let target = resolve_endpoint(target_endpoint)?;

    let socket = UdpSocket::bind(bind_addr)
        .map_err(|e| NetError::BindError(bind_addr, e))?;

    Ok((socket, target))
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_sender_bind() -> String {
    String::from("0.0.0.0:0")
}
