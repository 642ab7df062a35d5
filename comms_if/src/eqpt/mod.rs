//! # Equipment Interface
//!
//! This module defines the interface structures which are sent between the joystick sender and the
//! excavator.

/// Excavator joints and the joystick axes datagram
pub mod exc;
