//! # Communications interface crate.
//!
//! Provides the interfaces shared by the joystick sender and the excavator
//! executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Demand definitions for equipment (the excavator joints and the joystick datagram)
pub mod eqpt;

/// Network module
pub mod net;
