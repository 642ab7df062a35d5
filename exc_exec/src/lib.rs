//! # Excavator library.
//!
//! This library allows other crates in the workspace to access items defined inside the excavator
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Autonomous controller interface - produces joint commands from the measured joint positions
pub mod auto_ctrl;

/// Blending control module - shares control between the operator and the autonomous controller
pub mod blend_ctrl;

/// Data logger - writes one CSV row per control cycle
pub mod data_logger;

/// Data store - everything produced during one control cycle
pub mod data_store;

/// Excavator - owns the valve servos and joint sensors
pub mod excavator;

/// Joystick command parsing - converts joystick datagrams into joint commands
pub mod js_cmd;

/// Joystick server - receives joystick datagrams from the sender
pub mod js_server;

/// Measurement - converts raw sensor readings into joint positions
pub mod meas;

/// Parameters for the excavator executable
pub mod params;

/// Servo control - drives the PWM outputs of the hydraulic valves
pub mod servo_ctrl;
