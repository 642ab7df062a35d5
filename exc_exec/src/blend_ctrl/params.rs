//! Parameters structure for BlendCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the blending factor is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlendMode {
    /// No blending, alpha is always zero.
    Off,

    /// Alpha fixed for the whole session.
    Static {
        alpha: f64
    },

    /// Alpha estimated every cycle by an [`AlphaProvider`](super::AlphaProvider).
    Dynamic,
}

impl Default for BlendMode {
    fn default() -> Self {
        BlendMode::Off
    }
}
