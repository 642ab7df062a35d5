//! Module interfaces
//!
//! A cyclic processing module in `exc_exec`, such as `BlendCtrl`, is initialised once from the
//! exec parameters and then processed every control cycle.

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The module's internal state.
pub trait State {
    /// What the module is configured from
    type InitData;
    type InitError;

    /// This cycle's inputs, usually gathered from the data store
    type InputData;
    /// This cycle's result
    type OutputData;
    /// Internal values worth logging alongside the output
    type StatusReport;
    type ProcError;

    /// Configure the module. Called once before the first cycle.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError>;

    /// Process one cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
