// src/simulation_engine/connection.rs
use crate::error::SimulatorError;

/// The slice of a traffic simulator the controllers talk to.
pub trait SimulatorConnection {
    /// Current signal-head string of an intersection, one character per head.
    fn signal_string(&self, tl_id: &str) -> Result<String, SimulatorError>;

    /// Switches an intersection to a phase of its timing plan.
    fn set_signal_phase(&mut self, tl_id: &str, phase_index: usize) -> Result<(), SimulatorError>;

    fn sim_time(&self) -> f64;

    /// Advances the simulation one step and returns the new time.
    fn simulation_step(&mut self) -> Result<f64, SimulatorError>;

    fn reset_simulation(&mut self) -> Result<(), SimulatorError>;
}
