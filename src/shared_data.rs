// src/shared_data.rs

use crate::control_system::dwell_timer::Color;
use serde::{Deserialize, Serialize};

/// What the agent sees of the signals after each tick, one entry per
/// controller in registry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Action-space index of each controller's current combination.
    pub states: Vec<usize>,
    /// Simulated seconds since each controller last turned green.
    pub last_green_durations: Vec<f64>,
}

/// Discrete sizes of the observation components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSize {
    pub state: Vec<usize>,
    pub last_time: usize,
}

/// A committed task-group: the heads of `movements` went to `color`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub sim_time: f64,
    pub tl_id: String,
    pub color: Color,
    /// Movements joined with `+`, e.g. `2+6`.
    pub movements: String,
    pub phase_index: usize,
}
