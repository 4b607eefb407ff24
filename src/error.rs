// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::control_system::dwell_timer::Color;

/// Anything that means the controller and the intersection it drives have
/// diverged. Always surfaced to the caller.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("movement {0} is not a valid movement (expected 1-8)")]
    UnknownMovement(u8),
    #[error("traffic light {tl_id}: movement {movement} has no lane details")]
    MissingMovementDetails { tl_id: String, movement: u8 },
    #[error("traffic light {0}: movement list yields no legal phase combination")]
    EmptyActionSpace(String),
    #[error("traffic light {tl_id}: minimum {color:?} time {value} must be finite and non-negative")]
    InvalidDwellTime { tl_id: String, color: Color, value: f64 },
    #[error("traffic light {tl_id}: signal string {signal:?} is shorter than the configured heads")]
    SignalStringTooShort { tl_id: String, signal: String },
    #[error("traffic light {tl_id}: signal string {signal:?} decodes to {movements:?}, which is not in the action space")]
    UnknownSignalState {
        tl_id: String,
        signal: String,
        movements: Vec<u8>,
    },
    #[error("traffic light {tl_id}: timing plan has no {color:?} phase for movements {movements:?}")]
    PhaseNotInPlan {
        tl_id: String,
        movements: Vec<u8>,
        color: Color,
    },
    #[error("timing plan phase {index} has a malformed name {name:?}")]
    MalformedPhaseName { index: usize, name: String },
    #[error("run parameter {name} = {value} is out of range ({expected})")]
    InvalidRunParam {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("expected {expected} actions, got {got}")]
    ActionCountMismatch { expected: usize, got: usize },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid timing plan: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Failures reported by the simulator connection.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("unknown traffic light {0}")]
    UnknownTrafficLight(String),
    #[error("traffic light {tl_id} has no phase {phase_index}")]
    PhaseOutOfRange { tl_id: String, phase_index: usize },
    #[error("simulation step {0} must be finite and positive")]
    InvalidStep(f64),
    #[error("simulator connection closed")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("simulator write failed: {0}")]
    Simulator(#[from] SimulatorError),
    #[error("traffic light {tl_id}: simulation time went backwards ({sim_time} < {last_changed_time})")]
    ClockRegression {
        tl_id: String,
        sim_time: f64,
        last_changed_time: f64,
    },
}
