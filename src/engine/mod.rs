pub mod environment;

pub use environment::{SignalEnv, StepOutcome};
