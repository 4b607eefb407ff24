pub mod params;
pub mod settings;

pub use params::{EnvParams, RunParams, SimParams};
pub use settings::{MovementSettings, TlSettings, TrafficLightSettings};
