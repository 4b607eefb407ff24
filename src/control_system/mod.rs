pub mod controller_registry;
pub mod dwell_timer;
pub mod light_heads;
pub mod phase_catalog;
pub mod timing_plan;
pub mod traffic_light_controller;

pub use controller_registry::ControllerRegistry;
pub use dwell_timer::{Color, DwellTimer, MinimumTimes};
pub use phase_catalog::{ActionSpace, Movement, PhaseCombination};
pub use timing_plan::TimingPlan;
pub use traffic_light_controller::{ControllerStatus, SignalController, Task};
