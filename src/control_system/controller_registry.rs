use log::info;
use std::path::Path;

use crate::config::TlSettings;
use crate::control_system::timing_plan::TimingPlan;
use crate::control_system::traffic_light_controller::SignalController;
use crate::error::{ConfigError, ControllerError};
use crate::shared_data::{Observation, ObservationSize, SignalEvent};
use crate::simulation_engine::SimulatorConnection;

/// All signal controllers of a network, in a fixed order.
///
/// The registry owns no timing state. It forwards one action per controller
/// per tick and gathers the per-controller observation back.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: Vec<SignalController>,
}

impl ControllerRegistry {
    pub fn new(controllers: Vec<SignalController>) -> Self {
        Self { controllers }
    }

    /// Builds one controller per configured intersection, loading timing
    /// plans relative to `settings_dir`.
    pub fn from_settings(settings: &TlSettings, settings_dir: &Path) -> Result<Self, ConfigError> {
        let mut controllers = Vec::with_capacity(settings.traffic_lights.len());
        for (tl_id, tl_settings) in &settings.traffic_lights {
            let plan = TimingPlan::load(tl_id, &tl_settings.timing_plan_path(settings_dir))?;
            controllers.push(SignalController::from_settings(tl_id, tl_settings, plan)?);
        }
        Ok(Self::new(controllers))
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalController> {
        self.controllers.iter()
    }

    pub fn get(&self, tl_id: &str) -> Option<&SignalController> {
        self.controllers.iter().find(|c| c.tl_id() == tl_id)
    }

    /// Seeds every controller from the simulator's live signal strings.
    pub fn register<C: SimulatorConnection + ?Sized>(
        &mut self,
        connection: &C,
    ) -> Result<(), ControllerError> {
        for controller in &mut self.controllers {
            controller.sync(connection)?;
        }
        info!("registered {} traffic lights", self.controllers.len());
        Ok(())
    }

    /// Applies one action per controller for the tick at `sim_time`.
    pub fn update<C: SimulatorConnection + ?Sized>(
        &mut self,
        actions: &[usize],
        sim_time: f64,
        connection: &mut C,
    ) -> Result<Vec<bool>, ControllerError> {
        if actions.len() != self.controllers.len() {
            return Err(ConfigError::ActionCountMismatch {
                expected: self.controllers.len(),
                got: actions.len(),
            }
            .into());
        }
        let mut results = Vec::with_capacity(actions.len());
        for (controller, &action) in self.controllers.iter_mut().zip(actions) {
            results.push(controller.update_state(action, sim_time, connection)?);
        }
        Ok(results)
    }

    pub fn get_current_state(&self, sim_time: f64) -> Observation {
        Observation {
            states: self.controllers.iter().map(|c| c.get_current_state()).collect(),
            last_green_durations: self
                .controllers
                .iter()
                .map(|c| c.get_last_green_duration(sim_time))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        for controller in &mut self.controllers {
            controller.reset();
        }
        info!("reset {} traffic lights", self.controllers.len());
    }

    /// Action-space size of each controller.
    pub fn discrete_space_shape(&self) -> Vec<usize> {
        self.controllers
            .iter()
            .map(|c| c.action_space().len())
            .collect()
    }

    pub fn size(&self) -> ObservationSize {
        ObservationSize {
            state: self.discrete_space_shape(),
            last_time: self.controllers.len(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<SignalEvent> {
        self.controllers
            .iter_mut()
            .flat_map(|c| c.drain_events())
            .collect()
    }
}
