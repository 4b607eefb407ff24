// simulation.rs
use crate::control_system::timing_plan::TimingPlan;
use crate::error::SimulatorError;
use crate::simulation_engine::connection::SimulatorConnection;

use log::debug;
use std::collections::BTreeMap;

/// Signal state of one intersection inside the simulated network.
#[derive(Debug, Clone)]
struct SimulatedLight {
    /// Head string of every timing-plan phase, by phase index.
    phase_states: Vec<String>,
    initial_phase: usize,
    phase: usize,
    /// (time, phase index) of every write.
    history: Vec<(f64, usize)>,
}

/// In-process stand-in for an external traffic simulator. Only signal state
/// and the clock are modelled; no vehicles move.
#[derive(Debug, Clone)]
pub struct SimulatedNetwork {
    sim_step: f64,
    start_time: f64,
    time: f64,
    lights: BTreeMap<String, SimulatedLight>,
    connected: bool,
}

impl SimulatedNetwork {
    /// `sim_step` must be finite and positive or the clock never advances.
    pub fn new(sim_step: f64) -> Result<Self, SimulatorError> {
        if !sim_step.is_finite() || sim_step <= 0.0 {
            return Err(SimulatorError::InvalidStep(sim_step));
        }
        Ok(Self {
            sim_step,
            start_time: 0.0,
            time: 0.0,
            lights: BTreeMap::new(),
            connected: true,
        })
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self.time = start_time;
        self
    }

    /// Adds an intersection driven by `plan`, showing `initial_phase`.
    pub fn add_traffic_light(
        &mut self,
        plan: &TimingPlan,
        initial_phase: usize,
    ) -> Result<(), SimulatorError> {
        let phase_states: Vec<String> = plan.phases().iter().map(|p| p.state.clone()).collect();
        if initial_phase >= phase_states.len() {
            return Err(SimulatorError::PhaseOutOfRange {
                tl_id: plan.tl_id().to_string(),
                phase_index: initial_phase,
            });
        }
        self.lights.insert(
            plan.tl_id().to_string(),
            SimulatedLight {
                phase_states,
                initial_phase,
                phase: initial_phase,
                history: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn current_phase(&self, tl_id: &str) -> Option<usize> {
        self.lights.get(tl_id).map(|light| light.phase)
    }

    pub fn phase_history(&self, tl_id: &str) -> Option<&[(f64, usize)]> {
        self.lights.get(tl_id).map(|light| light.history.as_slice())
    }

    /// Drops the connection; every later call fails until `reconnect`.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn reconnect(&mut self) {
        self.connected = true;
    }

    fn ensure_connected(&self) -> Result<(), SimulatorError> {
        if self.connected {
            Ok(())
        } else {
            Err(SimulatorError::Disconnected)
        }
    }
}

impl SimulatorConnection for SimulatedNetwork {
    fn signal_string(&self, tl_id: &str) -> Result<String, SimulatorError> {
        self.ensure_connected()?;
        let light = self
            .lights
            .get(tl_id)
            .ok_or_else(|| SimulatorError::UnknownTrafficLight(tl_id.to_string()))?;
        Ok(light.phase_states[light.phase].clone())
    }

    fn set_signal_phase(&mut self, tl_id: &str, phase_index: usize) -> Result<(), SimulatorError> {
        self.ensure_connected()?;
        let time = self.time;
        let light = self
            .lights
            .get_mut(tl_id)
            .ok_or_else(|| SimulatorError::UnknownTrafficLight(tl_id.to_string()))?;
        if phase_index >= light.phase_states.len() {
            return Err(SimulatorError::PhaseOutOfRange {
                tl_id: tl_id.to_string(),
                phase_index,
            });
        }
        debug!("[{:.1}] {} -> phase {}", time, tl_id, phase_index);
        light.phase = phase_index;
        light.history.push((time, phase_index));
        Ok(())
    }

    fn sim_time(&self) -> f64 {
        self.time
    }

    fn simulation_step(&mut self) -> Result<f64, SimulatorError> {
        self.ensure_connected()?;
        self.time += self.sim_step;
        Ok(self.time)
    }

    fn reset_simulation(&mut self) -> Result<(), SimulatorError> {
        self.ensure_connected()?;
        self.time = self.start_time;
        for light in self.lights.values_mut() {
            light.phase = light.initial_phase;
            light.history.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"<tlLogic id="A">
        <phase state="GGrr" name="2"/>
        <phase state="yyrr" name="2-4-y"/>
        <phase state="rrGG" name="4"/>
    </tlLogic>"#;

    fn network() -> SimulatedNetwork {
        let plan = TimingPlan::parse("A", PLAN).unwrap();
        let mut net = SimulatedNetwork::new(0.5).unwrap().with_start_time(10.0);
        net.add_traffic_light(&plan, 0).unwrap();
        net
    }

    #[test]
    fn writes_change_the_signal_string() {
        let mut net = network();
        assert_eq!(net.signal_string("A").unwrap(), "GGrr");
        net.set_signal_phase("A", 2).unwrap();
        assert_eq!(net.signal_string("A").unwrap(), "rrGG");
        assert_eq!(net.phase_history("A").unwrap(), &[(10.0, 2)]);
    }

    #[test]
    fn clock_advances_and_resets() {
        let mut net = network();
        assert_eq!(net.simulation_step().unwrap(), 10.5);
        net.set_signal_phase("A", 1).unwrap();
        net.reset_simulation().unwrap();
        assert_eq!(net.sim_time(), 10.0);
        assert_eq!(net.current_phase("A"), Some(0));
        assert!(net.phase_history("A").unwrap().is_empty());
    }

    #[test]
    fn non_positive_step_is_rejected() {
        for step in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                SimulatedNetwork::new(step),
                Err(SimulatorError::InvalidStep(_))
            ));
        }
    }

    #[test]
    fn bad_requests_fail() {
        let mut net = network();
        assert!(matches!(
            net.set_signal_phase("A", 9),
            Err(SimulatorError::PhaseOutOfRange { phase_index: 9, .. })
        ));
        assert!(matches!(
            net.signal_string("Z"),
            Err(SimulatorError::UnknownTrafficLight(_))
        ));
        net.disconnect();
        assert!(matches!(net.set_signal_phase("A", 1), Err(SimulatorError::Disconnected)));
        net.reconnect();
        assert!(net.set_signal_phase("A", 1).is_ok());
    }
}
