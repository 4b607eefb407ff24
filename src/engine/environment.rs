// src/engine/environment.rs
use log::{debug, info};

use crate::config::EnvParams;
use crate::control_system::ControllerRegistry;
use crate::error::ControllerError;
use crate::shared_data::{Observation, ObservationSize};
use crate::simulation_engine::SimulatorConnection;

/// Result of one agent step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    pub done: bool,
}

/// Agent-facing loop around the registry and a simulator connection.
pub struct SignalEnv<C: SimulatorConnection> {
    params: EnvParams,
    registry: ControllerRegistry,
    connection: C,
    step_counter: u64,
}

impl<C: SimulatorConnection> SignalEnv<C> {
    /// Runs the warm-up period, then hands the signals to the registry.
    pub fn new(
        params: EnvParams,
        registry: ControllerRegistry,
        connection: C,
    ) -> Result<Self, ControllerError> {
        params.validate()?;
        let mut env = Self {
            params,
            registry,
            connection,
            step_counter: 0,
        };
        env.warm_up()?;
        env.registry.register(&env.connection)?;
        Ok(env)
    }

    fn warm_up(&mut self) -> Result<(), ControllerError> {
        let until = f64::from(self.params.warmup_time);
        while self.connection.sim_time() < until {
            self.connection.simulation_step()?;
        }
        debug!("warm-up finished at {}", self.connection.sim_time());
        Ok(())
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    pub fn step_counter(&self) -> u64 {
        self.step_counter
    }

    pub fn action_space_shape(&self) -> Vec<usize> {
        self.registry.discrete_space_shape()
    }

    pub fn observation_size(&self) -> ObservationSize {
        self.registry.size()
    }

    /// Bounds each action to its controller's action space.
    pub fn clip_actions(&self, actions: &[f64]) -> Vec<f64> {
        actions
            .iter()
            .zip(self.registry.discrete_space_shape())
            .map(|(&action, len)| {
                let high = len.saturating_sub(1) as f64;
                if action.is_nan() {
                    0.0
                } else {
                    action.clamp(0.0, high)
                }
            })
            .chain(actions.iter().skip(self.registry.len()).copied())
            .collect()
    }

    /// Floors continuous agent outputs to action indices and applies them at
    /// the simulator's current time.
    pub fn apply_rl_actions(&mut self, actions: &[f64]) -> Result<Vec<bool>, ControllerError> {
        let actions = if self.params.clip_actions {
            self.clip_actions(actions)
        } else {
            actions.to_vec()
        };
        let indices: Vec<usize> = actions.iter().map(|&a| to_action_index(a)).collect();
        let sim_time = self.connection.sim_time();
        self.registry.update(&indices, sim_time, &mut self.connection)
    }

    pub fn step(&mut self, actions: &[f64]) -> Result<StepOutcome, ControllerError> {
        for _ in 0..self.params.sims_per_step {
            self.step_counter += 1;
            self.apply_rl_actions(actions)?;
            self.connection.simulation_step()?;
        }
        Ok(StepOutcome {
            observation: self.observation(),
            done: self.step_counter > self.params.total_horizon(),
        })
    }

    pub fn observation(&self) -> Observation {
        self.registry.get_current_state(self.connection.sim_time())
    }

    /// Starts a new episode from the simulator's initial state.
    pub fn reset(&mut self) -> Result<Observation, ControllerError> {
        self.step_counter = 0;
        self.connection.reset_simulation()?;
        self.registry.reset();
        self.warm_up()?;
        self.registry.register(&self.connection)?;
        info!("episode reset at {}", self.connection.sim_time());
        Ok(self.observation())
    }

    pub fn into_parts(self) -> (ControllerRegistry, C) {
        (self.registry, self.connection)
    }
}

// Negative or non-finite values map past every action space and are ignored.
fn to_action_index(action: f64) -> usize {
    if action.is_finite() && action >= 0.0 {
        action.floor() as usize
    } else {
        usize::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlSettings;
    use crate::error::{ConfigError, SimulatorError};
    use crate::control_system::{SignalController, TimingPlan};
    use crate::simulation_engine::SimulatedNetwork;

    const SETTINGS: &str = r#"{
        "traffic_lights": {
            "A": {
                "phase_order": [2, 4],
                "movements": {"2": {"lane_num": 1}, "4": {"lane_num": 1}},
                "min_red_time": 1, "min_yellow_time": 1, "min_green_time": 2,
                "tl_file": "a.xml"
            }
        }
    }"#;

    const PLAN: &str = r#"<tlLogic id="A">
        <phase state="Gr" name="2"/>
        <phase state="yr" name="2-4-y"/>
        <phase state="rr" name="2-4-r"/>
        <phase state="rG" name="4"/>
        <phase state="ry" name="4-2-y"/>
        <phase state="rr" name="4-2-r"/>
    </tlLogic>"#;

    fn env(params: EnvParams) -> SignalEnv<SimulatedNetwork> {
        try_env(params).unwrap()
    }

    fn try_env(params: EnvParams) -> Result<SignalEnv<SimulatedNetwork>, ControllerError> {
        let settings = TlSettings::from_json(SETTINGS).unwrap();
        let plan = TimingPlan::parse("A", PLAN).unwrap();
        let mut net = SimulatedNetwork::new(1.0).unwrap();
        net.add_traffic_light(&plan, 0).unwrap();
        let controller =
            SignalController::from_settings("A", &settings.traffic_lights["A"], plan).unwrap();
        SignalEnv::new(params, ControllerRegistry::new(vec![controller]), net)
    }

    fn params() -> EnvParams {
        EnvParams {
            sims_per_step: 1,
            horizon: 5,
            warmup_time: 10,
            clip_actions: true,
        }
    }

    #[test]
    fn warm_up_runs_before_control() {
        let env = env(params());
        assert_eq!(env.connection().sim_time(), 10.0);
        assert_eq!(env.observation().states, vec![0]);
    }

    #[test]
    fn actions_are_clipped_and_floored() {
        let env = env(params());
        assert_eq!(env.clip_actions(&[7.3]), vec![1.0]);
        assert_eq!(env.clip_actions(&[-2.0]), vec![0.0]);
        assert_eq!(to_action_index(1.9), 1);
        assert_eq!(to_action_index(-0.5), usize::MAX);
        assert_eq!(to_action_index(f64::NAN), usize::MAX);
    }

    #[test]
    fn unclipped_negative_action_is_ignored() {
        let mut env = env(EnvParams {
            clip_actions: false,
            ..params()
        });
        assert_eq!(env.apply_rl_actions(&[-1.0]).unwrap(), vec![false]);
        assert_eq!(env.registry().get("A").unwrap().pending_groups(), 0);
    }

    #[test]
    fn episode_runs_to_horizon_and_resets() {
        let mut env = env(params());
        let mut outcome = env.step(&[1.0]).unwrap();
        while !outcome.done {
            outcome = env.step(&[1.0]).unwrap();
        }
        assert_eq!(env.step_counter(), 6);
        assert_eq!(outcome.observation.states, vec![1]);

        let observation = env.reset().unwrap();
        assert_eq!(env.step_counter(), 0);
        assert_eq!(observation.states, vec![0]);
        assert_eq!(env.connection().sim_time(), 10.0);
        assert_eq!(env.registry().get("A").unwrap().pending_groups(), 0);
    }

    #[test]
    fn wrong_action_count_is_an_error() {
        let mut env = env(EnvParams {
            clip_actions: false,
            ..params()
        });
        assert!(env.step(&[1.0, 0.0]).is_err());
    }

    #[test]
    fn zero_sims_per_step_is_rejected() {
        let result = try_env(EnvParams {
            sims_per_step: 0,
            ..params()
        });
        assert!(matches!(
            result,
            Err(ControllerError::Config(ConfigError::InvalidRunParam {
                name: "sims_per_step",
                ..
            }))
        ));
    }

    #[test]
    fn lost_connection_fails_the_step() {
        let mut env = env(params());
        env.connection_mut().disconnect();
        assert!(matches!(
            env.step(&[1.0]),
            Err(ControllerError::Simulator(SimulatorError::Disconnected))
        ));
        env.connection_mut().reconnect();
        assert!(env.step(&[1.0]).is_ok());
    }
}
