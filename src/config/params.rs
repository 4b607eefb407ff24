// src/config/params.rs
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::global_variables::{
    DEFAULT_HORIZON, DEFAULT_SIMS_PER_STEP, DEFAULT_SIM_STEP, DEFAULT_WARMUP_TIME,
};

/// Run parameters file: an `Environment` and a `Simulation` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunParams {
    #[serde(rename = "Environment", default)]
    pub environment: EnvParams,
    #[serde(rename = "Simulation")]
    pub simulation: SimParams,
}

/// Episode bookkeeping for the environment loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvParams {
    /// Simulator steps per agent step.
    pub sims_per_step: u32,
    /// Agent steps per episode.
    pub horizon: u32,
    /// Simulated seconds to run before control is taken over.
    pub warmup_time: u32,
    pub clip_actions: bool,
}

impl Default for EnvParams {
    fn default() -> Self {
        Self {
            sims_per_step: DEFAULT_SIMS_PER_STEP,
            horizon: DEFAULT_HORIZON,
            warmup_time: DEFAULT_WARMUP_TIME,
            clip_actions: true,
        }
    }
}

impl EnvParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sims_per_step == 0 {
            return Err(ConfigError::InvalidRunParam {
                name: "sims_per_step",
                value: 0.0,
                expected: "at least 1",
            });
        }
        Ok(())
    }

    /// Episode length in simulator steps.
    pub fn total_horizon(&self) -> u64 {
        u64::from(self.sims_per_step) * u64::from(self.horizon)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    pub tl_settings: PathBuf,
    #[serde(default = "default_sim_step")]
    pub sim_step: f64,
    /// Directory the other paths are relative to; defaults to the params file's directory.
    #[serde(default)]
    pub file_root: Option<PathBuf>,
}

fn default_sim_step() -> f64 {
    DEFAULT_SIM_STEP
}

impl SimParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sim_step.is_finite() || self.sim_step <= 0.0 {
            return Err(ConfigError::InvalidRunParam {
                name: "sim_step",
                value: self.sim_step,
                expected: "finite and greater than 0",
            });
        }
        Ok(())
    }
}

impl RunParams {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(data)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.environment.validate()?;
        self.simulation.validate()
    }

    pub fn tl_settings_path(&self, params_path: &Path) -> PathBuf {
        let root = match &self.simulation.file_root {
            Some(root) => root.clone(),
            None => params_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        root.join(&self.simulation.tl_settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_defaults_apply() {
        let params = RunParams::from_json(r#"{"Simulation": {"tl_settings": "tl.json"}}"#).unwrap();
        assert_eq!(params.environment.sims_per_step, 1);
        assert_eq!(params.environment.horizon, 3600);
        assert!(params.environment.clip_actions);
        assert_eq!(params.simulation.sim_step, 1.0);
        assert_eq!(
            params.tl_settings_path(Path::new("/runs/params.json")),
            PathBuf::from("/runs/tl.json")
        );
    }

    #[test]
    fn explicit_values_override_defaults() {
        let params = RunParams::from_json(
            r#"{
                "Environment": {"sims_per_step": 5, "horizon": 10, "clip_actions": false},
                "Simulation": {"tl_settings": "tl.json", "sim_step": 0.5, "file_root": "/data"}
            }"#,
        )
        .unwrap();
        assert_eq!(params.environment.total_horizon(), 50);
        assert_eq!(params.environment.warmup_time, 3600);
        assert!(!params.environment.clip_actions);
        assert_eq!(
            params.tl_settings_path(Path::new("/runs/params.json")),
            PathBuf::from("/data/tl.json")
        );
    }

    fn rejected_param(json: &str) -> (&'static str, f64) {
        match RunParams::from_json(json).unwrap_err() {
            ConfigError::InvalidRunParam { name, value, .. } => (name, value),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn zero_sim_step_is_rejected() {
        let json = r#"{"Simulation": {"tl_settings": "tl.json", "sim_step": 0}}"#;
        assert_eq!(rejected_param(json), ("sim_step", 0.0));
    }

    #[test]
    fn negative_sim_step_is_rejected() {
        let json = r#"{"Simulation": {"tl_settings": "tl.json", "sim_step": -0.5}}"#;
        assert_eq!(rejected_param(json), ("sim_step", -0.5));
    }

    #[test]
    fn non_finite_sim_step_is_rejected() {
        for sim_step in [f64::NAN, f64::INFINITY] {
            let sim = SimParams {
                tl_settings: PathBuf::from("tl.json"),
                sim_step,
                file_root: None,
            };
            assert!(matches!(
                sim.validate(),
                Err(ConfigError::InvalidRunParam { name: "sim_step", .. })
            ));
        }
    }

    #[test]
    fn zero_sims_per_step_is_rejected() {
        let json = r#"{
            "Environment": {"sims_per_step": 0},
            "Simulation": {"tl_settings": "tl.json"}
        }"#;
        assert_eq!(rejected_param(json), ("sims_per_step", 0.0));
    }
}
