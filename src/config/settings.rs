// src/config/settings.rs
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::control_system::dwell_timer::MinimumTimes;
use crate::control_system::light_heads::{LightHead, LightHeadLayout};
use crate::control_system::phase_catalog::Movement;
use crate::error::ConfigError;

/// Contents of the traffic-light settings file.
///
/// Intersections are keyed by id; the map's sorted order is the fixed
/// controller order used for action and observation vectors.
#[derive(Debug, Clone, Deserialize)]
pub struct TlSettings {
    pub traffic_lights: BTreeMap<String, TrafficLightSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrafficLightSettings {
    /// Movements in the order their heads appear in the signal string.
    pub phase_order: Vec<u8>,
    pub movements: BTreeMap<u8, MovementSettings>,
    pub min_red_time: f64,
    pub min_yellow_time: f64,
    pub min_green_time: f64,
    /// Timing plan XML, relative to the settings file.
    pub tl_file: PathBuf,
    #[serde(default = "default_all_red_clearance")]
    pub all_red_clearance: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovementSettings {
    pub lane_num: usize,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub right_on_red: bool,
}

fn default_all_red_clearance() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
}

// Settings files in the wild spell booleans as "True", "yes", "1", ...
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(i) => Ok(i != 0),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
            "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid truth value {:?}",
                other
            ))),
        },
    }
}

impl TlSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(data)?)
    }
}

impl TrafficLightSettings {
    pub fn minimum_times(&self, tl_id: &str) -> Result<MinimumTimes, ConfigError> {
        MinimumTimes::new(
            tl_id,
            self.min_red_time,
            self.min_yellow_time,
            self.min_green_time,
        )
    }

    /// Head layout in `phase_order`; every listed movement needs lane details.
    pub fn light_heads(&self, tl_id: &str) -> Result<LightHeadLayout, ConfigError> {
        let mut heads = Vec::with_capacity(self.phase_order.len());
        for &value in &self.phase_order {
            let movement = Movement::new(value)?;
            let details =
                self.movements
                    .get(&value)
                    .ok_or_else(|| ConfigError::MissingMovementDetails {
                        tl_id: tl_id.to_string(),
                        movement: value,
                    })?;
            heads.push(LightHead {
                movement,
                lane_num: details.lane_num,
                right_on_red: details.right_on_red,
            });
        }
        Ok(LightHeadLayout::new(heads))
    }

    pub fn timing_plan_path(&self, settings_dir: &Path) -> PathBuf {
        settings_dir.join(&self.tl_file)
    }
}
