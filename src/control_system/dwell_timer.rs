// src/control_system/dwell_timer.rs
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Colors a group of signal heads can be driven to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Yellow,
    Green,
}

impl Color {
    /// Parses the one-letter color suffix used in timing-plan phase names.
    pub fn from_letter(letter: &str) -> Option<Color> {
        match letter {
            "r" => Some(Color::Red),
            "y" => Some(Color::Yellow),
            "g" => Some(Color::Green),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Color::Red => 'r',
            Color::Yellow => 'y',
            Color::Green => 'g',
        }
    }
}

/// Minimum dwell per color, in simulation seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumTimes {
    pub red: f64,
    pub yellow: f64,
    pub green: f64,
}

impl MinimumTimes {
    pub fn new(tl_id: &str, red: f64, yellow: f64, green: f64) -> Result<Self, ConfigError> {
        for (color, value) in [(Color::Red, red), (Color::Yellow, yellow), (Color::Green, green)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDwellTime {
                    tl_id: tl_id.to_string(),
                    color,
                    value,
                });
            }
        }
        Ok(Self { red, yellow, green })
    }

    pub fn get(&self, color: Color) -> f64 {
        match color {
            Color::Red => self.red,
            Color::Yellow => self.yellow,
            Color::Green => self.green,
        }
    }
}

/// Per-controller dwell bookkeeping.
///
/// Tracks which color the controller last drove its heads to and when, plus
/// the start of the most recent green. Simulation time is never stored
/// globally; callers pass it in on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct DwellTimer {
    minimums: MinimumTimes,
    displayed: Color,
    // None until the controller itself starts an interval; the interval that
    // was running when control was taken over counts as satisfied.
    last_changed_time: Option<f64>,
    last_green_time: f64,
}

impl DwellTimer {
    pub fn new(minimums: MinimumTimes) -> Self {
        Self {
            minimums,
            displayed: Color::Green,
            last_changed_time: None,
            last_green_time: 0.0,
        }
    }

    pub fn minimums(&self) -> &MinimumTimes {
        &self.minimums
    }

    pub fn displayed(&self) -> Color {
        self.displayed
    }

    /// True iff at least `minimum[color]` has passed since the last change.
    pub fn elapsed(&self, color: Color, sim_time: f64) -> bool {
        match self.last_changed_time {
            Some(changed) => sim_time - changed >= self.minimums.get(color),
            None => true,
        }
    }

    /// Whether the interval currently displayed has run its minimum.
    pub fn can_leave(&self, sim_time: f64) -> bool {
        self.elapsed(self.displayed, sim_time)
    }

    pub fn record_change(&mut self, color: Color, sim_time: f64) {
        self.displayed = color;
        self.last_changed_time = Some(sim_time);
    }

    pub fn record_green_start(&mut self, sim_time: f64) {
        self.last_green_time = sim_time;
    }

    pub fn last_changed_time(&self) -> Option<f64> {
        self.last_changed_time
    }

    pub fn last_green_time(&self) -> f64 {
        self.last_green_time
    }

    pub fn last_green_duration(&self, sim_time: f64) -> f64 {
        sim_time - self.last_green_time
    }
}
