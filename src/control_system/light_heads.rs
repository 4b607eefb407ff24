// src/control_system/light_heads.rs
use crate::control_system::phase_catalog::Movement;
use crate::global_variables::PRIORITY_GREEN;

/// The block of signal-head characters one movement occupies in the
/// simulator's signal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightHead {
    pub movement: Movement,
    pub lane_num: usize,
    /// Right-turn-on-red lanes carry one extra head.
    pub right_on_red: bool,
}

impl LightHead {
    pub fn width(&self) -> usize {
        self.lane_num + usize::from(self.right_on_red)
    }
}

/// Heads of one intersection, in the order they appear in the signal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightHeadLayout {
    heads: Vec<LightHead>,
}

impl LightHeadLayout {
    pub fn new(heads: Vec<LightHead>) -> Self {
        Self { heads }
    }

    pub fn heads(&self) -> &[LightHead] {
        &self.heads
    }

    pub fn width(&self) -> usize {
        self.heads.iter().map(LightHead::width).sum()
    }

    /// Returns the movements whose heads show a priority green, or `None`
    /// when the string does not cover every configured head.
    pub fn decode(&self, signal: &str) -> Option<Vec<Movement>> {
        let chars: Vec<char> = signal.chars().collect();
        if chars.len() < self.width() {
            return None;
        }
        let mut active = Vec::new();
        let mut start = 0;
        for head in &self.heads {
            let end = start + head.width();
            if chars[start..end].contains(&PRIORITY_GREEN) {
                active.push(head.movement);
            }
            start = end;
        }
        Some(active)
    }
}
