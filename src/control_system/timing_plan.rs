// src/control_system/timing_plan.rs
use log::warn;
use roxmltree as xml;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::control_system::dwell_timer::Color;
use crate::control_system::phase_catalog::Movement;
use crate::error::ConfigError;

/// One `<phase>` of a timing plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanPhase {
    pub name: Option<String>,
    /// Signal-head string the simulator shows while in this phase.
    pub state: String,
    pub duration: Option<f64>,
}

/// Maps (movement sequence, color) to the physical phase index of an
/// intersection's timing plan.
///
/// Phase names look like `2+6-4+8-y`: groups separated by `-`, movements
/// within a group by `+`, and an optional trailing color letter. Without the
/// letter the phase is green. The lookup key is the movements of all groups
/// in order (each movement once) together with the color.
#[derive(Debug, Clone)]
pub struct TimingPlan {
    tl_id: String,
    phases: Vec<PlanPhase>,
    lookup: HashMap<(Vec<Movement>, Color), usize>,
}

impl TimingPlan {
    pub fn load(tl_id: &str, path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(tl_id, &data)
    }

    pub fn parse(tl_id: &str, data: &str) -> Result<Self, ConfigError> {
        let doc = xml::Document::parse(data)?;

        // Prefer the tlLogic that belongs to this intersection; fall back to
        // every phase in the document for single-intersection files.
        let own_logic = doc
            .descendants()
            .find(|n| n.has_tag_name("tlLogic") && n.attribute("id") == Some(tl_id));
        let phase_nodes: Vec<xml::Node> = match own_logic {
            Some(logic) => logic
                .descendants()
                .filter(|n| n.has_tag_name("phase"))
                .collect(),
            None => doc
                .descendants()
                .filter(|n| n.has_tag_name("phase"))
                .collect(),
        };

        let mut phases = Vec::with_capacity(phase_nodes.len());
        let mut lookup = HashMap::new();
        for (index, node) in phase_nodes.iter().enumerate() {
            let name = node.attribute("name").map(|s| s.to_string());
            if let Some(name) = &name {
                let key = parse_phase_name(index, name)?;
                if lookup.contains_key(&key) {
                    warn!(
                        "timing plan for {}: phase {} ({}) duplicates an earlier phase, ignoring",
                        tl_id, index, name
                    );
                } else {
                    lookup.insert(key, index);
                }
            }
            phases.push(PlanPhase {
                name,
                state: node.attribute("state").unwrap_or_default().to_string(),
                duration: node.attribute("duration").and_then(|d| d.parse().ok()),
            });
        }

        Ok(Self {
            tl_id: tl_id.to_string(),
            phases,
            lookup,
        })
    }

    pub fn tl_id(&self) -> &str {
        &self.tl_id
    }

    pub fn phases(&self) -> &[PlanPhase] {
        &self.phases
    }

    /// Resolves the phase that shows `movements` in `color`.
    pub fn phase_index(&self, movements: &[Movement], color: Color) -> Result<usize, ConfigError> {
        let mut key = Vec::with_capacity(movements.len());
        for movement in movements {
            if !key.contains(movement) {
                key.push(*movement);
            }
        }
        self.lookup
            .get(&(key, color))
            .copied()
            .ok_or_else(|| ConfigError::PhaseNotInPlan {
                tl_id: self.tl_id.clone(),
                movements: movements.iter().map(|m| m.value()).collect(),
                color,
            })
    }
}

fn parse_phase_name(index: usize, name: &str) -> Result<(Vec<Movement>, Color), ConfigError> {
    let malformed = || ConfigError::MalformedPhaseName {
        index,
        name: name.to_string(),
    };

    let mut groups: Vec<&str> = name.trim().split('-').collect();
    let color = match groups.last().and_then(|g| Color::from_letter(g.trim())) {
        Some(color) => {
            groups.pop();
            color
        }
        None => Color::Green,
    };

    let mut movements = Vec::new();
    for group in groups {
        for token in group.split('+') {
            let value: u8 = token.trim().parse().map_err(|_| malformed())?;
            let movement = Movement::new(value).map_err(|_| malformed())?;
            if !movements.contains(&movement) {
                movements.push(movement);
            }
        }
    }
    if movements.is_empty() {
        return Err(malformed());
    }
    Ok((movements, color))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"<additional>
        <tlLogic id="other" type="static" programID="1" offset="0">
            <phase duration="30" state="rrrr" name="4"/>
        </tlLogic>
        <tlLogic id="A" type="static" programID="1" offset="0">
            <phase duration="30" state="GGrr" name="2"/>
            <phase duration="3" state="yyrr" name="2-4-y"/>
            <phase duration="2" state="rrrr" name="2-4-r"/>
            <phase duration="30" state="rrGG" name="4-g"/>
            <phase duration="3" state="rryy" name="4-2-y"/>
            <phase duration="2" state="rrrr" name="4-2-r"/>
            <phase duration="1" state="rrrr"/>
        </tlLogic>
    </additional>"#;

    fn m(values: &[u8]) -> Vec<Movement> {
        values.iter().map(|&v| Movement::new(v).unwrap()).collect()
    }

    #[test]
    fn resolves_phases_of_matching_logic() {
        let plan = TimingPlan::parse("A", PLAN).unwrap();
        assert_eq!(plan.phases().len(), 7);
        assert_eq!(plan.phase_index(&m(&[2]), Color::Green).unwrap(), 0);
        assert_eq!(plan.phase_index(&m(&[2, 4]), Color::Yellow).unwrap(), 1);
        assert_eq!(plan.phase_index(&m(&[2, 4]), Color::Red).unwrap(), 2);
        assert_eq!(plan.phase_index(&m(&[4]), Color::Green).unwrap(), 3);
        assert_eq!(plan.phase_index(&m(&[4, 2]), Color::Red).unwrap(), 5);
        assert_eq!(plan.phases()[3].state, "rrGG");
        assert_eq!(plan.phases()[6].name, None);
        assert_eq!(plan.phases()[1].duration, Some(3.0));
    }

    #[test]
    fn missing_phase_is_a_config_error() {
        let plan = TimingPlan::parse("A", PLAN).unwrap();
        let err = plan.phase_index(&m(&[2, 4]), Color::Green).unwrap_err();
        assert!(matches!(err, ConfigError::PhaseNotInPlan { color: Color::Green, .. }));
    }

    #[test]
    fn falls_back_to_all_phases_without_matching_logic() {
        let plan = TimingPlan::parse("unknown", PLAN).unwrap();
        assert_eq!(plan.phases().len(), 8);
        assert_eq!(plan.phase_index(&m(&[4]), Color::Green).unwrap(), 0);
    }

    #[test]
    fn multi_movement_groups_flatten_in_order() {
        let xml = r#"<tlLogic id="B">
            <phase state="GGrr" name="2+6"/>
            <phase state="yyrr" name="2+6-4+8-y"/>
        </tlLogic>"#;
        let plan = TimingPlan::parse("B", xml).unwrap();
        assert_eq!(plan.phase_index(&m(&[2, 6, 4, 8]), Color::Yellow).unwrap(), 1);
        assert!(plan.phase_index(&m(&[4, 8, 2, 6]), Color::Yellow).is_err());
        assert_eq!(plan.phase_index(&m(&[2, 6]), Color::Green).unwrap(), 0);
    }

    #[test]
    fn malformed_names_are_rejected() {
        let bad_number = r#"<tlLogic id="C"><phase state="G" name="2+x-y"/></tlLogic>"#;
        assert!(matches!(
            TimingPlan::parse("C", bad_number),
            Err(ConfigError::MalformedPhaseName { index: 0, .. })
        ));
        let color_only = r#"<tlLogic id="C"><phase state="G" name="y"/></tlLogic>"#;
        assert!(TimingPlan::parse("C", color_only).is_err());
        assert!(matches!(
            TimingPlan::parse("C", "<tlLogic>"),
            Err(ConfigError::Xml(_))
        ));
    }
}
