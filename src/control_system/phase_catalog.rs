// src/control_system/phase_catalog.rs
use std::collections::HashMap;
use std::fmt;

use crate::error::ConfigError;
use crate::global_variables::{MAINLINE_MOVEMENTS, OPPOSING_HALF, PRIMARY_HALF, SECONDARY_MOVEMENTS};

/// One directional right-of-way at an intersection (NEMA numbering, 1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Movement(u8);

/// The two partitions of movements that never share right-of-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ring {
    Mainline,
    Secondary,
}

impl Movement {
    pub fn new(value: u8) -> Result<Self, ConfigError> {
        if MAINLINE_MOVEMENTS.contains(&value) || SECONDARY_MOVEMENTS.contains(&value) {
            Ok(Movement(value))
        } else {
            Err(ConfigError::UnknownMovement(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn ring(self) -> Ring {
        if MAINLINE_MOVEMENTS.contains(&self.0) {
            Ring::Mainline
        } else {
            Ring::Secondary
        }
    }

    /// True for {1,2,3,4}, the half of each ring that leads a pair.
    pub fn is_primary(self) -> bool {
        PRIMARY_HALF.contains(&self.0)
    }

    pub fn is_opposing(self) -> bool {
        OPPOSING_HALF.contains(&self.0)
    }
}

impl TryFrom<u8> for Movement {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Movement::new(value)
    }
}

impl From<Movement> for u8 {
    fn from(movement: Movement) -> u8 {
        movement.0
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of one or two movements that may hold right-of-way together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhaseCombination(Vec<Movement>);

impl PhaseCombination {
    pub fn single(movement: Movement) -> Self {
        PhaseCombination(vec![movement])
    }

    pub fn pair(primary: Movement, opposing: Movement) -> Self {
        PhaseCombination(vec![primary, opposing])
    }

    pub fn movements(&self) -> &[Movement] {
        &self.0
    }

    pub fn contains(&self, movement: Movement) -> bool {
        self.0.contains(&movement)
    }

    /// Movements of `self` followed by those of `other` not already present.
    /// Used to address both departing and arriving heads during clearance.
    pub fn merged_with(&self, other: &PhaseCombination) -> Vec<Movement> {
        let mut merged = self.0.clone();
        for movement in &other.0 {
            if !merged.contains(movement) {
                merged.push(*movement);
            }
        }
        merged
    }

    /// Order-insensitive comparison against a decoded movement list.
    pub fn has_same_movements(&self, movements: &[Movement]) -> bool {
        let mut ours = self.0.clone();
        let mut theirs = movements.to_vec();
        ours.sort();
        ours.dedup();
        theirs.sort();
        theirs.dedup();
        ours == theirs
    }

    pub fn to_values(&self) -> Vec<u8> {
        self.0.iter().map(|m| m.value()).collect()
    }
}

impl fmt::Display for PhaseCombination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|m| m.to_string()).collect();
        write!(f, "{}", names.join("+"))
    }
}

/// Every legal combination for one intersection, indexed by insertion order.
/// Indices double as RL action ids and as encoded observations.
#[derive(Debug, Clone)]
pub struct ActionSpace {
    combinations: Vec<PhaseCombination>,
    index: HashMap<PhaseCombination, usize>,
}

impl ActionSpace {
    /// Derives the action space from a configured movement list.
    ///
    /// Each ring is treated on its own: a ring with fewer than two movements
    /// contributes its lone movement as a one-element combination, otherwise
    /// every (primary, opposing) pair in configured order is a combination.
    /// Rings are never mixed.
    pub fn from_movements(movements: &[u8]) -> Result<Self, ConfigError> {
        let movements = movements
            .iter()
            .map(|&value| Movement::new(value))
            .collect::<Result<Vec<_>, _>>()?;

        let mainline: Vec<Movement> = movements
            .iter()
            .copied()
            .filter(|m| m.ring() == Ring::Mainline)
            .collect();
        let secondary: Vec<Movement> = movements
            .iter()
            .copied()
            .filter(|m| m.ring() == Ring::Secondary)
            .collect();

        let mut space = ActionSpace {
            combinations: Vec::new(),
            index: HashMap::new(),
        };
        for ring in [&mainline, &secondary] {
            if ring.len() < 2 {
                for &movement in ring.iter() {
                    space.push(PhaseCombination::single(movement));
                }
                continue;
            }
            for &j in ring.iter().filter(|m| m.is_primary()) {
                for &i in ring.iter().filter(|m| m.is_opposing()) {
                    space.push(PhaseCombination::pair(j, i));
                }
            }
        }
        Ok(space)
    }

    fn push(&mut self, combination: PhaseCombination) {
        if self.index.contains_key(&combination) {
            return;
        }
        self.index.insert(combination.clone(), self.combinations.len());
        self.combinations.push(combination);
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    pub fn combinations(&self) -> &[PhaseCombination] {
        &self.combinations
    }

    pub fn combination(&self, index: usize) -> Option<&PhaseCombination> {
        self.combinations.get(index)
    }

    pub fn index_of(&self, combination: &PhaseCombination) -> Option<usize> {
        self.index.get(combination).copied()
    }

    pub fn contains(&self, combination: &PhaseCombination) -> bool {
        self.index.contains_key(combination)
    }

    /// Finds the combination holding exactly `movements`, in any order.
    pub fn position_of_movements(&self, movements: &[Movement]) -> Option<usize> {
        self.combinations
            .iter()
            .position(|c| c.has_same_movements(movements))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhaseCombination> {
        self.combinations.iter()
    }
}
