use log::{debug, info};
use std::collections::VecDeque;

use crate::config::TrafficLightSettings;
use crate::control_system::dwell_timer::{Color, DwellTimer, MinimumTimes};
use crate::control_system::light_heads::LightHeadLayout;
use crate::control_system::phase_catalog::{ActionSpace, Movement, PhaseCombination};
use crate::control_system::timing_plan::TimingPlan;
use crate::error::{ConfigError, ControllerError};
use crate::shared_data::SignalEvent;
use crate::simulation_engine::SimulatorConnection;

/// One retryable step of a phase change.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Drive the heads of `movements` to `color`. Gated by the dwell timer.
    SetColor { movements: Vec<Movement>, color: Color },
    /// Make the action-space entry `index` the current combination.
    CommitCombination { index: usize },
    RecordGreenStart,
}

/// Tasks that must all succeed in the same tick.
pub type TaskGroup = Vec<Task>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStatus {
    Idle,
    Transitioning,
}

/// Everything `reset` restores.
#[derive(Debug, Clone, PartialEq)]
struct ControllerState {
    current: usize,
    tasks: VecDeque<TaskGroup>,
    transition_active: bool,
    timer: DwellTimer,
}

/// Phase-transition state machine for one intersection.
///
/// Requests arrive as action-space indices once per tick. An accepted request
/// is turned into the groups yellow, all-red, green; each tick advances the
/// queue by at most one group and only once the dwell time of the color being
/// left has run out. Requests arriving mid-transition are dropped.
#[derive(Debug, Clone)]
pub struct SignalController {
    tl_id: String,
    action_space: ActionSpace,
    heads: LightHeadLayout,
    plan: TimingPlan,
    all_red_clearance: bool,
    state: ControllerState,
    initial: ControllerState,
    events: Vec<SignalEvent>,
}

impl SignalController {
    pub fn new(
        tl_id: &str,
        action_space: ActionSpace,
        heads: LightHeadLayout,
        plan: TimingPlan,
        minimums: MinimumTimes,
        all_red_clearance: bool,
    ) -> Result<Self, ConfigError> {
        if action_space.is_empty() {
            return Err(ConfigError::EmptyActionSpace(tl_id.to_string()));
        }
        // Until synced with the simulator the first combination stands in.
        let state = ControllerState {
            current: 0,
            tasks: VecDeque::new(),
            transition_active: false,
            timer: DwellTimer::new(minimums),
        };
        Ok(Self {
            tl_id: tl_id.to_string(),
            action_space,
            heads,
            plan,
            all_red_clearance,
            initial: state.clone(),
            state,
            events: Vec::new(),
        })
    }

    pub fn from_settings(
        tl_id: &str,
        settings: &TrafficLightSettings,
        plan: TimingPlan,
    ) -> Result<Self, ConfigError> {
        Self::new(
            tl_id,
            ActionSpace::from_movements(&settings.phase_order)?,
            settings.light_heads(tl_id)?,
            plan,
            settings.minimum_times(tl_id)?,
            settings.all_red_clearance,
        )
    }

    pub fn tl_id(&self) -> &str {
        &self.tl_id
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub fn timing_plan(&self) -> &TimingPlan {
        &self.plan
    }

    pub fn status(&self) -> ControllerStatus {
        if self.state.tasks.is_empty() {
            ControllerStatus::Idle
        } else {
            ControllerStatus::Transitioning
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.transition_active
    }

    pub fn pending_groups(&self) -> usize {
        self.state.tasks.len()
    }

    pub fn current_combination(&self) -> &PhaseCombination {
        &self.action_space.combinations()[self.state.current]
    }

    /// Action-space index of the current (never the pending) combination.
    pub fn get_current_state(&self) -> usize {
        self.state.current
    }

    pub fn get_last_green_duration(&self, sim_time: f64) -> f64 {
        self.state.timer.last_green_duration(sim_time)
    }

    pub fn last_changed_time(&self) -> Option<f64> {
        self.state.timer.last_changed_time()
    }

    pub fn last_green_time(&self) -> f64 {
        self.state.timer.last_green_time()
    }

    pub fn displayed_color(&self) -> Color {
        self.state.timer.displayed()
    }

    /// Handles one tick's request and advances the transition queue.
    ///
    /// Returns true only when the request was accepted *and* the queue step
    /// of this tick succeeded; a true result does not mean the transition has
    /// completed.
    pub fn update_state<C: SimulatorConnection + ?Sized>(
        &mut self,
        requested_index: usize,
        sim_time: f64,
        connection: &mut C,
    ) -> Result<bool, ControllerError> {
        self.check_clock(sim_time)?;
        let accepted = self.schedule(requested_index);
        let stepped = self.step(sim_time, connection)?;
        Ok(accepted && stepped)
    }

    // Runs before anything is queued so a rejected tick leaves no trace.
    fn check_clock(&self, sim_time: f64) -> Result<(), ControllerError> {
        match self.state.timer.last_changed_time() {
            Some(last_changed_time) if sim_time < last_changed_time => {
                Err(ControllerError::ClockRegression {
                    tl_id: self.tl_id.clone(),
                    sim_time,
                    last_changed_time,
                })
            }
            _ => Ok(()),
        }
    }

    fn schedule(&mut self, requested_index: usize) -> bool {
        let desired = match self.action_space.combination(requested_index) {
            Some(desired) => desired,
            None => return false,
        };
        if requested_index == self.state.current {
            return false;
        }
        if !self.state.tasks.is_empty() {
            debug!(
                "{}: dropping request for {} while transitioning",
                self.tl_id, desired
            );
            return false;
        }

        let current = self.current_combination();
        let merged = current.merged_with(desired);
        debug!("{}: scheduling {} -> {}", self.tl_id, current, desired);

        let mut groups = vec![vec![Task::SetColor {
            movements: merged.clone(),
            color: Color::Yellow,
        }]];
        if self.all_red_clearance {
            groups.push(vec![Task::SetColor {
                movements: merged,
                color: Color::Red,
            }]);
        }
        groups.push(vec![
            Task::SetColor {
                movements: desired.movements().to_vec(),
                color: Color::Green,
            },
            Task::CommitCombination {
                index: requested_index,
            },
            Task::RecordGreenStart,
        ]);

        self.state.tasks.extend(groups);
        self.state.transition_active = true;
        true
    }

    /// Runs the front group if every gate in it is open. All-or-nothing:
    /// nothing is written or committed unless the whole group can go.
    fn step<C: SimulatorConnection + ?Sized>(
        &mut self,
        sim_time: f64,
        connection: &mut C,
    ) -> Result<bool, ControllerError> {
        let group = match self.state.tasks.front() {
            Some(group) => group,
            None => return Ok(true),
        };

        let mut writes = Vec::new();
        for task in group {
            if let Task::SetColor { movements, color } = task {
                if !self.state.timer.can_leave(sim_time) {
                    return Ok(false);
                }
                let phase_index = self.plan.phase_index(movements, *color)?;
                writes.push(phase_index);
            }
        }
        for &phase_index in &writes {
            connection.set_signal_phase(&self.tl_id, phase_index)?;
        }

        let group = match self.state.tasks.pop_front() {
            Some(group) => group,
            None => return Ok(true),
        };
        let mut phase_indices = writes.into_iter();
        for task in group {
            match task {
                Task::SetColor { movements, color } => {
                    self.state.timer.record_change(color, sim_time);
                    self.events.push(SignalEvent {
                        sim_time,
                        tl_id: self.tl_id.clone(),
                        color,
                        movements: join_movements(&movements),
                        phase_index: phase_indices.next().unwrap_or_default(),
                    });
                }
                Task::CommitCombination { index } => {
                    self.state.current = index;
                    self.state.transition_active = false;
                }
                Task::RecordGreenStart => self.state.timer.record_green_start(sim_time),
            }
        }
        Ok(true)
    }

    /// Seeds the current combination from a live signal string and makes the
    /// result the state `reset` returns to.
    pub fn sync_with_signal_string(&mut self, signal: &str) -> Result<usize, ConfigError> {
        let movements =
            self.heads
                .decode(signal)
                .ok_or_else(|| ConfigError::SignalStringTooShort {
                    tl_id: self.tl_id.clone(),
                    signal: signal.to_string(),
                })?;
        let index = self
            .action_space
            .position_of_movements(&movements)
            .ok_or_else(|| ConfigError::UnknownSignalState {
                tl_id: self.tl_id.clone(),
                signal: signal.to_string(),
                movements: movements.iter().map(|m| m.value()).collect(),
            })?;

        self.state = ControllerState {
            current: index,
            tasks: VecDeque::new(),
            transition_active: false,
            timer: DwellTimer::new(*self.state.timer.minimums()),
        };
        self.initial = self.state.clone();
        info!(
            "{}: synced to {} from {:?}",
            self.tl_id,
            self.current_combination(),
            signal
        );
        Ok(index)
    }

    pub fn sync<C: SimulatorConnection + ?Sized>(
        &mut self,
        connection: &C,
    ) -> Result<usize, ControllerError> {
        let signal = connection.signal_string(&self.tl_id)?;
        Ok(self.sync_with_signal_string(&signal)?)
    }

    /// Restores the snapshot taken at construction or at the last sync.
    pub fn reset(&mut self) {
        self.state = self.initial.clone();
        self.events.clear();
    }

    pub fn drain_events(&mut self) -> Vec<SignalEvent> {
        std::mem::take(&mut self.events)
    }
}

fn join_movements(movements: &[Movement]) -> String {
    movements
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("+")
}
