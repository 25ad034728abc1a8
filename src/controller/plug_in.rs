// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use std::time::Duration;

use crate::controller::control_law::ControlLaw;
use crate::controller::control_state::ControlState;
use crate::controller::parameters::{ControllerParameters, TaskGoal};
use crate::controller::termination::{TerminationCheck, TerminationState};
use crate::controller::StopSignal;
use crate::exception::{ControllerException, ControllerResult};
use crate::model::RobotModel;
use crate::robot::control_types::{CycleOutcome, Torques};
use crate::robot::robot_state::RobotState;

/// The cycle function of one plug in run.
///
/// Owns the model and all state that persists between cycles. [`step`](`Self::step`) neither
/// blocks nor allocates and can be called from a real-time control loop.
pub struct PlugInController<M: RobotModel> {
    model: M,
    law: ControlLaw,
    control_state: ControlState,
    termination: TerminationCheck,
    stop: Option<StopSignal>,
}

impl<M: RobotModel> PlugInController<M> {
    /// Validates the configuration and captures the equilibrium pose and force bias from
    /// `initial_state`.
    pub fn new(
        model: M,
        parameters: &ControllerParameters,
        goal: &TaskGoal,
        initial_state: &RobotState,
    ) -> ControllerResult<Self> {
        parameters.validate()?;
        let termination = TerminationCheck::new(goal)?;
        Ok(PlugInController {
            model,
            law: ControlLaw::new(parameters),
            control_state: ControlState::capture(initial_state),
            termination,
            stop: None,
        })
    }

    /// Ends the run with [`Stopped`](`ControllerException::Stopped`) once `stop` is requested.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Evaluates one control cycle.
    pub fn step(&mut self, robot_state: &RobotState, period: &Duration) -> CycleOutcome {
        if let Some(stop) = &self.stop {
            if stop.is_requested() {
                return CycleOutcome::Failed(ControllerException::Stopped {
                    elapsed: self.control_state.elapsed().as_secs_f64(),
                });
            }
        }
        let output = self
            .law
            .evaluate(&self.model, robot_state, period, &mut self.control_state);
        let elapsed = self.control_state.elapsed();
        let command = Torques::from(output.tau_d);
        match self.termination.check(elapsed, &output.position) {
            TerminationState::Running => CycleOutcome::Continue(command),
            TerminationState::Succeeded => CycleOutcome::Succeeded(command),
            TerminationState::Failed => {
                CycleOutcome::Failed(self.termination.timeout_error(elapsed, &output.position))
            }
        }
    }

    pub fn control_state(&self) -> &ControlState {
        &self.control_state
    }

    pub fn termination_state(&self) -> TerminationState {
        self.termination.state()
    }
}
