// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector3};

use crate::robot::robot_state::RobotState;
use crate::utils::Vector6;

/// State of one controller run which persists between control cycles.
///
/// The equilibrium pose and the force bias are captured once from the state before the first
/// cycle and stay fixed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    elapsed: Duration,
    force_error_integral: Vector6,
    initial_position: Vector3<f64>,
    initial_orientation: UnitQuaternion<f64>,
    initial_wrench: Vector6,
}

impl ControlState {
    pub fn capture(initial_state: &RobotState) -> Self {
        let initial_pose = initial_state.end_effector_pose();
        ControlState {
            elapsed: Duration::default(),
            force_error_integral: Vector6::zeros(),
            initial_position: initial_pose.translation.vector,
            initial_orientation: initial_pose.rotation,
            initial_wrench: initial_state.external_wrench(),
        }
    }

    /// Adds one control period to the elapsed time.
    pub fn advance(&mut self, period: &Duration) {
        self.elapsed = self.elapsed.saturating_add(*period);
    }

    /// Integrates the force error over one control period.
    pub fn integrate(&mut self, period: &Duration, force_error: &Vector6) {
        self.force_error_integral += period.as_secs_f64() * force_error;
    }

    /// Time since the start of the run.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn force_error_integral(&self) -> &Vector6 {
        &self.force_error_integral
    }

    /// Equilibrium position in base frame.
    pub fn initial_position(&self) -> &Vector3<f64> {
        &self.initial_position
    }

    pub fn initial_orientation(&self) -> &UnitQuaternion<f64> {
        &self.initial_orientation
    }

    /// External wrench measured before the first cycle.
    pub fn initial_wrench(&self) -> &Vector6 {
        &self.initial_wrench
    }
}
