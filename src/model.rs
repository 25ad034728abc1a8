// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the model provider interface.
use crate::robot::robot_state::RobotState;

/// Calculates the dynamic and kinematic quantities the controller needs for a robot state.
///
/// Implementations are called once per control cycle and must not block.
#[cfg_attr(test, mockall::automock)]
pub trait RobotModel {
    /// Calculates the Coriolis force vector (state-space equation):
    /// ![c= C \times dq](https://latex.codecogs.com/png.latex?c=&space;C&space;\times&space;dq), in \[Nm\].
    /// # Arguments
    /// * `robot_state` - State from which the Coriolis force vector should be calculated.
    /// # Return
    /// Coriolis force vector.
    fn coriolis_from_state(&self, robot_state: &RobotState) -> [f64; 7];

    /// Gets the 6x7 Jacobian of the end effector relative to the base frame.
    ///
    /// The Jacobian is represented as a 6x7 matrix in column-major format.
    /// # Arguments
    /// * `robot_state` - State from which the Jacobian should be calculated.
    /// # Return
    /// Vectorized 6x7 Jacobian, column-major.
    fn zero_jacobian_from_state(&self, robot_state: &RobotState) -> [f64; 42];
}
