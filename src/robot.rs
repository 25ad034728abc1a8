// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the robot interface the controller runs on and its backends.
//!
//! The plug in controller only needs three things from a robot: a single state snapshot before
//! the motion starts, a model for the current configuration and a real-time loop that calls a
//! cycle function once per period. These are described by [`RobotInterface`]. The loop timing,
//! actuator limits and safety monitoring stay with the backend.
use std::time::Duration;

use crate::exception::ControllerResult;
use crate::model::RobotModel;
use crate::robot::control_types::CycleOutcome;
use crate::robot::robot_state::RobotState;

pub mod control_loop;
pub mod control_types;
#[cfg(feature = "franka")]
pub mod franka;
pub mod logger;
pub mod robot_control;
pub mod robot_state;
pub mod sim;

/// A robot which can run a joint torque control loop.
pub trait RobotInterface {
    /// Model of this robot.
    type Model: RobotModel;

    /// Waits for a robot state update and returns it.
    ///
    /// Must not be called while a control loop is running.
    fn read_once(&mut self) -> ControllerResult<RobotState>;

    /// Loads the model of the robot.
    fn load_model(&mut self) -> ControllerResult<Self::Model>;

    /// Starts a control loop for sending joint-level torque commands.
    ///
    /// The callback is called once per period with the current state and the time since the
    /// previous call (zero in the first call). The loop continues as long as it returns
    /// [`CycleOutcome::Continue`]. On [`CycleOutcome::Failed`] no further command is sent and the
    /// error is returned.
    fn control_torques(
        &mut self,
        control_callback: &mut dyn FnMut(&RobotState, &Duration) -> CycleOutcome,
    ) -> ControllerResult<()>;
}

/// Resolves a robot endpoint (for example a hostname) to a connected robot.
pub trait RobotConnector {
    type Robot: RobotInterface;
    /// Connects to the robot at `endpoint`.
    fn connect(&self, endpoint: &str) -> ControllerResult<Self::Robot>;
}
