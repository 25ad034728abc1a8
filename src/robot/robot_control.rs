// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use crate::exception::ControllerResult;
use crate::robot::control_types::Torques;
use crate::robot::robot_state::RobotState;

/// Low level access to a robot which exchanges one state and one command per cycle.
///
/// [`ControlLoop`](`crate::robot::control_loop::ControlLoop`) drives a cycle function over it.
pub trait RobotControl {
    /// Switches the robot to external torque control and returns the id of the motion.
    fn start_motion(&mut self) -> ControllerResult<u32>;
    /// Sends the command (if any) and blocks until the next state arrives.
    fn update(&mut self, control_command: Option<&Torques>) -> ControllerResult<RobotState>;
    /// Sends the last command of a motion and switches the robot back to idle.
    fn finish_motion(&mut self, motion_id: u32, control_command: &Torques)
        -> ControllerResult<()>;
    /// Aborts the motion without sending another command.
    fn cancel_motion(&mut self, motion_id: u32);
}
