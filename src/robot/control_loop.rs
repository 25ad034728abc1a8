// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use std::time::Duration;

use crate::exception::{ControllerException, ControllerResult};
use crate::robot::control_types::{CycleOutcome, Finishable, Torques};
use crate::robot::logger::Logger;
use crate::robot::robot_control::RobotControl;
use crate::robot::robot_state::RobotState;

pub type ControlCallback<'b> = &'b mut dyn FnMut(&RobotState, &Duration) -> CycleOutcome;

/// Drives a cycle function over a [`RobotControl`] until the cycle function ends the motion.
///
/// Every cycle reads one state, evaluates the callback with the time elapsed since the previous
/// state and sends the resulting command. The callback sees a period of zero in the first cycle.
pub struct ControlLoop<'a, 'b, T: RobotControl> {
    robot: &'a mut T,
    control_callback: ControlCallback<'b>,
    logger: Logger,
    pub motion_id: u32,
}

impl<'a, 'b, T: RobotControl> ControlLoop<'a, 'b, T> {
    pub fn new(
        robot: &'a mut T,
        control_callback: ControlCallback<'b>,
        log_size: usize,
    ) -> ControllerResult<Self> {
        let motion_id = robot.start_motion()?;
        Ok(ControlLoop {
            robot,
            control_callback,
            logger: Logger::new(log_size),
            motion_id,
        })
    }

    pub fn run(&mut self) -> ControllerResult<()> {
        match self.do_loop() {
            Ok(_) => Ok(()),
            Err(error) => {
                self.robot.cancel_motion(self.motion_id);
                Err(error)
            }
        }
    }

    fn do_loop(&mut self) -> ControllerResult<()> {
        let mut robot_state = self.robot.update(None)?;
        let mut previous_time = robot_state.time;
        loop {
            let period = robot_state
                .time
                .checked_sub(previous_time)
                .unwrap_or_default();
            match (self.control_callback)(&robot_state, &period) {
                CycleOutcome::Continue(command) => {
                    self.check_command(&robot_state, &command)?;
                    self.logger.log(&robot_state, &command);
                    previous_time = robot_state.time;
                    robot_state = self.robot.update(Some(&command))?;
                }
                CycleOutcome::Succeeded(command) => {
                    self.check_command(&robot_state, &command)?;
                    self.logger.log(&robot_state, &command);
                    return self
                        .robot
                        .finish_motion(self.motion_id, &command.motion_finished());
                }
                CycleOutcome::Failed(error) => {
                    return Err(self.control_exception(error));
                }
            }
        }
    }

    fn check_command(&mut self, robot_state: &RobotState, command: &Torques) -> ControllerResult<()> {
        if command.is_finite() {
            return Ok(());
        }
        self.logger.log(robot_state, command);
        Err(self.control_exception(ControllerException::CommandException {
            message: "Commanded joint torques are not finite".to_string(),
        }))
    }

    fn control_exception(&mut self, error: ControllerException) -> ControllerException {
        ControllerException::ControlException {
            log: Some(self.logger.flush()),
            error: Box::new(error),
        }
    }
}
