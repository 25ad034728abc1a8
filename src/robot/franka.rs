// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the backend for Franka Emika robots on top of libfranka-rs.
//!
//! **ALWAYS HAVE THE USER STOP BUTTON AT HAND WHILE CONTROLLING THE ROBOT!**
//! The collision thresholds are raised while connecting because the controller pushes against
//! its environment.
#![allow(non_snake_case)]
use std::time::Duration;

use franka::exception::FrankaException;
use franka::{Frame, MotionFinished, RealtimeConfig};

use crate::exception::{ControllerException, ControllerResult};
use crate::model::RobotModel;
use crate::robot::control_types::CycleOutcome;
use crate::robot::robot_state::RobotState;
use crate::robot::{RobotConnector, RobotInterface};

impl From<FrankaException> for ControllerException {
    fn from(exception: FrankaException) -> Self {
        match exception {
            FrankaException::NetworkException { message } => {
                ControllerException::ConnectionFault { message }
            }
            FrankaException::ControlException { error, .. } => {
                ControllerException::ControlException {
                    log: None,
                    error: Box::new(ControllerException::CommandException { message: error }),
                }
            }
            other => ControllerException::CommandException {
                message: other.to_string(),
            },
        }
    }
}

fn convert_state(state: &franka::RobotState) -> RobotState {
    RobotState {
        O_T_EE: state.O_T_EE,
        O_F_ext_hat_K: state.O_F_ext_hat_K,
        q: state.q,
        dq: state.dq,
        time: state.time,
    }
}

/// Robot model of libfranka with the load of the end effector fixed at loading time.
pub struct FrankaModel {
    model: franka::Model,
    I_total: [f64; 9],
    m_total: f64,
    F_x_Ctotal: [f64; 3],
    F_T_EE: [f64; 16],
    EE_T_K: [f64; 16],
}

impl RobotModel for FrankaModel {
    fn coriolis_from_state(&self, robot_state: &RobotState) -> [f64; 7] {
        self.model.coriolis(
            &robot_state.q,
            &robot_state.dq,
            &self.I_total,
            self.m_total,
            &self.F_x_Ctotal,
        )
    }

    fn zero_jacobian_from_state(&self, robot_state: &RobotState) -> [f64; 42] {
        self.model.zero_jacobian(
            &Frame::EndEffector,
            &robot_state.q,
            &self.F_T_EE,
            &self.EE_T_K,
        )
    }
}

pub struct FrankaRobot {
    robot: franka::Robot,
}

impl FrankaRobot {
    /// Connects to the robot and raises its collision thresholds.
    /// # Arguments
    /// * `hostname` - IP address or hostname of the robot.
    /// * `realtime` - if false, the control loop also runs without a real-time kernel.
    pub fn connect(hostname: &str, realtime: bool) -> ControllerResult<Self> {
        let realtime_config = if realtime {
            None
        } else {
            Some(RealtimeConfig::Ignore)
        };
        let mut robot = franka::Robot::new(hostname, realtime_config, None)?;
        robot.set_collision_behavior(
            [100.; 7], [100.; 7], [100.; 7], [100.; 7], [100.; 6], [100.; 6], [100.; 6], [100.; 6],
        )?;
        Ok(FrankaRobot { robot })
    }
}

impl RobotInterface for FrankaRobot {
    type Model = FrankaModel;

    fn read_once(&mut self) -> ControllerResult<RobotState> {
        Ok(convert_state(&self.robot.read_once()?))
    }

    fn load_model(&mut self) -> ControllerResult<FrankaModel> {
        let model = self.robot.load_model(true)?;
        let state = self.robot.read_once()?;
        Ok(FrankaModel {
            model,
            I_total: state.I_total,
            m_total: state.m_total,
            F_x_Ctotal: state.F_x_Ctotal,
            F_T_EE: state.F_T_EE,
            EE_T_K: state.EE_T_K,
        })
    }

    /// libfranka expects a final command for every motion. After a failed cycle the motion is
    /// finished with zero torques and the failure is returned.
    fn control_torques(
        &mut self,
        control_callback: &mut dyn FnMut(&RobotState, &Duration) -> CycleOutcome,
    ) -> ControllerResult<()> {
        let mut failure: Option<ControllerException> = None;
        let result = self.robot.control_torques(
            |state: &franka::RobotState, period: &Duration| -> franka::Torques {
                if failure.is_some() {
                    return franka::Torques::new([0.; 7]).motion_finished();
                }
                match control_callback(&convert_state(state), period) {
                    CycleOutcome::Continue(command) => franka::Torques::new(command.tau_J),
                    CycleOutcome::Succeeded(command) => {
                        franka::Torques::new(command.tau_J).motion_finished()
                    }
                    CycleOutcome::Failed(error) => {
                        // libfranka-rs needs a last command, so the motion ends with zero torques
                        failure = Some(error);
                        franka::Torques::new([0.; 7]).motion_finished()
                    }
                }
            },
            None,
            None,
        );
        match failure {
            Some(error) => Err(ControllerException::ControlException {
                log: None,
                error: Box::new(error),
            }),
            None => Ok(result?),
        }
    }
}

/// Connects to Franka robots by hostname.
#[derive(Debug, Copy, Clone)]
pub struct FrankaConnector {
    pub realtime: bool,
}

impl Default for FrankaConnector {
    fn default() -> Self {
        FrankaConnector { realtime: true }
    }
}

impl RobotConnector for FrankaConnector {
    type Robot = FrankaRobot;

    fn connect(&self, endpoint: &str) -> ControllerResult<FrankaRobot> {
        FrankaRobot::connect(endpoint, self.realtime)
    }
}
