// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains a kinematic stand-in for a robot.
//!
//! The simulated robot does not integrate any dynamics. Its end effector follows a constant
//! Cartesian velocity once a torque control loop is running, which is enough to drive the
//! controller into both of its terminal states in a deterministic way.
use std::time::Duration;

use nalgebra::{Isometry3, Vector3};

use crate::exception::{ControllerException, ControllerResult};
use crate::model::RobotModel;
use crate::robot::control_loop::ControlLoop;
use crate::robot::control_types::{CycleOutcome, Torques};
use crate::robot::robot_control::RobotControl;
use crate::robot::robot_state::RobotState;
use crate::robot::{RobotConnector, RobotInterface};

/// Model of the simulated robot with constant Jacobian and Coriolis vector.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SimulatedModel {
    /// Vectorized 6x7 Jacobian, column-major.
    pub jacobian: [f64; 42],
    /// Coriolis force vector in \[Nm\].
    pub coriolis: [f64; 7],
}

impl Default for SimulatedModel {
    /// identity in the first six joints, the seventh joint rotates around z
    fn default() -> Self {
        let mut jacobian = [0.; 42];
        for i in 0..6 {
            jacobian[i * 6 + i] = 1.;
        }
        jacobian[6 * 6 + 5] = 1.;
        SimulatedModel {
            jacobian,
            coriolis: [0.; 7],
        }
    }
}

impl RobotModel for SimulatedModel {
    fn coriolis_from_state(&self, _robot_state: &RobotState) -> [f64; 7] {
        self.coriolis
    }

    fn zero_jacobian_from_state(&self, _robot_state: &RobotState) -> [f64; 42] {
        self.jacobian
    }
}

/// A simulated robot with a fixed control period.
#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    state: RobotState,
    period: Duration,
    velocity: Vector3<f64>,
    model: SimulatedModel,
    log_size: usize,
    connection_loss_after: Option<usize>,
    updates: usize,
    motion_id: u32,
    motion_running: bool,
    sent_commands: Vec<Torques>,
}

impl SimulatedRobot {
    /// Creates a robot at rest with its end effector at `pose` and a period of 1 ms.
    pub fn new(pose: Isometry3<f64>) -> Self {
        SimulatedRobot {
            state: RobotState::from_pose(&pose),
            period: Duration::from_millis(1),
            velocity: Vector3::zeros(),
            model: SimulatedModel::default(),
            log_size: 50,
            connection_loss_after: None,
            updates: 0,
            motion_id: 0,
            motion_running: false,
            sent_commands: Vec::new(),
        }
    }
    /// Sets the control period.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }
    /// Sets the Cartesian velocity of the end effector while torques are commanded. Unit: \[m/s\]
    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }
    /// Sets the measured external wrench. Unit: \[N,N,N,Nm,Nm,Nm\]
    pub fn with_external_wrench(mut self, wrench: [f64; 6]) -> Self {
        self.state.O_F_ext_hat_K = wrench;
        self
    }
    /// Sets the measured joint velocities. Unit: \[rad/s\]
    pub fn with_joint_velocities(mut self, dq: [f64; 7]) -> Self {
        self.state.dq = dq;
        self
    }
    /// Sets the model returned by [`load_model`](`RobotInterface::load_model`).
    pub fn with_model(mut self, model: SimulatedModel) -> Self {
        self.model = model;
        self
    }
    /// Sets how many cycles are kept for the log of a failed control loop.
    pub fn with_log_size(mut self, log_size: usize) -> Self {
        self.log_size = log_size;
        self
    }
    /// The connection breaks after the given number of state updates.
    pub fn with_connection_loss_after(mut self, updates: usize) -> Self {
        self.connection_loss_after = Some(updates);
        self
    }
    /// Current state of the robot.
    pub fn state(&self) -> &RobotState {
        &self.state
    }
    /// All commands the robot received so far, including final commands.
    pub fn sent_commands(&self) -> &[Torques] {
        &self.sent_commands
    }
    /// true while a motion is running
    pub fn is_motion_running(&self) -> bool {
        self.motion_running
    }

    fn check_connection(&self) -> ControllerResult<()> {
        match self.connection_loss_after {
            Some(limit) if self.updates >= limit => Err(ControllerException::ConnectionFault {
                message: format!(
                    "Connection to simulated robot lost after {} state updates",
                    self.updates
                ),
            }),
            _ => Ok(()),
        }
    }

    fn step(&mut self) {
        self.state.time += self.period;
        let displacement = self.velocity * self.period.as_secs_f64();
        for i in 0..3 {
            self.state.O_T_EE[12 + i] += displacement[i];
        }
    }
}

impl RobotControl for SimulatedRobot {
    fn start_motion(&mut self) -> ControllerResult<u32> {
        if self.motion_running {
            return Err(ControllerException::CommandException {
                message: "Cannot start a motion while another motion is running".to_string(),
            });
        }
        self.motion_id += 1;
        self.motion_running = true;
        Ok(self.motion_id)
    }

    fn update(&mut self, control_command: Option<&Torques>) -> ControllerResult<RobotState> {
        self.check_connection()?;
        self.updates += 1;
        if let Some(command) = control_command {
            if !self.motion_running {
                return Err(ControllerException::CommandException {
                    message: "Trying to send control command, but no motion is running!"
                        .to_string(),
                });
            }
            self.sent_commands.push(*command);
            self.step();
        }
        Ok(self.state)
    }

    fn finish_motion(&mut self, motion_id: u32, control_command: &Torques) -> ControllerResult<()> {
        if !self.motion_running || motion_id != self.motion_id {
            return Err(ControllerException::CommandException {
                message: format!("Motion {} is not running", motion_id),
            });
        }
        self.sent_commands.push(*control_command);
        self.motion_running = false;
        Ok(())
    }

    fn cancel_motion(&mut self, motion_id: u32) {
        if motion_id == self.motion_id {
            self.motion_running = false;
        }
    }
}

impl RobotInterface for SimulatedRobot {
    type Model = SimulatedModel;

    fn read_once(&mut self) -> ControllerResult<RobotState> {
        self.check_connection()?;
        Ok(self.state)
    }

    fn load_model(&mut self) -> ControllerResult<SimulatedModel> {
        self.check_connection()?;
        Ok(self.model)
    }

    fn control_torques(
        &mut self,
        control_callback: &mut dyn FnMut(&RobotState, &Duration) -> CycleOutcome,
    ) -> ControllerResult<()> {
        let log_size = self.log_size;
        let mut control_loop = ControlLoop::new(self, control_callback, log_size)?;
        control_loop.run()
    }
}

/// Hands out copies of a template robot for every non-empty endpoint.
#[derive(Debug, Clone)]
pub struct SimulatedConnector {
    template: SimulatedRobot,
}

impl SimulatedConnector {
    pub fn new(template: SimulatedRobot) -> Self {
        SimulatedConnector { template }
    }
}

impl RobotConnector for SimulatedConnector {
    type Robot = SimulatedRobot;

    fn connect(&self, endpoint: &str) -> ControllerResult<SimulatedRobot> {
        if endpoint.trim().is_empty() {
            return Err(ControllerException::ConnectionFault {
                message: "Connection refused: no robot endpoint given".to_string(),
            });
        }
        Ok(self.template.clone())
    }
}
