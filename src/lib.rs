// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! # plug-in-controller
//! plug-in-controller inserts a plug held by a robot into a socket. It drives the end effector
//! into compliant contact with the socket surface and wiggles it until the plug slides in.
//!
//! **ALWAYS HAVE THE USER STOP BUTTON AT
//! HAND WHILE CONTROLLING THE ROBOT!**
//!
//! ## Design
//! The controller is a Cartesian impedance controller with an integral force controller along
//! the z axis of the base frame. Every control cycle it
//! * reads the robot state and asks the [`RobotModel`](`crate::model::RobotModel`) for the
//!   Coriolis vector and the Jacobian,
//! * composes the equilibrium orientation with two wiggle rotations around x and y,
//! * computes the joint torques from the pose error, the force error and its integral,
//! * checks whether the end effector is within the tolerance of the target or the time is up.
//!
//! The crate is divided into the following modules:
//! * [controller](`crate::controller`) - the control law, the termination check and [`run`](`crate::controller::run`).
//! * [robot](`crate::robot`) - the robot interface and its backends (simulated and, with the
//!   `franka` feature, Franka Emika robots).
//! * [random_search](`crate::random_search`) - a random search optimizer for the parameters.
//! * [service](`crate::service`) - request and response messages of the `fci` and `learning`
//!   services.
//! * [config](`crate::config`) - TOML configuration of a run.
//!
//! # Example:
//!```no_run
//! use nalgebra::Isometry3;
//! use plug_in::controller::{run, ControllerParameters, StopSignal, TaskGoal};
//! use plug_in::robot::sim::SimulatedRobot;
//! use plug_in::ControllerResult;
//! fn main() -> ControllerResult<()> {
//!     let mut robot = SimulatedRobot::new(Isometry3::translation(0.4, 0., 0.3));
//!     let parameters = ControllerParameters::default();
//!     let goal = TaskGoal::new(5., [0.4, 0., 0.25], [0.001, 0.001, 0.002]);
//!     run(&mut robot, &parameters, &goal, Some(StopSignal::new()))
//! }
//!```
//! [`run`](`crate::controller::run`) returns Ok(()) once the plug is inserted. A timeout is
//! returned as [`Timeout`](`ControllerException::Timeout`) inside a
//! [`ControlException`](`ControllerException::ControlException`) which also carries the last
//! states and commands of the control loop.

pub mod config;
pub mod controller;
pub mod exception;
pub mod model;
pub mod random_search;
pub mod robot;
pub mod service;
pub mod utils;

pub use config::PlugInConfig;
pub use controller::{ControllerParameters, PlugInController, StopSignal, TaskGoal};
pub use exception::{ControllerException, ControllerResult};
pub use model::RobotModel;
pub use robot::control_types::{CycleOutcome, Finishable, Torques};
pub use robot::logger::Record;
pub use robot::robot_state::RobotState;
pub use robot::{RobotConnector, RobotInterface};
pub use utils::*;
