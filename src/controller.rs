// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the plug in controller.
//!
//! A run captures the current end effector pose as equilibrium, then presses the end effector
//! along the negative z axis of the base frame while the equilibrium orientation wiggles around
//! the x and y axes. The run succeeds as soon as the end effector is within the tolerance of the
//! target and fails if this does not happen within the duration.
//!
//! ```no_run
//! use plug_in::controller::{run, ControllerParameters, TaskGoal};
//! use plug_in::robot::sim::SimulatedRobot;
//! # fn main() -> plug_in::ControllerResult<()> {
//! let mut robot = SimulatedRobot::new(nalgebra::Isometry3::identity());
//! run(&mut robot, &ControllerParameters::default(), &TaskGoal::default(), None)?;
//! # Ok(())
//! # }
//! ```
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::exception::{ControllerException, ControllerResult};
use crate::robot::{RobotConnector, RobotInterface};

pub mod control_law;
pub mod control_state;
pub mod parameters;
pub mod plug_in;
pub mod termination;

pub use parameters::{ControllerParameters, ForceGains, TaskGoal};
pub use plug_in::PlugInController;
pub use termination::TerminationState;

/// Requests a running controller to stop at the next control cycle.
///
/// Clones share the same flag, so one clone can be moved into a signal handler.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    requested: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        StopSignal::default()
    }
    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Runs the plug in controller on `robot` until it succeeds, times out or is stopped.
///
/// Parameters and goal are validated before the robot is touched. Blocks for at most the
/// duration of the goal plus one control period.
/// # Errors
/// * [`InvalidParameters`](`ControllerException::InvalidParameters`) if the parameters or the
///   goal are out of range.
/// * [`ControlException`](`ControllerException::ControlException`) wrapping a
///   [`Timeout`](`ControllerException::Timeout`) or [`Stopped`](`ControllerException::Stopped`)
///   if the run did not succeed.
/// * [`ConnectionFault`](`ControllerException::ConnectionFault`) if the robot is lost.
pub fn run<R: RobotInterface>(
    robot: &mut R,
    parameters: &ControllerParameters,
    goal: &TaskGoal,
    stop: Option<StopSignal>,
) -> ControllerResult<()> {
    parameters.validate()?;
    goal.validate()?;
    let model = robot.load_model()?;
    let initial_state = robot.read_once()?;
    let mut controller = PlugInController::new(model, parameters, goal, &initial_state)?;
    if let Some(stop) = stop {
        controller = controller.with_stop_signal(stop);
    }

    info!(?parameters, ?goal, "starting plug in controller");
    let result = robot.control_torques(&mut |state, period| controller.step(state, period));
    let elapsed = controller.control_state().elapsed().as_secs_f64();
    match &result {
        Ok(()) => info!(elapsed, "plug in controller succeeded"),
        Err(exception) => match exception.cause() {
            ControllerException::Timeout { .. } => warn!(elapsed, "{}", exception),
            ControllerException::Stopped { .. } => info!(elapsed, "{}", exception),
            _ => error!(elapsed, "plug in controller aborted: {}", exception),
        },
    }
    result
}

/// Connects to the robot at `endpoint` and calls [`run`] on it.
pub fn connect_and_run<C: RobotConnector>(
    connector: &C,
    endpoint: &str,
    parameters: &ControllerParameters,
    goal: &TaskGoal,
    stop: Option<StopSignal>,
) -> ControllerResult<()> {
    let mut robot = connector.connect(endpoint).map_err(|exception| {
        error!(endpoint, "could not connect to robot: {}", exception);
        exception
    })?;
    run(&mut robot, parameters, goal, stop)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nalgebra::{Isometry3, Vector3};

    use crate::controller::{connect_and_run, run, ControllerParameters, StopSignal, TaskGoal};
    use crate::exception::ControllerException;
    use crate::robot::control_types::Finishable;
    use crate::robot::sim::{SimulatedConnector, SimulatedModel, SimulatedRobot};
    use crate::robot::RobotInterface;

    fn standalone_parameters() -> ControllerParameters {
        ControllerParameters::new(1000., 30., 3., 0.8, 0.5, 0.5, 0.8)
    }

    #[test]
    fn succeeds_in_first_cycle_when_already_at_target() {
        let mut robot = SimulatedRobot::new(Isometry3::identity());
        let goal = TaskGoal::new(5., [0.; 3], [0.; 3]);
        run(&mut robot, &standalone_parameters(), &goal, None).unwrap();
        let commands = robot.sent_commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].is_finished());
        // only the pressing force acts, the spring is at rest
        assert!((commands[0].tau_J[2] + 3.).abs() < 1e-12);
        assert_eq!(commands[0].tau_J[0], 0.);
        assert_eq!(commands[0].tau_J[1], 0.);
    }

    #[test]
    fn first_command_uses_wrench_bias_damping_and_model() {
        let model = SimulatedModel {
            coriolis: [0.2; 7],
            ..SimulatedModel::default()
        };
        let mut robot = SimulatedRobot::new(Isometry3::identity())
            .with_external_wrench([0.5, 0., -2., 0.1, 0., 0.])
            .with_joint_velocities([0., 0., 0.01, 0., 0., 0., 0.])
            .with_model(model);
        let mut parameters = standalone_parameters();
        parameters.force_gains.k_p = 1.;
        let goal = TaskGoal::new(5., [0.; 3], [0.; 3]);
        run(&mut robot, &parameters, &goal, None).unwrap();

        let commands = robot.sent_commands();
        assert_eq!(commands.len(), 1);
        // the constant wrench is the bias, so the force error is the full -3 N
        let expected_z = -3. - 3. - 2. * f64::sqrt(1000.) * 0.01 + 0.2;
        assert!((commands[0].tau_J[2] - expected_z).abs() < 1e-12);
        for i in [0, 1, 3, 4, 5, 6].iter() {
            assert!((commands[0].tau_J[*i] - 0.2).abs() < 1e-12);
        }
    }

    #[test]
    fn times_out_when_target_is_never_reached() {
        let mut robot = SimulatedRobot::new(Isometry3::translation(0.4, 0., 0.3));
        let goal = TaskGoal::new(5., [0.; 3], [0.; 3]);
        let result = run(&mut robot, &standalone_parameters(), &goal, None);
        let exception = result.unwrap_err();
        match exception.cause() {
            ControllerException::Timeout {
                elapsed,
                duration,
                position_error,
                ..
            } => {
                assert!(*elapsed > *duration);
                assert!((elapsed - 5.001).abs() < 1e-9);
                assert!((position_error[0] - 0.4).abs() < 1e-12);
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
        assert!(exception.to_string().starts_with("Timeout"));
        let commands = robot.sent_commands();
        assert_eq!(commands.len(), 5001);
        assert!(commands.iter().all(|command| !command.is_finished()));
        assert!(!robot.is_motion_running());
    }

    #[test]
    fn descends_onto_the_target() {
        let mut robot = SimulatedRobot::new(Isometry3::translation(0.4, 0., 0.3))
            .with_velocity(Vector3::new(0., 0., -0.1));
        let goal = TaskGoal::new(5., [0.4, 0., 0.2], [0.001, 0.001, 0.001]);
        run(&mut robot, &standalone_parameters(), &goal, None).unwrap();
        assert!(robot.state().time < Duration::from_secs(1));
        assert!((robot.state().position()[2] - 0.2).abs() <= 0.001);
        let last = robot.sent_commands().last().unwrap();
        assert!(last.is_finished());
    }

    #[test]
    fn stop_request_aborts_without_commands() {
        let mut robot = SimulatedRobot::new(Isometry3::translation(0.4, 0., 0.3));
        let stop = StopSignal::new();
        stop.request_stop();
        let result = run(
            &mut robot,
            &standalone_parameters(),
            &TaskGoal::default(),
            Some(stop),
        );
        assert!(matches!(
            result.unwrap_err().cause(),
            ControllerException::Stopped { .. }
        ));
        assert!(robot.sent_commands().is_empty());
    }

    #[test]
    fn invalid_parameters_leave_the_robot_untouched() {
        let mut robot = SimulatedRobot::new(Isometry3::identity()).with_connection_loss_after(0);
        let mut parameters = standalone_parameters();
        parameters.translational_stiffness = 2500.;
        let result = run(&mut robot, &parameters, &TaskGoal::default(), None);
        assert!(matches!(
            result,
            Err(ControllerException::InvalidParameters { .. })
        ));
        assert!(robot.sent_commands().is_empty());
    }

    #[test]
    fn connection_loss_aborts_the_run() {
        let mut robot =
            SimulatedRobot::new(Isometry3::translation(0.4, 0., 0.3)).with_connection_loss_after(10);
        let result = run(&mut robot, &standalone_parameters(), &TaskGoal::default(), None);
        assert!(matches!(
            result,
            Err(ControllerException::ConnectionFault { .. })
        ));
        assert!(robot.read_once().is_err());
    }

    #[test]
    fn connect_and_run_resolves_the_endpoint() {
        let connector = SimulatedConnector::new(SimulatedRobot::new(Isometry3::identity()));
        let goal = TaskGoal::default();
        assert!(connect_and_run(&connector, "sim", &standalone_parameters(), &goal, None).is_ok());
        assert!(matches!(
            connect_and_run(&connector, "", &standalone_parameters(), &goal, None),
            Err(ControllerException::ConnectionFault { .. })
        ));
    }
}
