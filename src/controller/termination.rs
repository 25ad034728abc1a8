// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use std::time::Duration;

use nalgebra::Vector3;

use crate::controller::parameters::TaskGoal;
use crate::exception::{ControllerException, ControllerResult};

/// Progress of the plug in task. Succeeded and Failed are terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TerminationState {
    Running,
    Succeeded,
    Failed,
}

/// Decides after every cycle whether the plug is inserted or the time is up.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminationCheck {
    target_position: Vector3<f64>,
    tolerance: Vector3<f64>,
    duration: Duration,
    state: TerminationState,
}

impl TerminationCheck {
    pub fn new(goal: &TaskGoal) -> ControllerResult<Self> {
        let duration = goal.validate()?;
        Ok(TerminationCheck {
            target_position: Vector3::from(goal.target_position),
            tolerance: Vector3::from(goal.tolerance),
            duration,
            state: TerminationState::Running,
        })
    }

    /// Absolute distance to the target per axis.
    pub fn target_error(&self, position: &Vector3<f64>) -> Vector3<f64> {
        (self.target_position - position).abs()
    }

    /// true if every axis is within its tolerance
    pub fn is_within_tolerance(&self, position: &Vector3<f64>) -> bool {
        self.target_error(position)
            .iter()
            .zip(self.tolerance.iter())
            .all(|(error, tolerance)| error <= tolerance)
    }

    /// Evaluates the termination condition for the current cycle.
    ///
    /// Success takes precedence: it requires the elapsed time to be within the duration, so it
    /// can never coincide with a timeout. Once a terminal state is reached it is kept.
    pub fn check(&mut self, elapsed: Duration, position: &Vector3<f64>) -> TerminationState {
        if self.state != TerminationState::Running {
            return self.state;
        }
        if elapsed <= self.duration && self.is_within_tolerance(position) {
            self.state = TerminationState::Succeeded;
        } else if elapsed > self.duration {
            self.state = TerminationState::Failed;
        }
        self.state
    }

    pub fn state(&self) -> TerminationState {
        self.state
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Describes a timeout at the given time and position.
    pub fn timeout_error(&self, elapsed: Duration, position: &Vector3<f64>) -> ControllerException {
        ControllerException::Timeout {
            elapsed: elapsed.as_secs_f64(),
            duration: self.duration.as_secs_f64(),
            position_error: self.target_error(position).into(),
            tolerance: self.tolerance.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nalgebra::Vector3;

    use crate::controller::parameters::TaskGoal;
    use crate::controller::termination::{TerminationCheck, TerminationState};
    use crate::exception::ControllerException;

    fn check() -> TerminationCheck {
        TerminationCheck::new(&TaskGoal::new(5., [0.5, 0., 0.2], [0.01, 0.01, 0.005])).unwrap()
    }

    #[test]
    fn keeps_running_until_target_or_deadline() {
        let mut check = check();
        let far = Vector3::new(0.5, 0., 0.3);
        assert_eq!(
            check.check(Duration::from_millis(1), &far),
            TerminationState::Running
        );
        assert_eq!(check.check(Duration::from_secs(5), &far), TerminationState::Running);
    }

    #[test]
    fn succeeds_when_every_axis_is_within_tolerance() {
        let mut check = check();
        assert!(!check.is_within_tolerance(&Vector3::new(0.5, 0.02, 0.2)));
        assert_eq!(
            check.check(Duration::from_secs(1), &Vector3::new(0.509, -0.005, 0.204)),
            TerminationState::Succeeded
        );
    }

    #[test]
    fn success_at_the_deadline_beats_timeout() {
        let mut check = check();
        let target = Vector3::new(0.5, 0., 0.2);
        assert_eq!(
            check.check(Duration::from_secs(5), &target),
            TerminationState::Succeeded
        );
    }

    #[test]
    fn reaching_the_target_after_the_deadline_is_a_timeout() {
        let mut check = check();
        let target = Vector3::new(0.5, 0., 0.2);
        assert_eq!(
            check.check(Duration::from_millis(5001), &target),
            TerminationState::Failed
        );
    }

    #[test]
    fn terminal_states_are_kept() {
        let mut succeeded = check();
        succeeded.check(Duration::from_secs(1), &Vector3::new(0.5, 0., 0.2));
        assert_eq!(
            succeeded.check(Duration::from_secs(6), &Vector3::zeros()),
            TerminationState::Succeeded
        );

        let mut failed = check();
        failed.check(Duration::from_secs(6), &Vector3::zeros());
        assert_eq!(
            failed.check(Duration::from_secs(1), &Vector3::new(0.5, 0., 0.2)),
            TerminationState::Failed
        );
        assert_eq!(failed.state(), TerminationState::Failed);
    }

    #[test]
    fn timeout_reports_position_error() {
        let check = check();
        match check.timeout_error(Duration::from_millis(5001), &Vector3::new(0.5, 0.1, 0.)) {
            ControllerException::Timeout {
                elapsed,
                duration,
                position_error,
                tolerance,
            } => {
                assert!((elapsed - 5.001).abs() < 1e-12);
                assert_eq!(duration, 5.);
                assert!((position_error[1] - 0.1).abs() < 1e-15);
                assert!((position_error[2] - 0.2).abs() < 1e-15);
                assert_eq!(tolerance, [0.01, 0.01, 0.005]);
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
    }

    #[test]
    fn invalid_goal_is_rejected() {
        assert!(matches!(
            TerminationCheck::new(&TaskGoal::new(f64::NAN, [0.; 3], [0.; 3])),
            Err(ControllerException::InvalidParameters { .. })
        ));
    }
}
