// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains helper types for returning joint-level torque commands and cycle outcomes.

use serde::Deserialize;
use serde::Serialize;

use crate::exception::ControllerException;
use crate::utils::Vector7;

pub trait Finishable {
    /// Determines whether to finish a currently running motion.
    fn is_finished(&self) -> bool;
    /// Sets the attribute which decide if the currently running motion should be finished
    fn set_motion_finished(&mut self, finished: bool);
    /// Helper method to indicate that a motion should stop after processing the given command.
    fn motion_finished(self) -> Self;
}

/// Stores joint-level torque commands without gravity and friction.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[allow(non_snake_case)]
pub struct Torques {
    motion_finished: bool,
    /// Desired torques in \[Nm\].
    pub tau_J: [f64; 7],
}

impl From<Vector7> for Torques {
    fn from(vector: Vector7) -> Self {
        Torques::new(vector.into())
    }
}

impl Torques {
    /// Creates a new Torques instance
    /// # Arguments
    /// * `torques` - Desired joint-level torques without gravity and friction in \[Nm\].
    pub fn new(torques: [f64; 7]) -> Self {
        Torques {
            tau_J: torques,
            motion_finished: false,
        }
    }
    /// true if all torques are finite numbers
    pub fn is_finite(&self) -> bool {
        self.tau_J.iter().all(|x| x.is_finite())
    }
}

impl Finishable for Torques {
    fn is_finished(&self) -> bool {
        self.motion_finished
    }
    fn set_motion_finished(&mut self, finished: bool) {
        self.motion_finished = finished;
    }
    fn motion_finished(mut self) -> Self {
        self.set_motion_finished(true);
        self
    }
}

/// Result of one evaluation of a control cycle.
///
/// The robot backend keeps calling the cycle function as long as it returns
/// [`Continue`](`Self::Continue`).
#[derive(Debug)]
pub enum CycleOutcome {
    /// Send the torques and keep the loop running.
    Continue(Torques),
    /// Send the torques as the last command and finish the motion.
    Succeeded(Torques),
    /// Stop the loop without sending a command and report the error.
    Failed(ControllerException),
}

impl CycleOutcome {
    /// true if the loop ends after this outcome
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CycleOutcome::Continue(_))
    }
}
