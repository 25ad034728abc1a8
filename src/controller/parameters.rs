// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the per-run configuration of the plug in controller.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::exception::{create_invalid_parameters, ControllerResult};

/// Upper bound of the translational stiffness in \[N/m\].
pub const MAX_TRANSLATIONAL_STIFFNESS: f64 = 2000.;
/// Upper bound of the rotational stiffness in \[Nm/rad\].
pub const MAX_ROTATIONAL_STIFFNESS: f64 = 300.;

/// Gains of the force controller acting along the z axis of the base frame.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct ForceGains {
    /// Proportional gain.
    pub k_p: f64,
    /// Integral gain.
    pub k_i: f64,
}

impl Default for ForceGains {
    fn default() -> Self {
        ForceGains { k_p: 0., k_i: 1. }
    }
}

/// Parameters of the impedance controller and the wiggle motion.
///
/// The parameters are fixed for the duration of one run.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct ControllerParameters {
    /// Translational stiffness in \[N/m\], within \[0, 2000\].
    pub translational_stiffness: f64,
    /// Rotational stiffness in \[Nm/rad\], within \[0, 300\].
    pub rotational_stiffness: f64,
    /// Force pressing the end effector along the negative z axis in \[N\].
    pub desired_force: f64,
    /// Frequency of the wiggle motion around the x axis in \[Hz\].
    pub wiggle_frequency_x: f64,
    /// Frequency of the wiggle motion around the y axis in \[Hz\].
    pub wiggle_frequency_y: f64,
    /// Amplitude of the wiggle motion around the x axis in \[rad\].
    pub wiggle_amplitude_x: f64,
    /// Amplitude of the wiggle motion around the y axis in \[rad\].
    pub wiggle_amplitude_y: f64,
    pub force_gains: ForceGains,
}

impl Default for ControllerParameters {
    fn default() -> Self {
        ControllerParameters {
            translational_stiffness: 1000.,
            rotational_stiffness: 30.,
            desired_force: 3.,
            wiggle_frequency_x: 0.8,
            wiggle_frequency_y: 0.5,
            wiggle_amplitude_x: 0.5,
            wiggle_amplitude_y: 0.8,
            force_gains: ForceGains::default(),
        }
    }
}

fn check_non_negative(name: &str, value: f64) -> ControllerResult<()> {
    if !value.is_finite() || value < 0. {
        return Err(create_invalid_parameters(format!(
            "{} must be finite and non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_upper_bound(name: &str, value: f64, max: f64) -> ControllerResult<()> {
    check_non_negative(name, value)?;
    if value > max {
        return Err(create_invalid_parameters(format!(
            "{} must be at most {}, got {}",
            name, max, value
        )));
    }
    Ok(())
}

impl ControllerParameters {
    /// Creates parameters with the default force gains.
    pub fn new(
        translational_stiffness: f64,
        rotational_stiffness: f64,
        desired_force: f64,
        wiggle_frequency_x: f64,
        wiggle_frequency_y: f64,
        wiggle_amplitude_x: f64,
        wiggle_amplitude_y: f64,
    ) -> Self {
        ControllerParameters {
            translational_stiffness,
            rotational_stiffness,
            desired_force,
            wiggle_frequency_x,
            wiggle_frequency_y,
            wiggle_amplitude_x,
            wiggle_amplitude_y,
            force_gains: ForceGains::default(),
        }
    }

    /// Checks that all parameters are finite, non-negative and that the stiffnesses lie within
    /// their bounds.
    pub fn validate(&self) -> ControllerResult<()> {
        check_upper_bound(
            "translational stiffness",
            self.translational_stiffness,
            MAX_TRANSLATIONAL_STIFFNESS,
        )?;
        check_upper_bound(
            "rotational stiffness",
            self.rotational_stiffness,
            MAX_ROTATIONAL_STIFFNESS,
        )?;
        check_non_negative("desired force", self.desired_force)?;
        check_non_negative("wiggle frequency x", self.wiggle_frequency_x)?;
        check_non_negative("wiggle frequency y", self.wiggle_frequency_y)?;
        check_non_negative("wiggle amplitude x", self.wiggle_amplitude_x)?;
        check_non_negative("wiggle amplitude y", self.wiggle_amplitude_y)?;
        check_non_negative("k_p", self.force_gains.k_p)?;
        check_non_negative("k_i", self.force_gains.k_i)
    }

    /// Parameters in the order used by the learning service.
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.translational_stiffness,
            self.rotational_stiffness,
            self.desired_force,
            self.wiggle_frequency_x,
            self.wiggle_frequency_y,
            self.wiggle_amplitude_x,
            self.wiggle_amplitude_y,
        ]
    }

    /// Inverse of [`to_vec`](`Self::to_vec`). The force gains keep their defaults.
    pub fn from_slice(values: &[f64]) -> ControllerResult<Self> {
        match *values {
            [translational_stiffness, rotational_stiffness, desired_force, wiggle_frequency_x, wiggle_frequency_y, wiggle_amplitude_x, wiggle_amplitude_y] => {
                Ok(ControllerParameters::new(
                    translational_stiffness,
                    rotational_stiffness,
                    desired_force,
                    wiggle_frequency_x,
                    wiggle_frequency_y,
                    wiggle_amplitude_x,
                    wiggle_amplitude_y,
                ))
            }
            _ => Err(create_invalid_parameters(format!(
                "expected 7 controller parameters, got {}",
                values.len()
            ))),
        }
    }
}

/// Where the end effector has to end up and how long it may take.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct TaskGoal {
    /// Time budget in \[s\].
    pub duration: f64,
    /// Target position of the end effector in base frame in \[m\].
    pub target_position: [f64; 3],
    /// Allowed absolute deviation from the target per axis in \[m\].
    pub tolerance: [f64; 3],
}

impl Default for TaskGoal {
    fn default() -> Self {
        TaskGoal {
            duration: 5.,
            target_position: [0.; 3],
            tolerance: [0.; 3],
        }
    }
}

impl TaskGoal {
    pub fn new(duration: f64, target_position: [f64; 3], tolerance: [f64; 3]) -> Self {
        TaskGoal {
            duration,
            target_position,
            tolerance,
        }
    }

    /// Checks the goal and returns the duration budget.
    pub fn validate(&self) -> ControllerResult<Duration> {
        check_non_negative("duration", self.duration)?;
        if self.target_position.iter().any(|x| !x.is_finite()) {
            return Err(create_invalid_parameters(format!(
                "target position must be finite, got {:?}",
                self.target_position
            )));
        }
        for tolerance in self.tolerance.iter() {
            check_non_negative("tolerance", *tolerance)?;
        }
        Duration::try_from_secs_f64(self.duration).map_err(|error| {
            create_invalid_parameters(format!("duration {} s: {}", self.duration, error))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::controller::parameters::{ControllerParameters, ForceGains, TaskGoal};
    use crate::exception::ControllerException;

    #[test]
    fn defaults_are_valid() {
        let parameters = ControllerParameters::default();
        assert!(parameters.validate().is_ok());
        assert_eq!(parameters.force_gains, ForceGains { k_p: 0., k_i: 1. });
        assert_eq!(
            TaskGoal::default().validate().unwrap(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn stiffness_bounds_are_enforced() {
        let mut parameters = ControllerParameters::default();
        parameters.translational_stiffness = 2000.;
        parameters.rotational_stiffness = 300.;
        assert!(parameters.validate().is_ok());
        parameters.translational_stiffness = 2000.5;
        assert!(matches!(
            parameters.validate(),
            Err(ControllerException::InvalidParameters { .. })
        ));
        parameters.translational_stiffness = 1000.;
        parameters.rotational_stiffness = 301.;
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn negative_or_nan_values_are_rejected() {
        let mut parameters = ControllerParameters::default();
        parameters.desired_force = -1.;
        assert!(parameters.validate().is_err());
        parameters.desired_force = 3.;
        parameters.wiggle_amplitude_y = f64::NAN;
        assert!(parameters.validate().is_err());

        assert!(TaskGoal::new(-0.1, [0.; 3], [0.; 3]).validate().is_err());
        assert!(TaskGoal::new(1., [0., f64::INFINITY, 0.], [0.; 3])
            .validate()
            .is_err());
        let error = TaskGoal::new(1., [0.; 3], [0., -0.01, 0.])
            .validate()
            .unwrap_err();
        assert!(error.to_string().starts_with("Invalid parameters: tolerance"));
    }

    #[test]
    fn parameters_round_trip_through_slices() {
        let parameters = ControllerParameters::new(500., 20., 2., 1., 0.5, 0.1, 0.2);
        assert_eq!(
            ControllerParameters::from_slice(&parameters.to_vec()).unwrap(),
            parameters
        );
        assert!(ControllerParameters::from_slice(&[1., 2.]).is_err());
    }
}
