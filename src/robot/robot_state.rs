// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the RobotState type.
use std::time::Duration;

use crate::utils::{array_to_isometry, isometry_to_array, Vector6, Vector7};
use nalgebra::{Isometry3, Vector3};

/// Describes the part of the robot state the plug in controller reads every cycle.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[allow(non_snake_case)]
pub struct RobotState {
    /// ![^{O}T_{EE}](https://latex.codecogs.com/png.latex?^{O}T_{EE})
    ///
    /// Measured end effector pose in base frame.
    /// Pose is represented as a 4x4 matrix in column-major format.
    pub O_T_EE: [f64; 16],
    /// ![^OF_{K,\text{ext}}](https://latex.codecogs.com/png.latex?^OF_{K,\text{ext}})
    ///
    /// Estimated external wrench (force, torque) acting on stiffness frame, expressed
    /// relative to the base frame.
    /// Unit: \[N,N,N,Nm,Nm,Nm\].
    pub O_F_ext_hat_K: [f64; 6],
    /// ![q](https://latex.codecogs.com/png.latex?q)
    ///
    /// Measured joint position. Unit: \[rad\]
    pub q: [f64; 7],
    /// ![\dot{q}](https://latex.codecogs.com/png.latex?\dot{q})
    ///
    /// Measured joint velocity. Unit: \[rad/s\]
    pub dq: [f64; 7],
    /// Strictly monotonically increasing timestamp since robot start.
    ///
    /// Inside of control loops the "period" parameter of the control callback can be used
    /// instead
    pub time: Duration,
}

impl RobotState {
    /// Creates a robot state at rest with the end effector at the given pose.
    pub fn from_pose(pose: &Isometry3<f64>) -> Self {
        RobotState {
            O_T_EE: isometry_to_array(pose),
            ..Default::default()
        }
    }
    /// Measured end effector pose in base frame.
    pub fn end_effector_pose(&self) -> Isometry3<f64> {
        array_to_isometry(&self.O_T_EE)
    }
    /// Measured end effector position in base frame. Unit: \[m\]
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.O_T_EE[12], self.O_T_EE[13], self.O_T_EE[14])
    }
    /// Estimated external wrench in base frame.
    pub fn external_wrench(&self) -> Vector6 {
        Vector6::from_column_slice(&self.O_F_ext_hat_K)
    }
    /// Measured joint velocity.
    pub fn joint_velocities(&self) -> Vector7 {
        Vector7::from_column_slice(&self.dq)
    }
}
