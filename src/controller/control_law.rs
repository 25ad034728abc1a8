// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the Cartesian impedance and force control law.
//!
//! The end effector behaves like a spring-damper system whose equilibrium is the pose at the
//! start of the run. The orientation of the equilibrium oscillates around the x and y axes of the
//! base frame while an integral force controller presses along the negative z axis.
use std::f64::consts::PI;
use std::time::Duration;

use nalgebra::{Isometry3, Matrix3, UnitQuaternion, Vector3};

use crate::controller::control_state::ControlState;
use crate::controller::parameters::{ControllerParameters, ForceGains};
use crate::model::RobotModel;
use crate::robot::robot_state::RobotState;
use crate::utils::{Matrix6, Matrix6x7, Vector6, Vector7};

/// Builds the stiffness matrix and the critically damped damping matrix.
pub fn stiffness_damping(
    translational_stiffness: f64,
    rotational_stiffness: f64,
) -> (Matrix6, Matrix6) {
    let mut stiffness = Matrix6::zeros();
    let mut damping = Matrix6::zeros();
    {
        let mut top_left_corner = stiffness.fixed_view_mut::<3, 3>(0, 0);
        top_left_corner.copy_from(&(Matrix3::identity() * translational_stiffness));
        let mut top_left_corner = damping.fixed_view_mut::<3, 3>(0, 0);
        top_left_corner.copy_from(&(2. * f64::sqrt(translational_stiffness) * Matrix3::identity()));
    }
    {
        let mut bottom_right_corner = stiffness.fixed_view_mut::<3, 3>(3, 3);
        bottom_right_corner.copy_from(&(Matrix3::identity() * rotational_stiffness));
        let mut bottom_right_corner = damping.fixed_view_mut::<3, 3>(3, 3);
        bottom_right_corner
            .copy_from(&(2. * f64::sqrt(rotational_stiffness) * Matrix3::identity()));
    }
    (stiffness, damping)
}

/// Orientation of the equilibrium pose after `elapsed` seconds.
///
/// The wiggle rotation around x is applied first, then the one around y.
pub fn desired_orientation(
    parameters: &ControllerParameters,
    initial_orientation: &UnitQuaternion<f64>,
    elapsed: f64,
) -> UnitQuaternion<f64> {
    let angle_x =
        f64::sin(2. * PI * elapsed * parameters.wiggle_frequency_x) * parameters.wiggle_amplitude_x;
    let angle_y =
        f64::sin(2. * PI * elapsed * parameters.wiggle_frequency_y) * parameters.wiggle_amplitude_y;
    let wiggle_x = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle_x);
    let wiggle_y = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle_y);
    wiggle_y * (wiggle_x * initial_orientation)
}

/// Rotation from the measured to the desired orientation, on the same hemisphere as the desired
/// orientation.
pub fn orientation_error(
    orientation: &UnitQuaternion<f64>,
    orientation_d: &UnitQuaternion<f64>,
) -> UnitQuaternion<f64> {
    let mut orientation = *orientation.quaternion();
    if orientation_d.coords.dot(&orientation.coords) < 0. {
        orientation.coords = -orientation.coords;
    }
    let orientation = UnitQuaternion::new_normalize(orientation);
    orientation.inverse() * orientation_d
}

/// Error of the measured pose to the equilibrium pose.
///
/// The first three entries are the position error, the last three the vector part of the
/// orientation error rotated into the base frame.
pub fn pose_error(
    transform: &Isometry3<f64>,
    position_d: &Vector3<f64>,
    orientation_d: &UnitQuaternion<f64>,
) -> Vector6 {
    let mut error = Vector6::zeros();
    {
        let mut error_head = error.fixed_rows_mut::<3>(0);
        error_head.copy_from(&(transform.translation.vector - position_d));
    }
    let error_quaternion = orientation_error(&transform.rotation, orientation_d);
    {
        let mut error_tail = error.fixed_rows_mut::<3>(3);
        error_tail
            .copy_from(&-(transform.rotation.to_rotation_matrix() * error_quaternion.imag()));
    }
    error
}

/// Desired wrench in base frame: only a force along the negative z axis.
pub fn desired_wrench(desired_force: f64) -> Vector6 {
    let mut wrench = Vector6::zeros();
    wrench[2] = -desired_force;
    wrench
}

/// Force error with the bias of the first measurement removed.
pub fn force_error(desired: &Vector6, measured: &Vector6, initial_bias: &Vector6) -> Vector6 {
    desired - measured + initial_bias
}

/// PI force control restricted to the z force channel.
pub fn force_control(
    desired: &Vector6,
    error: &Vector6,
    integral: &Vector6,
    gains: &ForceGains,
) -> Vector6 {
    let control = desired + gains.k_p * error + gains.k_i * integral;
    let mut force_control = Vector6::zeros();
    force_control[2] = control[2];
    force_control
}

/// Result of one evaluation of the control law.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControlOutput {
    /// Commanded joint torques in \[Nm\].
    pub tau_d: Vector7,
    /// Measured end effector position in base frame in \[m\].
    pub position: Vector3<f64>,
    /// Error to the equilibrium pose.
    pub pose_error: Vector6,
}

/// The control law with the matrices derived from one set of parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlLaw {
    parameters: ControllerParameters,
    stiffness: Matrix6,
    damping: Matrix6,
    desired_wrench: Vector6,
}

impl ControlLaw {
    pub fn new(parameters: &ControllerParameters) -> Self {
        let (stiffness, damping) = stiffness_damping(
            parameters.translational_stiffness,
            parameters.rotational_stiffness,
        );
        ControlLaw {
            parameters: *parameters,
            stiffness,
            damping,
            desired_wrench: desired_wrench(parameters.desired_force),
        }
    }

    pub fn stiffness(&self) -> &Matrix6 {
        &self.stiffness
    }

    pub fn damping(&self) -> &Matrix6 {
        &self.damping
    }

    /// Advances the control state by one period and computes the torque command for it.
    pub fn evaluate<M: RobotModel>(
        &self,
        model: &M,
        robot_state: &RobotState,
        period: &Duration,
        control_state: &mut ControlState,
    ) -> ControlOutput {
        control_state.advance(period);
        let elapsed = control_state.elapsed().as_secs_f64();

        let coriolis: Vector7 = model.coriolis_from_state(robot_state).into();
        let jacobian_array = model.zero_jacobian_from_state(robot_state);
        let jacobian = Matrix6x7::from_column_slice(&jacobian_array);
        let dq = robot_state.joint_velocities();
        let transform = robot_state.end_effector_pose();

        let orientation_d = desired_orientation(
            &self.parameters,
            control_state.initial_orientation(),
            elapsed,
        );
        let error = pose_error(&transform, control_state.initial_position(), &orientation_d);

        let force_error = force_error(
            &self.desired_wrench,
            &robot_state.external_wrench(),
            control_state.initial_wrench(),
        );
        control_state.integrate(period, &force_error);
        let force_control = force_control(
            &self.desired_wrench,
            &force_error,
            control_state.force_error_integral(),
            &self.parameters.force_gains,
        );

        let tau_force: Vector7 = jacobian.transpose() * force_control;
        let tau_cart: Vector7 =
            jacobian.transpose() * (-self.stiffness * error - self.damping * (jacobian * dq));
        ControlOutput {
            tau_d: tau_cart + tau_force + coriolis,
            position: transform.translation.vector,
            pose_error: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion, Vector3};
    use proptest::prelude::*;

    use crate::controller::control_law::{
        desired_orientation, orientation_error, pose_error, stiffness_damping, ControlLaw,
    };
    use crate::controller::control_state::ControlState;
    use crate::controller::parameters::{ControllerParameters, ForceGains};
    use crate::model::MockRobotModel;
    use crate::robot::robot_state::RobotState;
    use crate::robot::sim::SimulatedModel;

    fn parameters_without_wiggle(desired_force: f64) -> ControllerParameters {
        ControllerParameters::new(1000., 30., desired_force, 0.8, 0.5, 0., 0.)
    }

    fn force_only_parameters(k_p: f64, k_i: f64) -> ControllerParameters {
        let mut parameters = ControllerParameters::new(0., 0., 3., 0., 0., 0., 0.);
        parameters.force_gains = ForceGains { k_p, k_i };
        parameters
    }

    fn state_with_wrench(wrench: [f64; 6]) -> RobotState {
        RobotState {
            O_F_ext_hat_K: wrench,
            ..RobotState::from_pose(&Isometry3::identity())
        }
    }

    #[test]
    fn damping_is_critical() {
        let (stiffness, damping) = stiffness_damping(1000., 30.);
        for i in 0..6 {
            let expected = if i < 3 { 1000. } else { 30. };
            assert_eq!(stiffness[(i, i)], expected);
            assert_eq!(damping[(i, i)], 2. * f64::sqrt(expected));
        }
        assert_eq!(damping.fixed_view::<3, 3>(0, 3), Matrix3::zeros());
        assert_eq!(damping.fixed_view::<3, 3>(3, 0), Matrix3::zeros());
        assert_eq!(stiffness.fixed_view::<3, 3>(0, 3), Matrix3::zeros());
    }

    #[test]
    fn wiggle_starts_at_initial_orientation() {
        let parameters = ControllerParameters::default();
        let initial = UnitQuaternion::from_euler_angles(0.1, -0.2, 0.3);
        let desired = desired_orientation(&parameters, &initial, 0.);
        assert!(desired.angle_to(&initial) < 1e-12);
    }

    #[test]
    fn wiggle_applies_x_before_y() {
        let parameters = ControllerParameters::default();
        let elapsed = 0.3;
        let angle_x = f64::sin(2. * std::f64::consts::PI * elapsed * 0.8) * 0.5;
        let angle_y = f64::sin(2. * std::f64::consts::PI * elapsed * 0.5) * 0.8;
        let wiggle_x = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle_x);
        let wiggle_y = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle_y);
        let initial = UnitQuaternion::identity();

        let desired = desired_orientation(&parameters, &initial, elapsed);
        assert!(desired.angle_to(&(wiggle_y * wiggle_x)) < 1e-12);
        assert!(desired.angle_to(&(wiggle_x * wiggle_y)) > 1e-3);
    }

    #[test]
    fn pose_error_of_equilibrium_is_zero() {
        let pose = Isometry3::new(Vector3::new(0.4, 0., 0.3), Vector3::new(3.1, 0., 0.));
        let error = pose_error(&pose, &pose.translation.vector, &pose.rotation);
        assert!(error.norm() < 1e-12);
    }

    #[test]
    fn orientation_error_points_back_to_desired() {
        let pose = Isometry3::from_parts(
            Translation3::new(0., 0., 0.),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.2),
        );
        let error = pose_error(&pose, &Vector3::zeros(), &UnitQuaternion::identity());
        assert_eq!(error.fixed_rows::<3>(0), Vector3::zeros());
        assert!((error[5] - f64::sin(0.1)).abs() < 1e-12);
        assert!(error[3].abs() < 1e-12 && error[4].abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn orientation_error_stays_on_short_path(
            ax in -3.1..3.1f64, ay in -3.1..3.1f64, az in -3.1..3.1f64,
            bx in -3.1..3.1f64, by in -3.1..3.1f64, bz in -3.1..3.1f64,
        ) {
            let measured = UnitQuaternion::from_scaled_axis(Vector3::new(ax, ay, az));
            let desired = UnitQuaternion::from_scaled_axis(Vector3::new(bx, by, bz));
            let error = orientation_error(&measured, &desired);
            prop_assert!(error.w >= -1e-12);
            let flipped = UnitQuaternion::new_unchecked(-*measured.quaternion());
            let flipped_error = orientation_error(&flipped, &desired);
            prop_assert!((flipped_error.coords - error.coords).norm() < 1e-9);
        }
    }

    #[test]
    fn pure_integral_force_torque() {
        let initial_state = RobotState::from_pose(&Isometry3::identity());
        let mut control_state = ControlState::capture(&initial_state);
        let law = ControlLaw::new(&ControllerParameters::new(0., 0., 3., 0., 0., 0., 0.));
        let output = law.evaluate(
            &SimulatedModel::default(),
            &initial_state,
            &Duration::from_millis(1),
            &mut control_state,
        );
        assert!((control_state.force_error_integral()[2] + 0.003).abs() < 1e-15);
        assert!((output.tau_d[2] + 3.003).abs() < 1e-12);
        for i in [0, 1, 3, 4, 5, 6].iter() {
            assert_eq!(output.tau_d[*i], 0.);
        }
    }

    #[test]
    fn torque_combines_spring_and_coriolis() {
        let initial_state = RobotState::from_pose(&Isometry3::translation(0.3, 0., 0.5));
        let mut control_state = ControlState::capture(&initial_state);
        let state = RobotState {
            time: Duration::from_millis(1),
            ..RobotState::from_pose(&Isometry3::translation(0.31, 0., 0.5))
        };
        let jacobian = SimulatedModel::default().jacobian;
        let mut model = MockRobotModel::new();
        model
            .expect_coriolis_from_state()
            .times(1)
            .returning(|_| [0.1; 7]);
        model
            .expect_zero_jacobian_from_state()
            .times(1)
            .returning(move |_| jacobian);

        let law = ControlLaw::new(&parameters_without_wiggle(0.));
        let output = law.evaluate(
            &model,
            &state,
            &Duration::from_millis(1),
            &mut control_state,
        );
        assert!((output.pose_error[0] - 0.01).abs() < 1e-12);
        assert!((output.tau_d[0] + 9.9).abs() < 1e-9);
        for i in 1..7 {
            assert!((output.tau_d[i] - 0.1).abs() < 1e-12);
        }
        assert_eq!(control_state.elapsed(), Duration::from_millis(1));
    }

    #[test]
    fn damping_opposes_motion() {
        let initial_state = RobotState::from_pose(&Isometry3::identity());
        let mut control_state = ControlState::capture(&initial_state);
        let mut state = initial_state;
        state.dq = [0.01, 0., 0., 0., 0., 0., 0.];
        let law = ControlLaw::new(&parameters_without_wiggle(0.));
        let output = law.evaluate(
            &SimulatedModel::default(),
            &state,
            &Duration::from_millis(1),
            &mut control_state,
        );
        assert!((output.tau_d[0] + 2. * f64::sqrt(1000.) * 0.01).abs() < 1e-12);
    }

    #[test]
    fn proportional_gain_acts_on_instant_force_error() {
        let initial_state = RobotState::from_pose(&Isometry3::identity());
        let mut control_state = ControlState::capture(&initial_state);
        let law = ControlLaw::new(&force_only_parameters(2., 0.));
        let output = law.evaluate(
            &SimulatedModel::default(),
            &initial_state,
            &Duration::from_millis(1),
            &mut control_state,
        );
        // desired -3 N plus 2 * (-3 N) error, the integral is ignored
        assert!((output.tau_d[2] + 9.).abs() < 1e-12);
        assert!((control_state.force_error_integral()[2] + 0.003).abs() < 1e-15);
    }

    #[test]
    fn integral_gain_scales_accumulated_error() {
        let initial_state = RobotState::from_pose(&Isometry3::identity());
        let mut control_state = ControlState::capture(&initial_state);
        let law = ControlLaw::new(&force_only_parameters(0., 10.));
        let period = Duration::from_millis(1);
        let model = SimulatedModel::default();
        let first = law.evaluate(&model, &initial_state, &period, &mut control_state);
        let second = law.evaluate(&model, &initial_state, &period, &mut control_state);
        assert!((first.tau_d[2] + 3.03).abs() < 1e-12);
        assert!((second.tau_d[2] + 3.06).abs() < 1e-12);
    }

    #[test]
    fn initial_wrench_is_removed_from_measurement() {
        let initial_state = state_with_wrench([0., 0., -1., 0., 0., 0.]);
        let mut control_state = ControlState::capture(&initial_state);
        let law = ControlLaw::new(&force_only_parameters(1., 0.));
        let output = law.evaluate(
            &SimulatedModel::default(),
            &state_with_wrench([0., 0., -2.5, 0., 0., 0.]),
            &Duration::from_millis(1),
            &mut control_state,
        );
        // error -3 + 2.5 - 1 = -1.5, without the bias it would be -0.5
        assert!((output.tau_d[2] + 4.5).abs() < 1e-12);
        assert!((control_state.force_error_integral()[2] + 0.0015).abs() < 1e-15);
    }

    #[test]
    fn only_z_force_channel_is_commanded() {
        let initial_state = RobotState::from_pose(&Isometry3::identity());
        let mut control_state = ControlState::capture(&initial_state);
        let law = ControlLaw::new(&force_only_parameters(1., 1.));
        let measured = state_with_wrench([0.5, -0.4, 0., 0.2, 0.1, -0.3]);
        let period = Duration::from_millis(1);
        let model = SimulatedModel::default();
        for _ in 0..10 {
            let output = law.evaluate(&model, &measured, &period, &mut control_state);
            for i in [0, 1, 3, 4, 5, 6].iter() {
                assert_eq!(output.tau_d[*i], 0.);
            }
        }
        let integral = control_state.force_error_integral();
        let expected = [-0.005, 0.004, -0.03, -0.002, -0.001, 0.003];
        for (value, expected) in integral.iter().zip(expected.iter()) {
            assert!((value - expected).abs() < 1e-12);
        }
    }
}
