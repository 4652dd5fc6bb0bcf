#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for discrete-command 2D rover kinematics."]
#![doc = ""]
#![doc = "This crate provides the robot pose and heading normalization, the discrete"]
#![doc = "command set, world-frame and body-frame pose update policies, and"]
#![doc = "differential-drive kinematics for wheel-driven robots."]

use core::f64::consts::{PI, TAU};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod command;
pub mod error;
pub mod policy;

pub use command::{Command, ParseCommandError};
pub use error::KinematicsError;
pub use policy::{BodyFrame, PoseUpdate, WorldFrame};

/// A 2‑D pose `(x, y, θ)` in meters and radians (θ measured counter‑clockwise
/// from the x‑axis in the world frame).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// World‑frame x position (m).
    pub x: f64,
    /// World‑frame y position (m).
    pub y: f64,
    /// Heading (rad), normalized to `(-PI, PI]`.
    pub theta: f64,
}

impl Pose {
    /// Construct a new pose.
    ///
    /// # Arguments
    ///
    /// * `x`: World-frame x position in meters.
    /// * `y`: World-frame y position in meters.
    /// * `theta`: Heading in radians.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose { x, y, theta }
    }

    /// Normalize an angle to be within `(-PI, PI]`.
    ///
    /// `-PI` is mapped to `PI`. The result is idempotent under a second
    /// normalization.
    ///
    /// # Arguments
    ///
    /// * `angle`: The angle in radians to normalize.
    ///
    /// # Returns
    ///
    /// The normalized angle in radians.
    pub fn normalize_angle(angle: f64) -> f64 {
        let a = angle % TAU;
        if a > PI {
            a - TAU
        } else if a <= -PI {
            a + TAU
        } else {
            a
        }
    }

    /// The same position with the heading normalized.
    pub fn normalized(self) -> Self {
        Pose::new(self.x, self.y, Pose::normalize_angle(self.theta))
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.2}, y: {:.2}, θ: {:.2} rad)", self.x, self.y, self.theta)
    }
}

/// Left and right wheel angular velocities.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    /// Left wheel angular velocity (rad/s).
    pub omega_l: f64,
    /// Right wheel angular velocity (rad/s).
    pub omega_r: f64,
}

impl WheelSpeeds {
    /// Construct wheel speeds.
    ///
    /// # Arguments
    ///
    /// * `omega_l`: Left wheel angular velocity (rad/s).
    /// * `omega_r`: Right wheel angular velocity (rad/s).
    pub const fn new(omega_l: f64, omega_r: f64) -> Self {
        WheelSpeeds { omega_l, omega_r }
    }

    /// Mean absolute wheel velocity (rad/s).
    pub fn mean_abs(&self) -> f64 {
        (libm::fabs(self.omega_l) + libm::fabs(self.omega_r)) / 2.0
    }
}

impl fmt::Display for WheelSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(ωL: {:.2} rad/s, ωR: {:.2} rad/s)", self.omega_l, self.omega_r)
    }
}

/// Linear and angular chassis velocities.
/// These represent the overall motion of the robot's chassis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisSpeeds {
    /// Linear speed of the chassis center (m/s).
    pub v: f64,
    /// Angular speed of the chassis (rad/s).
    pub omega: f64,
}

impl ChassisSpeeds {
    /// Construct chassis speeds.
    ///
    /// # Arguments
    ///
    /// * `v`: Linear speed of the chassis center (m/s).
    /// * `omega`: Angular speed of the chassis (rad/s).
    pub const fn new(v: f64, omega: f64) -> Self {
        ChassisSpeeds { v, omega }
    }

    /// Chassis speeds for a discrete command.
    ///
    /// `forward`/`backward` drive at `±linear`, `left`/`right` pivot at
    /// `±angular`, `stop` is zero.
    pub const fn for_command(command: Command, linear: f64, angular: f64) -> Self {
        match command {
            Command::Stop => ChassisSpeeds::new(0.0, 0.0),
            Command::Forward => ChassisSpeeds::new(linear, 0.0),
            Command::Backward => ChassisSpeeds::new(-linear, 0.0),
            Command::Left => ChassisSpeeds::new(0.0, angular),
            Command::Right => ChassisSpeeds::new(0.0, -angular),
        }
    }
}

impl fmt::Display for ChassisSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v: {:.2} m/s, ω: {:.2} rad/s)", self.v, self.omega)
    }
}

/// Differential‑drive kinematics helper.
///
/// This struct encapsulates the physical parameters of a differential-drive robot
/// (wheel radius and axle length) and provides methods for kinematic calculations.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialDrive {
    /// Wheel radius (m).
    wheel_radius: f64,
    /// Axle length (m).
    axle_length: f64,
}

impl DifferentialDrive {
    /// Construct a new differential‑drive kinematics helper.
    ///
    /// # Arguments
    ///
    /// * `wheel_radius`: The radius of the robot's wheels in meters.
    /// * `axle_length`: The distance between the centers of the two drive wheels in meters.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidWheelRadius)` if `wheel_radius` is not positive.
    /// Returns `Err(KinematicsError::InvalidAxleLength)` if `axle_length` is not positive.
    pub const fn new(wheel_radius: f64, axle_length: f64) -> Result<Self, KinematicsError> {
        if wheel_radius <= 0.0 {
            return Err(KinematicsError::InvalidWheelRadius("must be positive"));
        }
        if axle_length <= 0.0 {
            return Err(KinematicsError::InvalidAxleLength("must be positive"));
        }
        Ok(DifferentialDrive {
            wheel_radius,
            axle_length,
        })
    }

    /// Returns the wheel radius.
    pub fn wheel_radius(&self) -> f64 {
        self.wheel_radius
    }

    /// Returns the axle length.
    pub fn axle_length(&self) -> f64 {
        self.axle_length
    }

    /// Calculates the robot's chassis speeds (linear and angular velocity)
    /// from the wheel speeds. This is the forward kinematics problem.
    pub fn forward_kinematics(&self, wheel_speeds: WheelSpeeds) -> ChassisSpeeds {
        let v_l = wheel_speeds.omega_l * self.wheel_radius;
        let v_r = wheel_speeds.omega_r * self.wheel_radius;

        let v = (v_r + v_l) / 2.0;
        let omega = (v_r - v_l) / self.axle_length;

        ChassisSpeeds::new(v, omega)
    }

    /// Calculates the required wheel speeds to achieve the given chassis speeds.
    /// This is the inverse kinematics problem.
    pub fn inverse_kinematics(&self, chassis_speeds: ChassisSpeeds) -> WheelSpeeds {
        let v_r = chassis_speeds.v + chassis_speeds.omega * (self.axle_length / 2.0);
        let v_l = chassis_speeds.v - chassis_speeds.omega * (self.axle_length / 2.0);

        WheelSpeeds::new(v_l / self.wheel_radius, v_r / self.wheel_radius)
    }

    /// Mean rim speed of the wheels in m/s.
    ///
    /// This is the speed a wheel-driven robot reports in telemetry; it is
    /// nonzero during a pivot turn even though the chassis does not translate.
    pub fn rim_speed(&self, wheel_speeds: WheelSpeeds) -> f64 {
        wheel_speeds.mean_abs() * self.wheel_radius
    }

    /// Updates the robot's pose given its current pose, chassis speeds, and time delta.
    ///
    /// This method performs odometry, integrating the chassis speeds over the time delta `dt`
    /// to estimate the new pose. It assumes constant chassis speeds over the interval `dt`.
    /// The final heading is normalized to `(-PI, PI]`.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative.
    pub fn update_pose(
        &self,
        current_pose: Pose,
        chassis_speeds: ChassisSpeeds,
        dt: f64,
    ) -> Result<Pose, KinematicsError> {
        if dt < 0.0 {
            return Err(KinematicsError::NegativeTimeDelta("must be non-negative"));
        }

        let delta_x = chassis_speeds.v * libm::cos(current_pose.theta) * dt;
        let delta_y = chassis_speeds.v * libm::sin(current_pose.theta) * dt;
        let delta_theta = chassis_speeds.omega * dt;

        Ok(Pose {
            x: current_pose.x + delta_x,
            y: current_pose.y + delta_y,
            theta: Pose::normalize_angle(current_pose.theta + delta_theta),
        })
    }

    /// Convenience function to update pose directly from wheel speeds and dt.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative (propagated from `update_pose`).
    pub fn update_pose_from_wheel_speeds(
        &self,
        current_pose: Pose,
        wheel_speeds: WheelSpeeds,
        dt: f64,
    ) -> Result<Pose, KinematicsError> {
        let chassis_speeds = self.forward_kinematics(wheel_speeds);
        self.update_pose(current_pose, chassis_speeds, dt)
    }
}

impl fmt::Display for DifferentialDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DifferentialDrive (r: {:.2} m, L: {:.2} m)", self.wheel_radius, self.axle_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_2;
    const EPSILON: f64 = 1e-6;

    fn in_range(a: f64) -> bool {
        a > -PI && a <= PI
    }

    #[test]
    fn test_pose_normalization() {
        assert!((Pose::normalize_angle(0.0) - 0.0).abs() < EPSILON);
        assert_eq!(Pose::normalize_angle(PI), PI); // PI is inside (-PI, PI]
        assert_eq!(Pose::normalize_angle(-PI), PI); // -PI wraps up
        assert!((Pose::normalize_angle(PI - EPSILON) - (PI - EPSILON)).abs() < EPSILON);
        assert!((Pose::normalize_angle(2.5 * PI) - 0.5 * PI).abs() < EPSILON);
        assert!((Pose::normalize_angle(-2.5 * PI) - -0.5 * PI).abs() < EPSILON);
        assert!((Pose::normalize_angle(3.0 * PI).abs() - PI).abs() < EPSILON);
        assert!((Pose::normalize_angle(PI + FRAC_PI_2) - -FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_normalization_range_and_idempotence() {
        let mut angle = -50.0;
        while angle < 50.0 {
            let once = Pose::normalize_angle(angle);
            assert!(in_range(once), "normalize({}) = {} out of range", angle, once);
            assert_eq!(Pose::normalize_angle(once), once);
            angle += 0.173;
        }
        for a in [PI, -PI, TAU, -TAU, 1e6, -1e6] {
            let once = Pose::normalize_angle(a);
            assert!(in_range(once));
            assert_eq!(Pose::normalize_angle(once), once);
        }
    }

    #[test]
    fn test_kinematics_constructor() {
        let kinematics = DifferentialDrive::new(0.1, 0.5).unwrap();
        assert_eq!(kinematics.wheel_radius(), 0.1);
        assert_eq!(kinematics.axle_length(), 0.5);
    }

    #[test]
    fn test_constructor_invalid_geometry() {
        let result = DifferentialDrive::new(0.0, 0.5);
        assert!(matches!(result, Err(KinematicsError::InvalidWheelRadius("must be positive"))));
        let result = DifferentialDrive::new(0.1, -0.5);
        assert!(matches!(result, Err(KinematicsError::InvalidAxleLength("must be positive"))));
    }

    #[test]
    fn test_forward_kinematics_pivot_turn() {
        let kinematics = DifferentialDrive::new(0.1, 0.5).unwrap(); // r=0.1m, L=0.5m
        let wheel_speeds = WheelSpeeds::new(-5.0, 5.0);
        // v_l = -0.5 m/s, v_r = 0.5 m/s => v = 0, omega = 1 / 0.5 = 2 rad/s
        let chassis_speeds = kinematics.forward_kinematics(wheel_speeds);
        assert!((chassis_speeds.v - 0.0).abs() < EPSILON);
        assert!((chassis_speeds.omega - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_inverse_kinematics_gentle_turn() {
        let kinematics = DifferentialDrive::new(0.1, 0.5).unwrap();
        let chassis_speeds = ChassisSpeeds::new(0.75, 1.0);
        // v_r = 0.75 + 0.25 = 1.0, v_l = 0.5 => omega_r = 10, omega_l = 5
        let wheel_speeds = kinematics.inverse_kinematics(chassis_speeds);
        assert!((wheel_speeds.omega_l - 5.0).abs() < EPSILON);
        assert!((wheel_speeds.omega_r - 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_chassis_speeds_for_command() {
        assert_eq!(ChassisSpeeds::for_command(Command::Forward, 0.3, 1.0), ChassisSpeeds::new(0.3, 0.0));
        assert_eq!(ChassisSpeeds::for_command(Command::Backward, 0.3, 1.0), ChassisSpeeds::new(-0.3, 0.0));
        assert_eq!(ChassisSpeeds::for_command(Command::Right, 0.3, 1.0), ChassisSpeeds::new(0.0, -1.0));
        assert_eq!(ChassisSpeeds::for_command(Command::Stop, 0.3, 1.0), ChassisSpeeds::default());
    }

    #[test]
    fn test_rim_speed_counts_pivot() {
        let kinematics = DifferentialDrive::new(0.04, 0.2).unwrap();
        let pivot = WheelSpeeds::new(-8.0, 8.0);
        assert!((kinematics.rim_speed(pivot) - 0.32).abs() < EPSILON);
        assert_eq!(kinematics.rim_speed(WheelSpeeds::default()), 0.0);
    }

    #[test]
    fn test_update_pose_straight_negative_x_axis() {
        let kinematics = DifferentialDrive::new(0.1, 0.5).unwrap();
        let current_pose = Pose::new(0.0, 0.0, PI); // Facing along -X-axis
        let new_pose = kinematics
            .update_pose(current_pose, ChassisSpeeds::new(1.0, 0.0), 1.0)
            .unwrap();
        assert!((new_pose.x - (-1.0)).abs() < EPSILON);
        assert!((new_pose.y - 0.0).abs() < EPSILON);
        assert!((new_pose.theta - PI).abs() < EPSILON);
    }

    #[test]
    fn test_update_pose_combined_motion() {
        let kinematics = DifferentialDrive::new(0.1, 0.5).unwrap();
        let current_pose = Pose::new(1.0, 2.0, PI / 4.0);
        let chassis_speeds = ChassisSpeeds::new(1.0, PI / 2.0);
        // delta_x = delta_y = sqrt(2)/4, delta_theta = PI/4
        let new_pose = kinematics.update_pose(current_pose, chassis_speeds, 0.5).unwrap();
        assert!((new_pose.x - (1.0 + 2.0_f64.sqrt() / 4.0)).abs() < EPSILON);
        assert!((new_pose.y - (2.0 + 2.0_f64.sqrt() / 4.0)).abs() < EPSILON);
        assert!((new_pose.theta - PI / 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_update_pose_negative_dt() {
        let kinematics = DifferentialDrive::new(0.1, 0.5).unwrap();
        let result = kinematics.update_pose(Pose::default(), ChassisSpeeds::new(1.0, 0.0), -0.1);
        assert!(matches!(result, Err(KinematicsError::NegativeTimeDelta("must be non-negative"))));
    }

    #[test]
    fn test_update_pose_from_wheel_speeds_straight() {
        let kinematics = DifferentialDrive::new(0.1, 0.5).unwrap();
        let wheel_speeds = WheelSpeeds::new(10.0, 10.0); // v = 1 m/s, omega = 0
        let new_pose = kinematics
            .update_pose_from_wheel_speeds(Pose::default(), wheel_speeds, 1.0)
            .unwrap();
        assert!((new_pose.x - 1.0).abs() < EPSILON);
        assert!(new_pose.y.abs() < EPSILON);
        assert!(new_pose.theta.abs() < EPSILON);
    }
}
