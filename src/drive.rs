//! Drive policies: how a discrete command becomes robot motion on the host.

use rover_kinematics::{
    BodyFrame, ChassisSpeeds, Command, DifferentialDrive, KinematicsError, PoseUpdate, WorldFrame,
};
use tracing::{debug, info};

use crate::config::{DriveMode, DriveSettings, TelemetrySettings};
use crate::host::SimHost;
use crate::telemetry::round_to;

/// Mean wheel velocity (rad/s) above which a wheel-driven robot counts as moving.
const MOVING_WHEEL_SPEED: f64 = 0.1;

const POSE_DEVICES: &[&str] = &["gps", "compass"];
const WHEEL_DEVICES: &[&str] = &["gps", "compass", "left wheel motor", "right wheel motor"];

pub trait Drive: Send {
    fn name(&self) -> &'static str;

    /// Devices the host must provide before the loop starts.
    fn required_devices(&self) -> &'static [&'static str];

    /// Apply `command` for one tick. Returns whether the robot moved.
    fn apply(&mut self, host: &mut dyn SimHost, command: Command) -> bool;

    /// Speed reported in telemetry for the current tick.
    fn speed(&self, host: &dyn SimHost, command: Command) -> f64;
}

/// Moves the robot by writing its pose directly.
///
/// The reported speed is a configured constant, not a measurement.
pub struct PoseDrive<P> {
    policy: P,
    linear_speed: f64,
    turn_speed: f64,
}

impl<P: PoseUpdate> PoseDrive<P> {
    pub fn new(policy: P, linear_speed: f64, turn_speed: f64) -> Self {
        Self { policy, linear_speed, turn_speed }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }
}

impl<P: PoseUpdate + Send> Drive for PoseDrive<P> {
    fn name(&self) -> &'static str {
        if self.policy.turns_rotate() { "body_frame" } else { "world_frame" }
    }

    fn required_devices(&self) -> &'static [&'static str] {
        POSE_DEVICES
    }

    fn apply(&mut self, host: &mut dyn SimHost, command: Command) -> bool {
        let current = host.pose();
        let Some(next) = self.policy.update(current, command) else {
            return false;
        };
        if next.theta != current.theta {
            host.set_heading(next.theta);
            info!(command = %command, theta = next.theta, deg = next.theta.to_degrees(), "Turned");
        }
        host.set_position(next.x, next.y);
        debug!(command = %command, dx = next.x - current.x, dy = next.y - current.y, "Moved");
        true
    }

    fn speed(&self, _host: &dyn SimHost, command: Command) -> f64 {
        match command {
            Command::Stop => 0.0,
            c if c.is_turn() && self.policy.turns_rotate() => self.turn_speed,
            _ => self.linear_speed,
        }
    }
}

/// Drives the wheels; the host integrates the motion.
///
/// The reported speed is measured from the wheel velocity readback.
pub struct WheelDrive {
    kinematics: DifferentialDrive,
    linear_velocity: f64,
    angular_velocity: f64,
}

impl WheelDrive {
    pub fn new(kinematics: DifferentialDrive, linear_velocity: f64, angular_velocity: f64) -> Self {
        Self { kinematics, linear_velocity, angular_velocity }
    }
}

impl Drive for WheelDrive {
    fn name(&self) -> &'static str {
        "wheel_drive"
    }

    fn required_devices(&self) -> &'static [&'static str] {
        WHEEL_DEVICES
    }

    fn apply(&mut self, host: &mut dyn SimHost, command: Command) -> bool {
        let chassis = ChassisSpeeds::for_command(command, self.linear_velocity, self.angular_velocity);
        host.set_wheel_speeds(self.kinematics.inverse_kinematics(chassis));
        host.wheel_speeds().mean_abs() > MOVING_WHEEL_SPEED
    }

    fn speed(&self, host: &dyn SimHost, _command: Command) -> f64 {
        round_to(self.kinematics.rim_speed(host.wheel_speeds()), 3)
    }
}

pub fn build_drive(
    drive: &DriveSettings,
    telemetry: &TelemetrySettings,
) -> Result<Box<dyn Drive>, KinematicsError> {
    let built: Box<dyn Drive> = match drive.mode {
        DriveMode::WorldFrame => Box::new(PoseDrive::new(
            WorldFrame::new(drive.step)?,
            telemetry.linear_speed,
            telemetry.turn_speed,
        )),
        DriveMode::BodyFrame => Box::new(PoseDrive::new(
            BodyFrame::new(drive.step, drive.turn_angle)?,
            telemetry.linear_speed,
            telemetry.turn_speed,
        )),
        DriveMode::WheelDrive => Box::new(WheelDrive::new(
            DifferentialDrive::new(drive.wheel_radius, drive.axle_length)?,
            drive.linear_velocity,
            drive.angular_velocity,
        )),
    };
    info!(mode = built.name(), "Drive policy selected");
    Ok(built)
}
