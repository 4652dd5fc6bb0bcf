use std::time::{Duration, Instant};

use rover_kinematics::{DifferentialDrive, KinematicsError, Pose, WheelSpeeds};
use spin_sleep::SpinSleeper;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{DriveSettings, SimSettings};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("invalid robot geometry: {0}")]
    Geometry(#[from] KinematicsError),
}

/// Sensor, actuator, and stepping capabilities of the simulation host.
///
/// The controller only ever talks to the robot through this trait.
pub trait SimHost {
    /// Length of one simulation step in milliseconds.
    fn timestep_ms(&self) -> u64;

    /// Simulated seconds since start.
    fn time(&self) -> f64;

    /// Advance the simulation by one step. Returns `false` when the host
    /// terminates; the control loop must then exit.
    fn step(&mut self) -> bool;

    /// Fails when the named device is not present on the robot.
    fn require_device(&self, name: &str) -> Result<(), HostError>;

    fn position(&self) -> (f64, f64);

    /// Heading in radians, normalized to `(-PI, PI]`.
    fn heading(&self) -> f64;

    fn set_position(&mut self, x: f64, y: f64);

    fn set_heading(&mut self, theta: f64);

    fn set_wheel_speeds(&mut self, speeds: WheelSpeeds);

    fn wheel_speeds(&self) -> WheelSpeeds;

    fn pose(&self) -> Pose {
        let (x, y) = self.position();
        Pose::new(x, y, self.heading())
    }

    fn set_pose(&mut self, pose: Pose) {
        self.set_heading(pose.theta);
        self.set_position(pose.x, pose.y);
    }
}

/// In-process host: a single differential-drive robot on an empty plane.
///
/// Wheel speeds are integrated every step; poses written through
/// `set_position`/`set_heading` take effect immediately.
pub struct KinematicHost {
    pose: Pose,
    wheels: WheelSpeeds,
    drive: DifferentialDrive,
    timestep_ms: u64,
    steps: u64,
    max_steps: Option<u64>,
    devices: Vec<String>,
    pacing: Option<(SpinSleeper, Instant)>,
}

impl KinematicHost {
    pub fn new(timestep_ms: u64, drive: DifferentialDrive, devices: Vec<String>) -> Self {
        Self {
            pose: Pose::default(),
            wheels: WheelSpeeds::default(),
            drive,
            timestep_ms: timestep_ms.max(1),
            steps: 0,
            max_steps: None,
            devices,
            pacing: None,
        }
    }

    pub fn from_settings(sim: &SimSettings, drive: &DriveSettings) -> Result<Self, HostError> {
        let kinematics = DifferentialDrive::new(drive.wheel_radius, drive.axle_length)?;
        let host = Self::new(sim.timestep_ms, kinematics, sim.devices.clone())
            .with_max_steps((sim.max_steps > 0).then_some(sim.max_steps))
            .realtime(sim.realtime);
        info!(
            timestep_ms = host.timestep_ms,
            max_steps = ?host.max_steps,
            realtime = sim.realtime,
            "Kinematic host ready: {}",
            kinematics
        );
        Ok(host)
    }

    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sleep each step so simulated time tracks wall-clock time.
    pub fn realtime(mut self, enabled: bool) -> Self {
        self.pacing = enabled.then(|| (SpinSleeper::new(10_000), Instant::now()));
        self
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn dt(&self) -> f64 {
        self.timestep_ms as f64 / 1000.0
    }
}

impl SimHost for KinematicHost {
    fn timestep_ms(&self) -> u64 {
        self.timestep_ms
    }

    fn time(&self) -> f64 {
        self.steps as f64 * self.dt()
    }

    fn step(&mut self) -> bool {
        if self.max_steps.is_some_and(|max| self.steps >= max) {
            debug!(steps = self.steps, "Step limit reached");
            return false;
        }
        if self.wheels != WheelSpeeds::default() {
            match self.drive.update_pose_from_wheel_speeds(self.pose, self.wheels, self.dt()) {
                Ok(pose) => self.pose = pose,
                Err(e) => warn!(error = %e, "Wheel integration failed"),
            }
        }
        self.steps += 1;

        if let Some((sleeper, start)) = &self.pacing {
            let deadline = *start + Duration::from_millis(self.timestep_ms * self.steps);
            sleeper.sleep(deadline.saturating_duration_since(Instant::now()));
        }
        true
    }

    fn require_device(&self, name: &str) -> Result<(), HostError> {
        if self.devices.iter().any(|d| d == name) {
            Ok(())
        } else {
            Err(HostError::DeviceNotFound(name.to_string()))
        }
    }

    fn position(&self) -> (f64, f64) {
        (self.pose.x, self.pose.y)
    }

    fn heading(&self) -> f64 {
        Pose::normalize_angle(self.pose.theta)
    }

    fn set_position(&mut self, x: f64, y: f64) {
        self.pose.x = x;
        self.pose.y = y;
    }

    fn set_heading(&mut self, theta: f64) {
        self.pose.theta = Pose::normalize_angle(theta);
    }

    fn set_wheel_speeds(&mut self, speeds: WheelSpeeds) {
        self.wheels = speeds;
    }

    fn wheel_speeds(&self) -> WheelSpeeds {
        self.wheels
    }
}
