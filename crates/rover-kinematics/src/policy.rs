//! Pose update policies for discrete commands.
//!
//! A policy maps the current pose and the active [`Command`] to the next pose
//! for a single simulation tick. Two policies are provided:
//!
//! * [`WorldFrame`]: axis-aligned displacement, heading untouched.
//! * [`BodyFrame`]: displacement along the heading, with edge-triggered
//!   quarter turns for `left` and `right`.

use libm::{cos, sin};

use crate::{Command, KinematicsError, Pose};

/// A per-tick pose update rule.
pub trait PoseUpdate {
    /// Compute the pose after applying `command` for one tick.
    ///
    /// Returns `None` when the command produces no motion (`stop`); the
    /// caller must then leave the pose untouched.
    fn update(&mut self, pose: Pose, command: Command) -> Option<Pose>;

    /// Whether `left`/`right` rotate the robot under this policy.
    /// World-frame strafes do not.
    fn turns_rotate(&self) -> bool;
}

fn check_step(step: f64) -> Result<f64, KinematicsError> {
    if step.is_finite() && step > 0.0 {
        Ok(step)
    } else {
        Err(KinematicsError::InvalidStep("must be positive and finite"))
    }
}

/// Moves the robot along fixed world axes regardless of heading.
///
/// `forward`/`backward` move along ±x, `left`/`right` along ±y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldFrame {
    step: f64,
}

impl WorldFrame {
    /// Construct a world-frame policy moving `step` meters per tick.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidStep)` if `step` is not positive.
    pub fn new(step: f64) -> Result<Self, KinematicsError> {
        Ok(WorldFrame { step: check_step(step)? })
    }
}

impl PoseUpdate for WorldFrame {
    fn update(&mut self, pose: Pose, command: Command) -> Option<Pose> {
        let (dx, dy) = match command {
            Command::Stop => return None,
            Command::Forward => (self.step, 0.0),
            Command::Backward => (-self.step, 0.0),
            Command::Left => (0.0, self.step),
            Command::Right => (0.0, -self.step),
        };
        Some(Pose::new(pose.x + dx, pose.y + dy, pose.theta))
    }

    fn turns_rotate(&self) -> bool {
        false
    }
}

/// Moves the robot relative to its own heading.
///
/// `left`/`right` are edge-triggered: the first tick of a turn command
/// rotates by the turn angle and then steps forward along the new heading;
/// every following tick of the same command only steps forward. The last
/// applied action is tracked explicitly and cleared by `stop`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyFrame {
    step: f64,
    turn_angle: f64,
    last_action: Option<Command>,
}

impl BodyFrame {
    /// Construct a body-frame policy.
    ///
    /// # Arguments
    ///
    /// * `step`: Displacement per tick in meters.
    /// * `turn_angle`: Rotation applied once per turn activation, in radians.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidStep)` if `step` is not positive,
    /// or `Err(KinematicsError::InvalidTurnAngle)` if `turn_angle` is not finite.
    pub fn new(step: f64, turn_angle: f64) -> Result<Self, KinematicsError> {
        if !turn_angle.is_finite() {
            return Err(KinematicsError::InvalidTurnAngle("must be finite"));
        }
        Ok(BodyFrame {
            step: check_step(step)?,
            turn_angle,
            last_action: None,
        })
    }

    /// The last non-stop command applied, or `None` after a `stop`.
    pub fn last_action(&self) -> Option<Command> {
        self.last_action
    }

    /// Forget the last applied action so the next turn is a fresh activation.
    pub fn reset(&mut self) {
        self.last_action = None;
    }

    fn advance(&self, pose: Pose, theta: f64, distance: f64) -> Pose {
        Pose::new(
            pose.x + cos(theta) * distance,
            pose.y + sin(theta) * distance,
            theta,
        )
    }
}

impl PoseUpdate for BodyFrame {
    fn update(&mut self, pose: Pose, command: Command) -> Option<Pose> {
        let theta = pose.theta;
        let next = match command {
            Command::Stop => {
                self.reset();
                return None;
            }
            Command::Forward => self.advance(pose, theta, self.step),
            Command::Backward => self.advance(pose, theta, -self.step),
            Command::Left | Command::Right if self.last_action == Some(command) => {
                self.advance(pose, theta, self.step)
            }
            Command::Left => {
                self.advance(pose, Pose::normalize_angle(theta + self.turn_angle), self.step)
            }
            Command::Right => {
                self.advance(pose, Pose::normalize_angle(theta - self.turn_angle), self.step)
            }
        };
        self.last_action = Some(command);
        Some(next)
    }

    fn turns_rotate(&self) -> bool {
        true
    }
}
