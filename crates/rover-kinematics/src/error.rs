//! Error types for the kinematics library.
//!
//! This module defines error types that can occur when constructing
//! kinematic helpers or integrating motion.

use core::fmt;

/// Errors that can occur in kinematic calculations.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Error for invalid wheel radius.
    /// This variant is returned when a wheel radius is provided that is not positive.
    InvalidWheelRadius(&'static str),
    /// Error for invalid axle length.
    /// This variant is returned when an axle length is provided that is not positive.
    InvalidAxleLength(&'static str),
    /// Error for an invalid per-tick displacement.
    /// This variant is returned when a step length is not positive and finite.
    InvalidStep(&'static str),
    /// Error for an invalid turn angle.
    /// This variant is returned when a turn angle is not finite.
    InvalidTurnAngle(&'static str),
    /// Error for negative time delta.
    /// This variant is returned when a negative time delta is used for pose updates.
    NegativeTimeDelta(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::InvalidWheelRadius(msg) => write!(f, "Invalid wheel radius: {}", msg),
            KinematicsError::InvalidAxleLength(msg) => write!(f, "Invalid axle length: {}", msg),
            KinematicsError::InvalidStep(msg) => write!(f, "Invalid step length: {}", msg),
            KinematicsError::InvalidTurnAngle(msg) => write!(f, "Invalid turn angle: {}", msg),
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
