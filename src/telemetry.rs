use chrono::Utc;
use rover_kinematics::Pose;
use serde::{Deserialize, Serialize};

const POSITION_DECIMALS: i32 = 3;
const HEADING_DECIMALS: i32 = 4;
const BATTERY_DECIMALS: i32 = 1;

/// Round `value` to `decimals` places. Display-only; never fed back into state.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseReport {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// Periodic status snapshot sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pose: PoseReport,
    speed: f64,
    battery: f64,
    cycle: u64,
    /// Wall-clock epoch milliseconds.
    timestamp: i64,
}

impl TelemetryFrame {
    pub fn pose(&self) -> PoseReport {
        self.pose
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn battery(&self) -> f64 {
        self.battery
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

pub fn build_frame(pose: &Pose, speed: f64, battery: f64, cycle: u64) -> TelemetryFrame {
    build_frame_at(pose, speed, battery, cycle, Utc::now().timestamp_millis())
}

pub fn build_frame_at(
    pose: &Pose,
    speed: f64,
    battery: f64,
    cycle: u64,
    timestamp: i64,
) -> TelemetryFrame {
    let pose = pose.normalized();
    TelemetryFrame {
        pose: PoseReport {
            x: round_to(pose.x, POSITION_DECIMALS),
            y: round_to(pose.y, POSITION_DECIMALS),
            theta: round_to(pose.theta, HEADING_DECIMALS),
        },
        speed,
        battery: round_to(battery, BATTERY_DECIMALS),
        cycle,
        timestamp,
    }
}
