use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "ROVER";

/// Which kinematics policy drives the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    /// Axis-aligned displacement, heading untouched.
    WorldFrame,
    /// Displacement along the heading with edge-triggered quarter turns.
    #[default]
    BodyFrame,
    /// Wheel velocities through differential-drive kinematics.
    WheelDrive,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub url: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self { url: "ws://localhost:3000".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub timestep_ms: u64,
    pub realtime: bool,
    /// Zero means unbounded.
    pub max_steps: u64,
    pub devices: Vec<String>,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            timestep_ms: 32,
            realtime: true,
            max_steps: 0,
            devices: ["gps", "compass", "left wheel motor", "right wheel motor"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriveSettings {
    pub mode: DriveMode,
    /// Meters per tick for the pose policies.
    pub step: f64,
    /// Radians per turn activation (body frame).
    pub turn_angle: f64,
    pub wheel_radius: f64,
    pub axle_length: f64,
    /// m/s commanded for forward/backward (wheel drive).
    pub linear_velocity: f64,
    /// rad/s commanded for left/right (wheel drive).
    pub angular_velocity: f64,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            mode: DriveMode::default(),
            step: 0.02,
            turn_angle: std::f64::consts::FRAC_PI_2,
            wheel_radius: 0.04,
            axle_length: 0.2,
            linear_velocity: 0.32,
            angular_velocity: 1.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Simulated seconds between telemetry frames.
    pub interval_s: f64,
    /// Reported speed while moving linearly (pose policies).
    pub linear_speed: f64,
    /// Reported speed while turning (body frame).
    pub turn_speed: f64,
    /// Log a status line every N emitted frames.
    pub status_every: u64,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            interval_s: 0.2,
            linear_speed: 0.1,
            turn_speed: 0.05,
            status_every: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatterySettings {
    pub initial: f64,
    /// Percent per second while moving.
    pub drain_rate: f64,
    pub low_threshold: f64,
    pub warn_every_ticks: u64,
}

impl Default for BatterySettings {
    fn default() -> Self {
        Self {
            initial: 100.0,
            drain_rate: 0.008,
            low_threshold: 10.0,
            warn_every_ticks: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Ticks between reconnect attempts while disconnected.
    pub reconnect_ticks: u64,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self { reconnect_ticks: 100 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub sim: SimSettings,
    pub drive: DriveSettings,
    pub telemetry: TelemetrySettings,
    pub battery: BatterySettings,
    pub link: LinkSettings,
}

impl Settings {
    /// Parse settings from TOML text, without environment overrides.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!(?settings, "Successfully loaded configuration");
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}
