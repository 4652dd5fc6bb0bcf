//! The per-tick driver.
//!
//! Each tick: read the pose, apply the active command, drain the battery,
//! emit telemetry when the interval has elapsed in simulated time, warn on low
//! battery, and retry the backend connection on a fixed tick period.

use rover_kinematics::Command;
use tracing::{debug, info, warn};

use crate::battery::Battery;
use crate::config::Settings;
use crate::drive::Drive;
use crate::host::{HostError, SimHost};
use crate::protocol::Outbound;
use crate::state::Shared;
use crate::telemetry::{TelemetryFrame, build_frame};
use crate::transport::{TransportError, Uplink};

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub command: Command,
    pub moved: bool,
    pub frame: Option<TelemetryFrame>,
    pub low_battery_warned: bool,
    pub reconnect_attempted: bool,
}

pub struct Controller<H, U> {
    host: H,
    drive: Box<dyn Drive>,
    uplink: U,
    shared: Shared,
    battery: Battery,
    telemetry_interval: f64,
    status_every: u64,
    low_battery: f64,
    low_battery_every: u64,
    reconnect_every: u64,
    ticks: u64,
    cycle: u64,
    last_emission: f64,
}

impl<H: SimHost, U: Uplink> Controller<H, U> {
    /// Fails if the host lacks a device the drive policy needs.
    pub fn new(
        settings: &Settings,
        host: H,
        drive: Box<dyn Drive>,
        uplink: U,
        shared: Shared,
    ) -> Result<Self, HostError> {
        for device in drive.required_devices() {
            host.require_device(device)?;
        }
        info!(
            drive = drive.name(),
            timestep_ms = host.timestep_ms(),
            "Devices initialized"
        );
        Ok(Self {
            host,
            drive,
            uplink,
            shared,
            battery: Battery::new(settings.battery.initial, settings.battery.drain_rate),
            telemetry_interval: settings.telemetry.interval_s,
            status_every: settings.telemetry.status_every.max(1),
            low_battery: settings.battery.low_threshold,
            low_battery_every: settings.battery.warn_every_ticks.max(1),
            reconnect_every: settings.link.reconnect_ticks.max(1),
            ticks: 0,
            cycle: 0,
            last_emission: 0.0,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn uplink(&self) -> &U {
        &self.uplink
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    /// Number of telemetry frames emitted so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Connect, then tick until the host stops stepping. Returns the tick count.
    pub fn run(&mut self) -> u64 {
        info!("Starting main control loop");
        self.uplink.connect();
        while self.host.step() {
            self.tick();
        }
        info!(ticks = self.ticks, frames = self.cycle, "Controller stopped");
        self.ticks
    }

    /// One control step. The host must already have been stepped.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let command = self.shared.command();

        let pose = self.host.pose();
        let moved = self.drive.apply(&mut self.host, command);
        self.battery.update(moved, self.host.timestep_ms());

        let now = self.host.time();
        let frame = if now - self.last_emission >= self.telemetry_interval {
            let speed = self.drive.speed(&self.host, command);
            let frame = build_frame(&pose, speed, self.battery.level(), self.cycle);
            match self.uplink.send(&Outbound::Telemetry(frame.clone())) {
                Ok(()) => {}
                Err(TransportError::NotConnected) => debug!(cycle = self.cycle, "Telemetry dropped, not connected"),
                Err(e) => warn!(error = %e, cycle = self.cycle, "Failed to send telemetry"),
            }
            if self.cycle % self.status_every == 0 {
                let snapshot = self.shared.snapshot();
                info!(
                    cycle = self.cycle,
                    x = pose.x,
                    y = pose.y,
                    theta = pose.theta,
                    speed,
                    battery = self.battery.level(),
                    command = %snapshot.command,
                    connection = ?snapshot.connection,
                    "Status"
                );
            }
            self.cycle += 1;
            self.last_emission = now;
            Some(frame)
        } else {
            None
        };

        let low_battery_warned =
            self.battery.is_low(self.low_battery) && self.ticks % self.low_battery_every == 0;
        if low_battery_warned {
            warn!(battery = self.battery.level(), "Battery level critical");
        }

        let reconnect_attempted =
            !self.uplink.is_connected() && self.ticks % self.reconnect_every == 0;
        if reconnect_attempted {
            info!(tick = self.ticks, "Attempting to reconnect");
            self.uplink.connect();
        }

        TickReport {
            tick: self.ticks,
            command,
            moved,
            frame,
            low_battery_warned,
            reconnect_attempted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriveSettings;
    use crate::drive::build_drive;
    use crate::host::KinematicHost;
    use crate::protocol::handle_inbound;
    use crate::state::SharedState;
    use rover_kinematics::{DifferentialDrive, Pose};
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeUplink {
        connected: Cell<bool>,
        connect_calls: Cell<u32>,
        accept: bool,
        sent: RefCell<Vec<Outbound>>,
    }

    impl Uplink for FakeUplink {
        fn connect(&self) {
            self.connect_calls.set(self.connect_calls.get() + 1);
            self.connected.set(self.accept);
        }

        fn is_connected(&self) -> bool {
            self.connected.get()
        }

        fn send(&self, frame: &Outbound) -> Result<(), TransportError> {
            if !self.connected.get() {
                return Err(TransportError::NotConnected);
            }
            self.sent.borrow_mut().push(frame.clone());
            Ok(())
        }
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.telemetry.interval_s = 0.25;
        settings.link.reconnect_ticks = 10;
        settings
    }

    fn host() -> KinematicHost {
        KinematicHost::new(
            100,
            DifferentialDrive::new(0.04, 0.2).unwrap(),
            vec!["gps".into(), "compass".into()],
        )
    }

    fn controller(
        settings: &Settings,
        uplink: FakeUplink,
    ) -> (Controller<KinematicHost, FakeUplink>, Shared) {
        let shared = SharedState::new();
        let drive = build_drive(&settings.drive, &settings.telemetry).unwrap();
        let controller =
            Controller::new(settings, host(), drive, uplink, shared.clone()).unwrap();
        (controller, shared)
    }

    fn step(controller: &mut Controller<KinematicHost, FakeUplink>) -> TickReport {
        assert!(controller.host.step());
        controller.tick()
    }

    #[test]
    fn test_one_reconnect_per_period_while_disconnected() {
        let (mut controller, _) = controller(&settings(), FakeUplink::default());
        for _ in 0..10 {
            step(&mut controller);
        }
        assert_eq!(controller.uplink().connect_calls.get(), 1);
        for _ in 0..15 {
            step(&mut controller);
        }
        assert_eq!(controller.uplink().connect_calls.get(), 2);
    }

    #[test]
    fn test_no_reconnect_once_connected() {
        let uplink = FakeUplink { accept: true, ..FakeUplink::default() };
        let (mut controller, _) = controller(&settings(), uplink);
        let reports: Vec<_> = (0..30).map(|_| step(&mut controller)).collect();
        assert_eq!(reports.iter().filter(|r| r.reconnect_attempted).count(), 1);
        assert!(reports[9].reconnect_attempted);
        assert_eq!(controller.uplink().connect_calls.get(), 1);
    }

    #[test]
    fn test_telemetry_cadence_in_simulated_time() {
        let uplink = FakeUplink { accept: true, ..FakeUplink::default() };
        let (mut controller, _) = controller(&settings(), uplink);
        controller.uplink().connect();

        let emitted: Vec<u64> = (0..9)
            .filter_map(|_| step(&mut controller).frame.map(|f| f.cycle()))
            .collect();
        assert_eq!(emitted, vec![0, 1, 2]);
        assert_eq!(controller.cycle(), 3);
        assert_eq!(controller.uplink().sent.borrow().len(), 3);
    }

    #[test]
    fn test_forward_command_reports_speed() {
        let uplink = FakeUplink { accept: true, ..FakeUplink::default() };
        let (mut controller, shared) = controller(&settings(), uplink);
        controller.uplink().connect();

        let ack = handle_inbound(r#"{"type":"cmd","cmd":"forward"}"#, &shared);
        assert_eq!(ack, Some(Outbound::ack(Command::Forward)));

        let frame = loop {
            if let Some(frame) = step(&mut controller).frame {
                break frame;
            }
        };
        assert!(frame.speed() > 0.0);
        assert!(controller.host().pose().x > 0.0);
    }

    #[test]
    fn test_stop_keeps_pose_and_battery() {
        let (mut controller, _) = controller(&settings(), FakeUplink::default());
        for _ in 0..5 {
            let report = step(&mut controller);
            assert!(!report.moved);
            if let Some(frame) = report.frame {
                assert_eq!(frame.speed(), 0.0);
            }
        }
        assert_eq!(controller.host().pose(), Pose::default());
        assert_eq!(controller.battery().level(), 100.0);
    }

    #[test]
    fn test_battery_drains_while_moving() {
        let mut settings = settings();
        settings.battery.drain_rate = 10.0;
        let (mut controller, shared) = controller(&settings, FakeUplink::default());
        shared.set_command(Command::Backward);
        for _ in 0..10 {
            step(&mut controller);
        }
        // 10 ticks of 100 ms at 10 %/s
        assert!((controller.battery().level() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_low_battery_warning_period() {
        let mut settings = settings();
        settings.battery.initial = 5.0;
        settings.battery.warn_every_ticks = 3;
        let (mut controller, _) = controller(&settings, FakeUplink::default());
        let warned: Vec<u64> = (0..9)
            .map(|_| step(&mut controller))
            .filter(|r| r.low_battery_warned)
            .map(|r| r.tick)
            .collect();
        assert_eq!(warned, vec![3, 6, 9]);
    }

    #[test]
    fn test_no_low_battery_warning_when_charged() {
        let mut settings = settings();
        settings.battery.warn_every_ticks = 3;
        let (mut controller, _) = controller(&settings, FakeUplink::default());
        assert!((0..9).all(|_| !step(&mut controller).low_battery_warned));
    }

    #[test]
    fn test_frame_reports_pose_read_before_moving() {
        let uplink = FakeUplink { accept: true, ..FakeUplink::default() };
        let mut settings = settings();
        settings.telemetry.interval_s = 0.05;
        let (mut controller, shared) = controller(&settings, uplink);
        controller.uplink().connect();
        shared.set_command(Command::Forward);

        let frame = step(&mut controller).frame.unwrap();
        assert_eq!(frame.pose().x, 0.0);
        assert!((controller.host().pose().x - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_run_exits_when_host_terminates() {
        let settings = settings();
        let drive = build_drive(&settings.drive, &settings.telemetry).unwrap();
        let mut controller = Controller::new(
            &settings,
            host().with_max_steps(Some(12)),
            drive,
            FakeUplink::default(),
            SharedState::new(),
        )
        .unwrap();
        assert_eq!(controller.run(), 12);
        // initial connect plus the reconnect at tick 10
        assert_eq!(controller.uplink().connect_calls.get(), 2);
    }

    #[test]
    fn test_missing_wheel_motors_is_fatal() {
        let mut settings = settings();
        settings.drive = DriveSettings {
            mode: crate::config::DriveMode::WheelDrive,
            ..DriveSettings::default()
        };
        let drive = build_drive(&settings.drive, &settings.telemetry).unwrap();
        let result = Controller::new(
            &settings,
            host(),
            drive,
            FakeUplink::default(),
            SharedState::new(),
        );
        assert!(matches!(result, Err(HostError::DeviceNotFound(name)) if name == "left wheel motor"));
    }
}
