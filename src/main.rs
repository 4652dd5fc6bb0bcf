use anyhow::{Context, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rover_link::config::load_config;
use rover_link::drive::build_drive;
use rover_link::host::KinematicHost;
use rover_link::{Controller, SharedState, Transport};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Rover link controller starting");

    let settings = load_config().context("failed to load configuration")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;

    let shared = SharedState::new();
    let transport = Transport::new(
        settings.backend.url.clone(),
        shared.clone(),
        runtime.handle().clone(),
    );

    info!(url = transport.url(), "Backend configured");

    let host = KinematicHost::from_settings(&settings.sim, &settings.drive)
        .context("failed to initialize simulation host")?;
    let drive = build_drive(&settings.drive, &settings.telemetry)
        .context("invalid drive configuration")?;
    let mut controller = Controller::new(&settings, host, drive, transport, shared)
        .context("robot devices unavailable")?;

    info!("Spawning simulation thread...");
    let sim = std::thread::Builder::new()
        .name("sim".into())
        .spawn(move || controller.run())?;

    let ticks = sim
        .join()
        .map_err(|_| anyhow!("simulation thread panicked"))?;
    info!(ticks, "Simulation finished");
    Ok(())
}
