//! Simulated rover controller that relays telemetry and commands to a backend
//! over a WebSocket.

pub mod battery;
pub mod config;
pub mod controller;
pub mod drive;
pub mod host;
pub mod protocol;
pub mod state;
pub mod telemetry;
pub mod transport;

pub use controller::{Controller, TickReport};
pub use state::{Shared, SharedState};
pub use transport::{Transport, Uplink};
