use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use rover_kinematics::Command;

/// Values written by the transport worker and read by the simulation thread
/// every tick. Nothing else crosses that boundary.
#[derive(Debug, Default)]
pub struct SharedState {
    command: AtomicU8,
    connected: AtomicBool,
}

pub type Shared = Arc<SharedState>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub command: Command,
    pub connection: ConnectionState,
}

impl SharedState {
    pub fn new() -> Shared {
        Arc::default()
    }

    pub fn command(&self) -> Command {
        // Only `set_command` writes this slot, so the code is always valid.
        Command::from_code(self.command.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Replace the active command. Returns the previous one.
    pub fn set_command(&self, command: Command) -> Command {
        let prev = self.command.swap(command.code(), Ordering::AcqRel);
        Command::from_code(prev).unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, connected: bool) -> bool {
        self.connected.swap(connected, Ordering::AcqRel)
    }

    pub fn connection(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            command: self.command(),
            connection: self.connection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_stopped_and_disconnected() {
        let shared = SharedState::new();
        assert_eq!(
            shared.snapshot(),
            Snapshot {
                command: Command::Stop,
                connection: ConnectionState::Disconnected,
            }
        );
    }

    #[test]
    fn test_newest_command_wins() {
        let shared = SharedState::new();
        assert_eq!(shared.set_command(Command::Forward), Command::Stop);
        assert_eq!(shared.set_command(Command::Left), Command::Forward);
        assert_eq!(shared.command(), Command::Left);
    }

    #[test]
    fn test_visible_across_threads() {
        let shared = SharedState::new();
        let writer = Arc::clone(&shared);
        std::thread::spawn(move || {
            writer.set_command(Command::Backward);
            writer.set_connected(true);
        })
        .join()
        .unwrap();
        assert_eq!(shared.command(), Command::Backward);
        assert_eq!(shared.connection(), ConnectionState::Connected);
    }
}
