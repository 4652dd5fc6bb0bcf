//! Discrete drive commands issued by the backend.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A discrete drive command.
///
/// The most recently received command stays active until it is replaced;
/// commands are never queued.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Command {
    /// Hold the current pose.
    #[default]
    Stop = 0,
    /// Drive forward.
    Forward = 1,
    /// Drive backward.
    Backward = 2,
    /// Turn (or strafe) left.
    Left = 3,
    /// Turn (or strafe) right.
    Right = 4,
}

impl Command {
    /// Every command, in wire-code order.
    pub const ALL: [Command; 5] = [
        Command::Stop,
        Command::Forward,
        Command::Backward,
        Command::Left,
        Command::Right,
    ];

    /// Lowercase wire name of the command.
    pub const fn as_str(self) -> &'static str {
        match self {
            Command::Stop => "stop",
            Command::Forward => "forward",
            Command::Backward => "backward",
            Command::Left => "left",
            Command::Right => "right",
        }
    }

    /// Compact code used to store the command in an atomic.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Command::code`].
    pub const fn from_code(code: u8) -> Option<Command> {
        match code {
            0 => Some(Command::Stop),
            1 => Some(Command::Forward),
            2 => Some(Command::Backward),
            3 => Some(Command::Left),
            4 => Some(Command::Right),
            _ => None,
        }
    }

    /// `true` for `left` and `right`.
    pub const fn is_turn(self) -> bool {
        matches!(self, Command::Left | Command::Right)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when text does not name a known command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseCommandError;

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown command, expected one of forward, backward, left, right, stop")
    }
}

impl core::error::Error for ParseCommandError {}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(ParseCommandError)
    }
}
