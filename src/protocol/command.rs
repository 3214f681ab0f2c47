//! Inbound commands from the central unit.
//!
//! A frame is a line whose JSON object starts at the first `{`; anything
//! before it (log noise on a shared console) is ignored.  The object's
//! `cmd` field selects a handler from a static table; each handler
//! validates `value` and produces a [`Command`].
//!
//! | cmd         | value                                    |
//! |-------------|------------------------------------------|
//! | `set_valve` | integer 0-100                            |
//! | `set_mode`  | `"AUTOMATIC"`, `"MANUAL"`, `"UNCONNECTED"` |

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{Mode, WcsContext};
use crate::error::CommandError;
use crate::kernel::Millis;

/// A validated inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetValve(u8),
    SetMode(Mode),
}

impl Command {
    /// Latch the command for the system task and record the link as alive.
    pub fn apply(self, ctx: &mut WcsContext, now: Millis) {
        match self {
            Self::SetValve(percent) => ctx.set_valve_command(percent),
            Self::SetMode(mode) => ctx.set_mode_command(mode),
        }
        ctx.mark_valid_message(now);
    }
}

type Handler = fn(Option<&Value>) -> Result<Command, CommandError>;

const COMMANDS: &[(&str, Handler)] = &[("set_valve", set_valve), ("set_mode", set_mode)];

/// Parse and validate one inbound line.
pub fn parse_frame(line: &str) -> Result<Command, CommandError> {
    let start = line.find('{').ok_or(CommandError::NoJson)?;
    let json: Value =
        serde_json::from_str(line[start..].trim_end()).map_err(|_| CommandError::Malformed)?;
    let name = json
        .get("cmd")
        .and_then(Value::as_str)
        .ok_or(CommandError::MissingCommand)?;

    let Some((_, handler)) = COMMANDS.iter().find(|(n, _)| *n == name) else {
        warn!("LINK: unknown cmd '{}'", name);
        return Err(CommandError::UnknownCommand);
    };
    handler(json.get("value"))
}

fn set_valve(value: Option<&Value>) -> Result<Command, CommandError> {
    let value = value.ok_or(CommandError::MissingValue)?;
    let percent = if let Some(n) = value.as_i64() {
        n
    } else if value.is_u64() {
        // Larger than i64::MAX.
        i64::MAX
    } else {
        return Err(CommandError::MissingValue);
    };
    if !(0..=100).contains(&percent) {
        return Err(CommandError::OutOfRange(percent));
    }
    Ok(Command::SetValve(percent as u8))
}

fn set_mode(value: Option<&Value>) -> Result<Command, CommandError> {
    let value = value.ok_or(CommandError::MissingValue)?;
    if !value.is_string() {
        return Err(CommandError::MissingValue);
    }
    Mode::deserialize(value)
        .map(Command::SetMode)
        .map_err(|_| CommandError::InvalidMode)
}

// ───────────────────────────────────────────────────────────────
// Encoding (central unit side)
// ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Frame<'a, T: Serialize> {
    cmd: &'a str,
    value: T,
}

/// `{"cmd":"set_valve","value":<percent>}`
pub fn encode_set_valve(percent: u8) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Frame {
        cmd: "set_valve",
        value: percent.min(100),
    })
}

/// `{"cmd":"set_mode","value":"<MODE>"}`
pub fn encode_set_mode(mode: Mode) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Frame {
        cmd: "set_mode",
        value: mode,
    })
}
