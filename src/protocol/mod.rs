//! Wire formats: serial line framing, inbound commands, outbound reports.

pub mod codec;
pub mod command;
pub mod report;

pub use codec::{Line, LineFramer};
pub use command::{Command, parse_frame};
pub use report::{Report, level_payload};
