//! Periodic tasks of both nodes.
//!
//! | Task          | Node | Reads                      | Writes                         |
//! |---------------|------|----------------------------|--------------------------------|
//! | `SensorTask`  | TMS  | proximity sensor           | water level, outbound mailbox  |
//! | `NetworkTask` | TMS  | outbound mailbox           | uplink, status lights          |
//! | `SystemTask`  | WCS  | button, pot, latched cmds  | mode, valve target, LCD lines  |
//! | `ValveTask`   | WCS  | valve target               | servo, valve opening           |
//! | `LinkTask`    | WCS  | serial link, button latch  | latched cmds, serial link      |
//! | `LcdTask`     | WCS  | LCD lines                  | display                        |
//!
//! Every context field has exactly one writer task, listed above; the
//! command latches are the only fields with a producer (`LinkTask`) and a
//! separate consumer (`SystemTask`).

pub mod lcd;
pub mod link;
pub mod network;
pub mod sensor;
pub mod system;
pub mod valve;

pub use lcd::LcdTask;
pub use link::LinkTask;
pub use network::{NetState, NetworkTask};
pub use sensor::SensorTask;
pub use system::SystemTask;
pub use valve::{ValveState, ValveTask};
