//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter      | Implements                 | Connects to                  |
//! |--------------|----------------------------|------------------------------|
//! | `wifi`       | NetworkConnectionService   | ESP-IDF WiFi STA             |
//! | `mqtt`       | ProtocolService            | ESP-IDF MQTT client          |
//! | `connection` | (composes the two above)   | layered uplink               |
//! | `serial`     | SerialLink                 | UART to the Central Unit     |
//! | `hardware`   | AnalogInput                | ESP32 ADC1 oneshot           |
//! | `time`       | Clock                      | ESP32 high-resolution timer  |
//! | `sim`        | (host stand-ins)           | in-memory peripherals        |

pub mod connection;
#[cfg(target_os = "espidf")]
pub mod hardware;
pub mod mqtt;
pub mod serial;
#[cfg(not(target_os = "espidf"))]
pub mod sim;
pub mod time;
pub mod wifi;

pub use connection::LayeredConnection;
pub use mqtt::{MqttAdapter, MqttSettings};
pub use serial::{ByteChannel, UartLink};
pub use time::SystemClock;
pub use wifi::{WifiAdapter, WifiCredentials};
