//! MQTT session: the protocol layer of the TMS uplink.
//!
//! Implements [`ProtocolService`].  Publishes use QoS 1 so a message the
//! client accepted survives a broker hiccup; the network task only removes
//! a message from the mailbox after `send` returned `Ok`.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient`, created on the first
//!   `connect`.  The IDF client reconnects on its own; its event callback
//!   tracks the session state.
//! - **all other targets**: talks to a [`SimBroker`].
//!
//! [`SimBroker`]: crate::adapters::sim::SimBroker

use log::{info, warn};

use crate::app::ports::ProtocolService;
use crate::error::CommsError;

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: heapless::String<64>,
    pub port: u16,
    pub client_id: heapless::String<32>,
}

impl From<&crate::config::TmsConfig> for MqttSettings {
    fn from(cfg: &crate::config::TmsConfig) -> Self {
        Self {
            host: cfg.mqtt_host.clone(),
            port: cfg.mqtt_port,
            client_id: cfg.mqtt_client_id.clone(),
        }
    }
}

impl MqttSettings {
    pub fn url(&self) -> String {
        format!("mqtt://{}:{}", self.host, self.port)
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use core::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

    use super::*;

    pub struct MqttAdapter {
        settings: MqttSettings,
        client: Option<EspMqttClient<'static>>,
        up: Arc<AtomicBool>,
    }

    impl MqttAdapter {
        pub fn new(settings: MqttSettings) -> Self {
            Self {
                settings,
                client: None,
                up: Arc::new(AtomicBool::new(false)),
            }
        }

        fn create_client(&mut self) -> Result<(), CommsError> {
            let url = self.settings.url();
            let conf = MqttClientConfiguration {
                client_id: Some(self.settings.client_id.as_str()),
                ..Default::default()
            };
            let up = self.up.clone();
            let client = EspMqttClient::new_cb(&url, &conf, move |event| match event.payload() {
                EventPayload::Connected(_) => {
                    up.store(true, Ordering::SeqCst);
                    info!("MQTT: session up");
                }
                EventPayload::Disconnected => {
                    up.store(false, Ordering::SeqCst);
                    warn!("MQTT: session lost");
                }
                EventPayload::Error(e) => warn!("MQTT: {:?}", e),
                _ => {}
            })
            .map_err(|e| {
                warn!("MQTT: client creation for {} failed: {}", url, e);
                CommsError::ProtocolConnectFailed
            })?;
            info!("MQTT: client created for {}", url);
            self.client = Some(client);
            Ok(())
        }
    }

    impl ProtocolService for MqttAdapter {
        fn connect(&mut self) -> Result<(), CommsError> {
            if self.client.is_none() {
                self.create_client()?;
            }
            if self.is_connected() {
                Ok(())
            } else {
                Err(CommsError::ProtocolConnectFailed)
            }
        }

        fn is_connected(&self) -> bool {
            self.client.is_some() && self.up.load(Ordering::SeqCst)
        }

        fn send(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
            if !self.is_connected() {
                return Err(CommsError::ProtocolDown);
            }
            let client = self.client.as_mut().ok_or(CommsError::ProtocolDown)?;
            client
                .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes())
                .map(|_| ())
                .map_err(|e| {
                    warn!("MQTT: publish to '{}' failed: {}", topic, e);
                    CommsError::PublishFailed
                })
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use super::*;
    use crate::adapters::sim::SimBroker;

    pub struct MqttAdapter {
        settings: MqttSettings,
        broker: SimBroker,
        session: bool,
    }

    impl MqttAdapter {
        pub fn new(broker: SimBroker, settings: MqttSettings) -> Self {
            Self {
                settings,
                broker,
                session: false,
            }
        }
    }

    impl ProtocolService for MqttAdapter {
        fn connect(&mut self) -> Result<(), CommsError> {
            self.session = self.broker.is_up();
            if self.session {
                info!(
                    "MQTT(sim): '{}' connected to {}",
                    self.settings.client_id,
                    self.settings.url()
                );
                Ok(())
            } else {
                Err(CommsError::ProtocolConnectFailed)
            }
        }

        fn is_connected(&self) -> bool {
            self.session && self.broker.is_up()
        }

        fn send(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
            if !self.is_connected() {
                return Err(CommsError::ProtocolDown);
            }
            if self.broker.publish(topic, payload) {
                Ok(())
            } else {
                warn!("MQTT(sim): publish to '{}' refused", topic);
                Err(CommsError::PublishFailed)
            }
        }
    }
}

pub use platform::MqttAdapter;
