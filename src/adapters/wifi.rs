//! WiFi station: the network layer of the TMS uplink.
//!
//! Implements [`NetworkConnectionService`].  `connect` never blocks: it
//! (re)issues an association request and reports whether the link is up
//! right now.  The network task calls it again on its next tick.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` in STA mode.
//! - **all other targets**: associates with a [`SimAccessPoint`].
//!
//! [`SimAccessPoint`]: crate::adapters::sim::SimAccessPoint

use log::{info, warn};

use crate::app::ports::NetworkConnectionService;
use crate::error::CommsError;

/// SSID and passphrase.  An empty passphrase means an open network.
#[derive(Debug, Clone)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl From<&crate::config::TmsConfig> for WifiCredentials {
    fn from(cfg: &crate::config::TmsConfig) -> Self {
        Self {
            ssid: cfg.wifi_ssid.clone(),
            password: cfg.wifi_password.clone(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

    use super::*;
    use crate::adapters::time::SystemClock;
    use crate::app::ports::Clock;
    use crate::kernel::Millis;

    /// An association that has not come up after this long is re-issued.
    const ASSOCIATE_RETRY_MS: Millis = 5_000;

    pub struct WifiAdapter {
        wifi: EspWifi<'static>,
        creds: WifiCredentials,
        clock: SystemClock,
        started: bool,
        last_attempt: Option<Millis>,
    }

    impl WifiAdapter {
        pub fn new(wifi: EspWifi<'static>, creds: WifiCredentials) -> Self {
            Self {
                wifi,
                creds,
                clock: SystemClock::new(),
                started: false,
                last_attempt: None,
            }
        }

        fn start(&mut self) -> Result<(), CommsError> {
            let auth_method = if self.creds.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let config = Configuration::Client(ClientConfiguration {
                ssid: self
                    .creds
                    .ssid
                    .as_str()
                    .try_into()
                    .map_err(|_| CommsError::NetworkConnectFailed)?,
                password: self
                    .creds
                    .password
                    .as_str()
                    .try_into()
                    .map_err(|_| CommsError::NetworkConnectFailed)?,
                auth_method,
                ..Default::default()
            });
            self.wifi.set_configuration(&config).map_err(|e| {
                warn!("WiFi: set_configuration failed: {}", e);
                CommsError::NetworkConnectFailed
            })?;
            self.wifi.start().map_err(|e| {
                warn!("WiFi: start failed: {}", e);
                CommsError::NetworkConnectFailed
            })?;
            self.started = true;
            info!("WiFi: STA started, SSID '{}'", self.creds.ssid);
            Ok(())
        }
    }

    impl NetworkConnectionService for WifiAdapter {
        fn connect(&mut self) -> Result<(), CommsError> {
            if self.is_connected() {
                return Ok(());
            }
            if !self.started {
                self.start()?;
            }

            let now = self.clock.now_ms();
            let due = self
                .last_attempt
                .is_none_or(|t| now.saturating_sub(t) >= ASSOCIATE_RETRY_MS);
            if due {
                self.last_attempt = Some(now);
                if let Err(e) = self.wifi.connect() {
                    warn!("WiFi: connect request failed: {}", e);
                }
            }

            if self.is_connected() {
                info!("WiFi: associated with '{}'", self.creds.ssid);
                Ok(())
            } else {
                Err(CommsError::NetworkConnectFailed)
            }
        }

        fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
                && self.wifi.sta_netif().is_up().unwrap_or(false)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use super::*;
    use crate::adapters::sim::SimAccessPoint;

    pub struct WifiAdapter {
        ap: SimAccessPoint,
        creds: WifiCredentials,
        associated: bool,
    }

    impl WifiAdapter {
        pub fn new(ap: SimAccessPoint, creds: WifiCredentials) -> Self {
            Self {
                ap,
                creds,
                associated: false,
            }
        }
    }

    impl NetworkConnectionService for WifiAdapter {
        fn connect(&mut self) -> Result<(), CommsError> {
            self.associated = self.ap.is_up();
            if self.associated {
                info!("WiFi(sim): associated with '{}'", self.creds.ssid);
                Ok(())
            } else {
                Err(CommsError::NetworkConnectFailed)
            }
        }

        fn is_connected(&self) -> bool {
            self.associated && self.ap.is_up()
        }
    }
}

pub use platform::WifiAdapter;
