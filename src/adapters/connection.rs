//! Network + protocol, stacked.
//!
//! ```text
//!   NetworkTask ──▶ LayeredConnection ──▶ ProtocolService   (MQTT)
//!                                    └──▶ NetworkConnectionService (WiFi)
//! ```
//!
//! The protocol layer is never touched while the network layer is down:
//! `connect` only attempts the protocol once the network reports up, and
//! `send` fails fast with [`CommsError::NetworkDown`].

use crate::app::ports::{NetworkConnectionService, ProtocolService};
use crate::error::CommsError;

pub struct LayeredConnection<N, P> {
    network: N,
    protocol: P,
}

impl<N: NetworkConnectionService, P: ProtocolService> LayeredConnection<N, P> {
    pub fn new(network: N, protocol: P) -> Self {
        Self { network, protocol }
    }

    /// One non-blocking attempt at both layers, network first.
    pub fn connect(&mut self) -> Result<(), CommsError> {
        if !self.network.is_connected() {
            self.network.connect()?;
        }
        if !self.protocol.is_connected() {
            self.protocol.connect()?;
        }
        Ok(())
    }

    /// Both layers up.
    pub fn is_connected(&self) -> bool {
        self.network.is_connected() && self.protocol.is_connected()
    }

    pub fn network_up(&self) -> bool {
        self.network.is_connected()
    }

    pub fn send(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if !self.network.is_connected() {
            return Err(CommsError::NetworkDown);
        }
        self.protocol.send(topic, payload)
    }

    pub fn poll(&mut self) {
        if self.network.is_connected() {
            self.protocol.poll();
        }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }
}
