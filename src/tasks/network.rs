//! TMS uplink: layered connection FSM and mailbox drain.
//!
//! ```text
//!   CONNECTING ──both layers up──▶ NETWORK_OK
//!        │                          │    ▲
//!     failure            layer lost │    │ both layers up
//!        ▼                          ▼    │
//!        └──────────────────────▶ NETWORK_ERROR
//! ```
//!
//! In `NETWORK_OK` the mailbox is drained at most once per send interval.
//! Each message is copied out, sent, and only acked after the send
//! succeeded; the first failure stops the drain and leaves that message at
//! the head for the next interval.

use log::{info, warn};

use crate::adapters::LayeredConnection;
use crate::app::ports::{Light, NetworkConnectionService, ProtocolService};
use crate::config::MAILBOX_CAPACITY;
use crate::context::TmsContext;
use crate::kernel::{Millis, StateTracker, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetState {
    Connecting,
    NetworkOk,
    NetworkError,
}

pub struct NetworkTask<'a, N, P, A, E> {
    conn: LayeredConnection<N, P>,
    ctx: &'a TmsContext,
    alive: A,
    error: E,
    state: StateTracker<NetState>,
    send_interval: Millis,
    last_flush: Option<Millis>,
    sent: u32,
}

impl<'a, N, P, A, E> NetworkTask<'a, N, P, A, E>
where
    N: NetworkConnectionService,
    P: ProtocolService,
    A: Light,
    E: Light,
{
    pub fn new(
        conn: LayeredConnection<N, P>,
        ctx: &'a TmsContext,
        alive: A,
        error: E,
        send_interval: Millis,
    ) -> Self {
        Self {
            conn,
            ctx,
            alive,
            error,
            state: StateTracker::new(NetState::Connecting),
            send_interval,
            last_flush: None,
            sent: 0,
        }
    }

    pub fn state(&self) -> NetState {
        self.state.current()
    }

    /// Messages delivered since boot.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn connection(&self) -> &LayeredConnection<N, P> {
        &self.conn
    }

    pub fn lights(&self) -> (&A, &E) {
        (&self.alive, &self.error)
    }

    fn on_connecting(&mut self, now: Millis) {
        if self.state.take_just_entered() {
            info!("NT: CONNECTING");
        }
        match self.conn.connect() {
            Ok(()) => self.state.set(NetState::NetworkOk, now),
            Err(e) => {
                warn!("NT: initial connect failed: {}", e);
                self.state.set(NetState::NetworkError, now);
            }
        }
    }

    fn on_network_ok(&mut self, now: Millis) {
        if self.state.take_just_entered() {
            info!("NT: NETWORK_OK ({} queued)", self.ctx.pending());
            self.alive.switch_on();
            self.error.switch_off();
        }
        if !self.conn.is_connected() {
            let layer = if self.conn.network_up() { "protocol" } else { "network" };
            warn!("NT: {} layer lost", layer);
            self.state.set(NetState::NetworkError, now);
            return;
        }
        self.conn.poll();

        let due = self
            .last_flush
            .is_none_or(|t| now.saturating_sub(t) >= self.send_interval);
        if due {
            self.last_flush = Some(now);
            self.flush();
        }
    }

    fn on_network_error(&mut self, now: Millis) {
        if self.state.take_just_entered() {
            warn!("NT: NETWORK_ERROR, retrying every tick");
            self.alive.switch_off();
            self.error.switch_on();
        }
        if self.conn.connect().is_ok() {
            self.state.set(NetState::NetworkOk, now);
        }
    }

    /// Send queued messages oldest first until the queue is empty or a send
    /// fails.  Bounded by the mailbox capacity so a producer that keeps
    /// refilling the queue cannot pin this tick.
    fn flush(&mut self) {
        for _ in 0..MAILBOX_CAPACITY {
            let Some(msg) = self.ctx.next_outbound() else {
                break;
            };
            match self.conn.send(&msg.topic, &msg.payload) {
                Ok(()) => {
                    self.ctx.ack(msg.seq);
                    self.sent = self.sent.wrapping_add(1);
                }
                Err(e) => {
                    warn!("NT: send of #{} failed: {}, kept for retry", msg.seq, e);
                    break;
                }
            }
        }
    }
}

impl<N, P, A, E> Task for NetworkTask<'_, N, P, A, E>
where
    N: NetworkConnectionService,
    P: ProtocolService,
    A: Light,
    E: Light,
{
    fn name(&self) -> &'static str {
        "network"
    }

    fn init(&mut self, now: Millis) {
        self.alive.switch_off();
        self.error.switch_off();
        self.state.set(NetState::Connecting, now);
    }

    fn tick(&mut self, now: Millis) {
        match self.state.current() {
            NetState::Connecting => self.on_connecting(now),
            NetState::NetworkOk => self.on_network_ok(now),
            NetState::NetworkError => self.on_network_error(now),
        }
    }
}
