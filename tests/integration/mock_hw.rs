//! Simulated rig for integration tests.
//!
//! Holds the test-side handles of every simulated peripheral and builds the
//! real tasks on top of them, so a test can drive the tasks and poke or
//! inspect the hardware at the same time.

use core::cell::RefCell;

use tankflow::adapters::sim::{
    SimAccessPoint, SimAnalog, SimBroker, SimDisplay, SimPin, SimProximity, SimPwm, SimWire,
};
use tankflow::adapters::{
    LayeredConnection, MqttAdapter, MqttSettings, UartLink, WifiAdapter, WifiCredentials,
};
use tankflow::config::{LevelThresholds, TmsConfig, WcsConfig};
use tankflow::context::{Mode, TmsContext, WcsContext};
use tankflow::drivers::{DebouncedButton, GpioLight, PwmServo};
use tankflow::fsm::LevelPolicy;
use tankflow::kernel::Millis;
use tankflow::protocol::command::{encode_set_mode, encode_set_valve};
use tankflow::protocol::report::parse_level;
use tankflow::sensors::AnalogPotentiometer;
use tankflow::tasks::{LcdTask, LinkTask, NetworkTask, SensorTask, SystemTask, ValveTask};

pub type SimSensorTask<'a> = SensorTask<'a, SimProximity>;
pub type SimNetworkTask<'a> =
    NetworkTask<'a, WifiAdapter, MqttAdapter, GpioLight<SimPin>, GpioLight<SimPin>>;
pub type SimSystemTask<'a> =
    SystemTask<'a, DebouncedButton<SimPin>, AnalogPotentiometer<SimAnalog>>;
pub type SimValveTask<'a> = ValveTask<'a, PwmServo<SimPwm>>;
pub type SimLinkTask<'a> = LinkTask<'a, UartLink<SimWire>>;
pub type SimLcdTask<'a> = LcdTask<'a, SimDisplay>;

// ── TMS ───────────────────────────────────────────────────────

pub struct TmsRig {
    pub config: TmsConfig,
    pub ctx: TmsContext,
    pub sonar: SimProximity,
    pub ap: SimAccessPoint,
    pub broker: SimBroker,
    pub alive: SimPin,
    pub error: SimPin,
}

#[allow(dead_code)]
impl TmsRig {
    pub fn new(level: f32) -> Self {
        Self {
            config: TmsConfig::default(),
            ctx: TmsContext::new(),
            sonar: SimProximity::new(level),
            ap: SimAccessPoint::new(true),
            broker: SimBroker::new(true),
            alive: SimPin::new(false),
            error: SimPin::new(false),
        }
    }

    pub fn sensor_task(&self) -> SimSensorTask<'_> {
        SensorTask::new(self.sonar.clone(), &self.ctx, &self.config.level_topic)
    }

    pub fn network_task(&self) -> SimNetworkTask<'_> {
        let conn = LayeredConnection::new(
            WifiAdapter::new(self.ap.clone(), WifiCredentials::from(&self.config)),
            MqttAdapter::new(self.broker.clone(), MqttSettings::from(&self.config)),
        );
        NetworkTask::new(
            conn,
            &self.ctx,
            GpioLight::new(self.alive.clone()),
            GpioLight::new(self.error.clone()),
            self.config.send_interval_ms,
        )
    }

    /// Payloads the broker accepted on the level topic.
    pub fn published_payloads(&self) -> Vec<String> {
        self.broker
            .published()
            .into_iter()
            .filter(|(topic, _)| topic == self.config.level_topic.as_str())
            .map(|(_, payload)| payload)
            .collect()
    }
}

// ── WCS ───────────────────────────────────────────────────────

pub struct WcsRig {
    pub config: WcsConfig,
    pub ctx: RefCell<WcsContext>,
    pub button: SimPin,
    pub pot: SimAnalog,
    pub pwm: SimPwm,
    pub wire: SimWire,
    pub display: SimDisplay,
}

#[allow(dead_code)]
impl WcsRig {
    pub fn new() -> Self {
        Self {
            config: WcsConfig::default(),
            ctx: RefCell::new(WcsContext::new()),
            // Active low, released.
            button: SimPin::new(true),
            pot: SimAnalog::new(4095),
            pwm: SimPwm::new(16_383),
            wire: SimWire::new(),
            display: SimDisplay::new(4),
        }
    }

    pub fn system_task(&self) -> SimSystemTask<'_> {
        SystemTask::new(
            &self.ctx,
            DebouncedButton::new(self.button.clone(), true),
            AnalogPotentiometer::new(self.pot.clone()),
            self.config.link_stale_timeout_ms,
        )
    }

    pub fn valve_task(&self) -> SimValveTask<'_> {
        ValveTask::new(&self.ctx, PwmServo::new(self.pwm.clone()), self.config.msec_per_percent)
    }

    pub fn link_task(&self) -> SimLinkTask<'_> {
        LinkTask::new(
            &self.ctx,
            UartLink::new(self.wire.clone()),
            self.config.heartbeat_period_ms,
            self.config.pot_change_threshold,
        )
    }

    pub fn lcd_task(&self) -> SimLcdTask<'_> {
        LcdTask::new(&self.ctx, self.display.clone())
    }

    /// Lines the WCS wrote whose `event` field is `event`.
    pub fn events(&self, event: &str) -> Vec<serde_json::Value> {
        self.wire
            .sent()
            .iter()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter(|v| v["event"] == event)
            .collect()
    }
}

// ── Central unit stand-in ─────────────────────────────────────

/// Reads level reports off the broker, runs the level policy and writes
/// valve commands down the serial wire.
pub struct CentralUnit {
    policy: LevelPolicy,
    broker: SimBroker,
    wire: SimWire,
    topic: String,
    seen: usize,
    opening: u8,
}

#[allow(dead_code)]
impl CentralUnit {
    pub fn new(thresholds: LevelThresholds, broker: SimBroker, wire: SimWire, topic: &str) -> Self {
        Self {
            policy: LevelPolicy::new(thresholds),
            broker,
            wire,
            topic: topic.to_owned(),
            seen: 0,
            opening: 0,
        }
    }

    /// Put the WCS in automatic mode with the policy's initial opening.
    pub fn start(&mut self, now: Millis) {
        self.opening = self.policy.start(now);
        self.send(&encode_set_mode(Mode::Automatic).unwrap());
        self.send(&encode_set_valve(self.opening).unwrap());
    }

    /// Handle every level report published since the last step.  The
    /// current opening is re-sent with each report.
    pub fn step(&mut self) {
        let published = self.broker.published();
        for (topic, payload) in &published[self.seen..] {
            if *topic != self.topic {
                continue;
            }
            let report = parse_level(payload).expect("level payload");
            if let Some(opening) = self.policy.on_level(report.level, report.timestamp) {
                self.opening = opening;
            }
            self.send(&encode_set_valve(self.opening).unwrap());
        }
        self.seen = published.len();
    }

    pub fn opening(&self) -> u8 {
        self.opening
    }

    pub fn policy(&self) -> &LevelPolicy {
        &self.policy
    }

    fn send(&self, frame: &str) {
        self.wire.inject(frame);
        self.wire.inject("\n");
    }
}
