//! TMS level sampling.
//!
//! Each tick takes one distance reading, stores it as the latest level and
//! queues a level report for the network task.  A missing echo is stored
//! and reported as the raw [`NO_ECHO`](crate::app::ports::NO_ECHO) sentinel.

use log::{debug, warn};

use crate::app::ports::ProximitySensor;
use crate::config::TOPIC_MAX_LEN;
use crate::context::{LevelReading, TmsContext};
use crate::kernel::{Millis, Task};
use crate::protocol::level_payload;

pub struct SensorTask<'a, S> {
    sensor: S,
    ctx: &'a TmsContext,
    topic: heapless::String<TOPIC_MAX_LEN>,
}

impl<'a, S: ProximitySensor> SensorTask<'a, S> {
    pub fn new(sensor: S, ctx: &'a TmsContext, topic: &str) -> Self {
        Self {
            sensor,
            ctx,
            topic: crate::config::bounded(topic),
        }
    }
}

impl<S: ProximitySensor> Task for SensorTask<'_, S> {
    fn name(&self) -> &'static str {
        "sensor"
    }

    fn tick(&mut self, now: Millis) {
        let level = self.sensor.distance_cm();
        self.ctx.set_water_level(LevelReading { level, timestamp: now });

        let payload = match level_payload(level, now) {
            Ok(p) => p,
            Err(e) => {
                warn!("ST: level {:.2} at {} ms not queued: {}", level, now, e);
                return;
            }
        };
        // Queue drops are logged by the mailbox.
        if let Ok(seq) = self.ctx.enqueue(&self.topic, &payload) {
            debug!("ST: level {:.2} queued as #{}", level, seq);
        }
    }
}
