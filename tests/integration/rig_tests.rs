//! Whole rig: TMS level reports through the broker to the central unit's
//! level policy, and valve commands down the serial wire to the WCS.

use tankflow::config::{LevelThresholds, WCS_BASE_PERIOD_MS};
use tankflow::context::Mode;
use tankflow::fsm::StateId;
use tankflow::kernel::{Millis, Scheduler, Task};

use crate::mock_hw::{CentralUnit, TmsRig, WcsRig};

const THRESHOLDS: LevelThresholds = LevelThresholds {
    l1: 50.0,
    l2: 80.0,
    t1_ms: 2_000,
};

struct Rig<'a> {
    now: Millis,
    sensor: &'a mut dyn Task,
    network: &'a mut dyn Task,
    cu: CentralUnit,
    wcs: Scheduler<'a>,
}

impl Rig<'_> {
    /// Advance the whole rig in base-period steps.  The TMS samples every
    /// second and runs its uplink every 500 ms.
    fn run_until(&mut self, until: Millis) {
        while self.now < until {
            self.now += WCS_BASE_PERIOD_MS;
            if self.now % 1_000 == 0 {
                self.sensor.tick(self.now);
            }
            if self.now % 500 == 0 {
                self.network.tick(self.now);
            }
            self.cu.step();
            self.wcs.run_once(WCS_BASE_PERIOD_MS);
        }
    }
}

macro_rules! rig {
    ($tms:expr, $wcs:expr, $rig:ident) => {
        let mut sensor = $tms.sensor_task();
        let mut network = $tms.network_task();
        sensor.init(0);
        network.init(0);

        let mut cu = CentralUnit::new(
            THRESHOLDS,
            $tms.broker.clone(),
            $wcs.wire.clone(),
            &$tms.config.level_topic,
        );
        cu.start(0);

        let (mut sys, mut valve, mut link, mut lcd) =
            ($wcs.system_task(), $wcs.valve_task(), $wcs.link_task(), $wcs.lcd_task());
        let mut sched = Scheduler::new($wcs.config.base_period_ms);
        sched.register(&mut sys, $wcs.config.system_period_ms).unwrap();
        sched.register(&mut valve, $wcs.config.valve_period_ms).unwrap();
        sched.register(&mut link, $wcs.config.link_period_ms).unwrap();
        sched.register(&mut lcd, $wcs.config.lcd_period_ms).unwrap();
        // Start every task at t = 0, like the TMS side above.
        sched.run_once(0);

        let mut $rig = Rig {
            now: 0,
            sensor: &mut sensor,
            network: &mut network,
            cu,
            wcs: sched,
        };
    };
}

#[test]
fn high_level_opens_the_valve_and_recovery_closes_it() {
    let tms = TmsRig::new(30.0);
    let wcs = WcsRig::new();
    rig!(tms, wcs, rig);

    rig.run_until(2_500);
    {
        let ctx = wcs.ctx.borrow();
        assert_eq!(ctx.mode(), Mode::Automatic);
        assert_eq!(ctx.valve_opening(), 0);
    }

    tms.sonar.push(90.0);
    rig.run_until(5_000);
    assert_eq!(rig.cu.policy().state(), StateId::Alarm);
    assert_eq!(wcs.ctx.borrow().valve_opening(), 100);

    // Below L2 but above L1: partial opening.
    tms.sonar.push(70.0);
    rig.run_until(7_000);
    assert_eq!(rig.cu.policy().state(), StateId::PreAlarm);
    assert_eq!(wcs.ctx.borrow().valve_opening(), 50);

    tms.sonar.push(30.0);
    rig.run_until(9_000);
    assert_eq!(rig.cu.policy().state(), StateId::Normal);
    assert_eq!(wcs.ctx.borrow().valve_opening(), 0);

    let beats = wcs.events("heartbeat");
    assert!(beats.iter().any(|b| b["valve_pos"] == 100));
    assert!(beats.iter().all(|b| b["mode"] == "AUTOMATIC"));
}

#[test]
fn sustained_tracking_level_escalates_to_partial_opening() {
    let tms = TmsRig::new(30.0);
    let wcs = WcsRig::new();
    rig!(tms, wcs, rig);

    rig.run_until(1_500);
    tms.sonar.push(60.0);
    // First tracking report at 2000; T1 is exceeded by the report at 5000.
    rig.run_until(4_500);
    assert_eq!(rig.cu.policy().state(), StateId::TrackingPreAlarm);
    assert_eq!(wcs.ctx.borrow().valve_opening(), 0);

    rig.run_until(6_000);
    assert_eq!(rig.cu.policy().state(), StateId::PreAlarm);
    assert_eq!(wcs.ctx.borrow().valve_opening(), 50);
}

#[test]
fn uplink_outage_delays_but_does_not_lose_reports() {
    let tms = TmsRig::new(30.0);
    let wcs = WcsRig::new();
    rig!(tms, wcs, rig);

    rig.run_until(2_200);
    tms.ap.set_up(false);
    tms.sonar.push(90.0);
    rig.run_until(6_200);
    assert_eq!(rig.cu.policy().state(), StateId::Normal);
    assert_eq!(wcs.ctx.borrow().valve_opening(), 0);
    assert!(!tms.alive.level() && tms.error.level());

    tms.ap.set_up(true);
    rig.run_until(8_000);
    assert_eq!(rig.cu.policy().state(), StateId::Alarm);
    assert_eq!(wcs.ctx.borrow().valve_opening(), 100);

    let timestamps: Vec<u64> = tms
        .published_payloads()
        .iter()
        .map(|p| tankflow::protocol::report::parse_level(p).unwrap().timestamp)
        .collect();
    let expected: Vec<u64> = (1..=8).map(|s| s * 1_000).collect();
    assert_eq!(timestamps, expected);
}
