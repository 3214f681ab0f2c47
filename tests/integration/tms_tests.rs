//! Tank monitoring node: sampling, mailbox and the layered uplink.

use std::time::{Duration, Instant};

use tankflow::adapters::SystemClock;
use tankflow::app::ports::NO_ECHO;
use tankflow::config::MAILBOX_CAPACITY;
use tankflow::kernel::{Task, TaskRunner};
use tankflow::protocol::level_payload;
use tankflow::protocol::report::parse_level;
use tankflow::tasks::NetState;

use crate::mock_hw::TmsRig;

fn payload(level: f32, ts: u64) -> String {
    level_payload(level, ts).unwrap().as_str().to_owned()
}

#[test]
fn flapping_network_loses_and_duplicates_nothing() {
    let rig = TmsRig::new(0.0);
    let topic = rig.config.level_topic.clone();
    let mut nt = rig.network_task();
    nt.init(0);

    nt.tick(0);
    nt.tick(500);
    assert_eq!(nt.state(), NetState::NetworkOk);

    // Network drops, three reports are produced while it is down.
    rig.ap.set_up(false);
    for ts in [1_000, 2_000, 3_000] {
        rig.ctx.enqueue(&topic, &payload(10.0, ts)).unwrap();
    }
    nt.tick(1_000);
    assert_eq!(nt.state(), NetState::NetworkError);

    // Back up briefly, then down again before the next flush is due.
    rig.ap.set_up(true);
    nt.tick(1_500);
    assert_eq!(nt.state(), NetState::NetworkOk);
    rig.ap.set_up(false);
    nt.tick(1_600);
    assert_eq!(nt.state(), NetState::NetworkError);
    nt.tick(2_000);
    nt.tick(2_500);
    assert!(rig.broker.published().is_empty());
    assert_eq!(rig.ctx.pending(), 3);

    rig.ap.set_up(true);
    for t in (3_000..=8_000).step_by(500) {
        nt.tick(t);
    }

    assert_eq!(
        rig.published_payloads(),
        vec![payload(10.0, 1_000), payload(10.0, 2_000), payload(10.0, 3_000)]
    );
    assert_eq!(rig.ctx.pending(), 0);
    assert_eq!(nt.sent(), 3);
}

#[test]
fn refused_publish_is_retried_in_order() {
    let rig = TmsRig::new(0.0);
    let topic = rig.config.level_topic.clone();
    let mut nt = rig.network_task();
    nt.init(0);
    nt.tick(0);

    for ts in [100, 200, 300] {
        rig.ctx.enqueue(&topic, &payload(1.0, ts)).unwrap();
    }
    rig.broker.reject_next(1);
    nt.tick(500);
    assert!(rig.published_payloads().is_empty());
    assert_eq!(rig.ctx.pending(), 3);

    // Still inside the send interval: nothing is attempted.
    nt.tick(1_000);
    assert!(rig.published_payloads().is_empty());

    nt.tick(1_500);
    assert_eq!(
        rig.published_payloads(),
        vec![payload(1.0, 100), payload(1.0, 200), payload(1.0, 300)]
    );
}

#[test]
fn outage_keeps_oldest_reports_up_to_capacity() {
    let rig = TmsRig::new(25.0);
    rig.ap.set_up(false);
    let mut st = rig.sensor_task();
    let mut nt = rig.network_task();
    st.init(0);
    nt.init(0);

    for i in 1..=(MAILBOX_CAPACITY as u64 + 2) {
        st.tick(i * 1_000);
        nt.tick(i * 1_000);
    }
    assert_eq!(rig.ctx.pending(), MAILBOX_CAPACITY);
    assert_ne!(nt.state(), NetState::NetworkOk);

    rig.ap.set_up(true);
    nt.tick(20_000);
    nt.tick(20_500);

    let timestamps: Vec<u64> = rig
        .published_payloads()
        .iter()
        .map(|p| parse_level(p).unwrap().timestamp)
        .collect();
    let expected: Vec<u64> = (1..=MAILBOX_CAPACITY as u64).map(|i| i * 1_000).collect();
    assert_eq!(timestamps, expected);
}

#[test]
fn lights_follow_uplink_state() {
    let rig = TmsRig::new(0.0);
    rig.broker.set_up(false);
    let mut nt = rig.network_task();
    nt.init(0);
    assert!(!rig.alive.level() && !rig.error.level());

    nt.tick(0);
    nt.tick(500);
    assert!(!rig.alive.level() && rig.error.level());

    rig.broker.set_up(true);
    nt.tick(1_000);
    nt.tick(1_500);
    assert!(rig.alive.level() && !rig.error.level());

    rig.broker.set_up(false);
    nt.tick(2_000);
    nt.tick(2_500);
    assert!(!rig.alive.level() && rig.error.level());
}

#[test]
fn missing_echo_reaches_the_broker_unchanged() {
    let rig = TmsRig::new(NO_ECHO);
    let mut st = rig.sensor_task();
    let mut nt = rig.network_task();
    st.init(0);
    nt.init(0);
    nt.tick(0);
    st.tick(1_000);
    nt.tick(1_000);

    let published = rig.published_payloads();
    assert_eq!(published.len(), 1);
    assert_eq!(parse_level(&published[0]).unwrap().level, NO_ECHO);
    assert_eq!(rig.ctx.water_level().unwrap().level, NO_ECHO);
}

#[test]
fn runner_threads_deliver_in_order() {
    let mut rig = TmsRig::new(33.0);
    rig.config.send_interval_ms = 5;
    let rig: &'static TmsRig = Box::leak(Box::new(rig));

    let _sensor = TaskRunner::new(c"sensor", 5)
        .stack_kb(64)
        .spawn(rig.sensor_task(), SystemClock::new())
        .unwrap();
    let _network = TaskRunner::new(c"network", 5)
        .stack_kb(64)
        .spawn(rig.network_task(), SystemClock::new())
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(3);
    while rig.published_payloads().len() < 5 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }

    let timestamps: Vec<u64> = rig
        .published_payloads()
        .iter()
        .map(|p| parse_level(p).unwrap().timestamp)
        .collect();
    assert!(timestamps.len() >= 5, "only {} reports delivered", timestamps.len());
    assert!(
        timestamps.windows(2).all(|w| w[0] < w[1]),
        "out of order or duplicated: {timestamps:?}"
    );
}
