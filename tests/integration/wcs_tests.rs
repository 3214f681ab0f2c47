//! Water channel node: all four tasks under the cooperative scheduler.

use tankflow::config::{WCS_BASE_PERIOD_MS, WcsConfig};
use tankflow::context::Mode;
use tankflow::kernel::{Millis, Scheduler, Task};
use tankflow::tasks::system::{LCD_ROW_MODE, LCD_ROW_VALVE};

use crate::mock_hw::WcsRig;

/// Registration order matches the firmware.
fn scheduler<'a>(
    config: &WcsConfig,
    system: &'a mut dyn Task,
    valve: &'a mut dyn Task,
    link: &'a mut dyn Task,
    lcd: &'a mut dyn Task,
) -> Scheduler<'a> {
    let mut sched = Scheduler::new(config.base_period_ms);
    sched.register(system, config.system_period_ms).unwrap();
    sched.register(valve, config.valve_period_ms).unwrap();
    sched.register(link, config.link_period_ms).unwrap();
    sched.register(lcd, config.lcd_period_ms).unwrap();
    // Start every task at t = 0.
    sched.run_once(0);
    sched
}

fn run_until(sched: &mut Scheduler<'_>, until: Millis) {
    while sched.now() < until {
        sched.run_once(WCS_BASE_PERIOD_MS);
    }
}

fn send(rig: &WcsRig, line: &str) {
    rig.wire.inject(line);
    rig.wire.inject("\n");
}

#[test]
fn boots_unconnected_and_follows_pot() {
    let rig = WcsRig::new();
    rig.pot.set_percent(40);
    let (mut sys, mut valve, mut link, mut lcd) =
        (rig.system_task(), rig.valve_task(), rig.link_task(), rig.lcd_task());
    let mut sched = scheduler(&rig.config, &mut sys, &mut valve, &mut link, &mut lcd);

    run_until(&mut sched, 1_000);

    let ctx = rig.ctx.borrow();
    assert_eq!(ctx.mode(), Mode::Unconnected);
    assert_eq!(ctx.valve_target(), 40);
    assert_eq!(ctx.valve_opening(), 40);
    assert_eq!(rig.display.row(LCD_ROW_MODE), "Unconnected");
    assert_eq!(rig.display.row(LCD_ROW_VALVE), "Valve: 40%");

    let pot = rig.events("pot_changed");
    assert_eq!(pot.last().unwrap()["value"], 40);
}

#[test]
fn remote_commands_drive_the_valve() {
    let rig = WcsRig::new();
    rig.pot.set_percent(90);
    let (mut sys, mut valve, mut link, mut lcd) =
        (rig.system_task(), rig.valve_task(), rig.link_task(), rig.lcd_task());
    let mut sched = scheduler(&rig.config, &mut sys, &mut valve, &mut link, &mut lcd);

    send(&rig, r#"{"cmd":"set_mode","value":"MANUAL"}"#);
    send(&rig, r#"{"cmd":"set_valve","value":42}"#);
    run_until(&mut sched, 1_000);
    {
        let ctx = rig.ctx.borrow();
        assert_eq!(ctx.mode(), Mode::Manual);
        assert_eq!(ctx.valve_opening(), 42);
    }
    assert_eq!(rig.display.row(LCD_ROW_MODE), "Manual Mode");

    // Bad frames are dropped without touching the valve.
    send(&rig, r#"{"cmd":"set_valve","value":150}"#);
    send(&rig, "garbage without json");
    send(&rig, r#"{"cmd":"open_sesame","value":1}"#);
    run_until(&mut sched, 2_000);
    assert_eq!(rig.ctx.borrow().valve_opening(), 42);

    send(&rig, r#"boot noise {"cmd":"set_valve","value":10}"#);
    run_until(&mut sched, 3_000);
    assert_eq!(rig.ctx.borrow().valve_opening(), 10);
    assert_eq!(rig.display.row(LCD_ROW_VALVE), "Valve: 10%");
}

#[test]
fn silent_link_falls_back_to_the_pot() {
    let rig = WcsRig::new();
    rig.pot.set_percent(20);
    let (mut sys, mut valve, mut link, mut lcd) =
        (rig.system_task(), rig.valve_task(), rig.link_task(), rig.lcd_task());
    let mut sched = scheduler(&rig.config, &mut sys, &mut valve, &mut link, &mut lcd);

    send(&rig, r#"{"cmd":"set_mode","value":"AUTOMATIC"}"#);
    send(&rig, r#"{"cmd":"set_valve","value":80}"#);
    run_until(&mut sched, 1_000);
    assert_eq!(rig.ctx.borrow().valve_opening(), 80);

    // Last valid frame arrived at 100 ms.
    run_until(&mut sched, 10_000);
    assert_eq!(rig.ctx.borrow().mode(), Mode::Automatic);

    run_until(&mut sched, 11_500);
    let ctx = rig.ctx.borrow();
    assert_eq!(ctx.mode(), Mode::Unconnected);
    assert_eq!(ctx.valve_opening(), 20);
    assert_eq!(rig.display.row(LCD_ROW_MODE), "Unconnected");
}

#[test]
fn button_press_reported_once() {
    let rig = WcsRig::new();
    let (mut sys, mut valve, mut link, mut lcd) =
        (rig.system_task(), rig.valve_task(), rig.link_task(), rig.lcd_task());
    let mut sched = scheduler(&rig.config, &mut sys, &mut valve, &mut link, &mut lcd);

    run_until(&mut sched, 1_000);
    rig.button.set(false);
    run_until(&mut sched, 3_000);
    rig.button.set(true);
    run_until(&mut sched, 4_000);

    let presses = rig.events("button_pressed");
    assert_eq!(presses.len(), 1);
    let ts = presses[0]["timestamp"].as_u64().unwrap();
    assert!((1_000..=1_600).contains(&ts), "press reported at {ts}");
}

#[test]
fn heartbeat_every_second() {
    let rig = WcsRig::new();
    rig.pot.set_percent(30);
    let (mut sys, mut valve, mut link, mut lcd) =
        (rig.system_task(), rig.valve_task(), rig.link_task(), rig.lcd_task());
    let mut sched = scheduler(&rig.config, &mut sys, &mut valve, &mut link, &mut lcd);

    run_until(&mut sched, 5_000);

    let beats = rig.events("heartbeat");
    let uptimes: Vec<u64> = beats.iter().map(|b| b["uptime"].as_u64().unwrap()).collect();
    assert_eq!(uptimes, vec![1_000, 2_000, 3_000, 4_000, 5_000]);
    assert!(beats.iter().all(|b| b["mode"] == "UNCONNECTED"));
    assert_eq!(beats.last().unwrap()["valve_pos"], 30);
}

#[test]
fn lcd_rows_rewritten_only_on_change() {
    let rig = WcsRig::new();
    rig.pot.set_percent(55);
    let (mut sys, mut valve, mut link, mut lcd) =
        (rig.system_task(), rig.valve_task(), rig.link_task(), rig.lcd_task());
    let mut sched = scheduler(&rig.config, &mut sys, &mut valve, &mut link, &mut lcd);

    run_until(&mut sched, 3_000);
    assert_eq!(rig.display.writes(LCD_ROW_MODE), 1);
    assert_eq!(rig.display.writes(LCD_ROW_VALVE), 1);

    rig.pot.set_percent(65);
    run_until(&mut sched, 4_000);
    assert_eq!(rig.display.writes(LCD_ROW_VALVE), 2);
    assert_eq!(rig.display.row(LCD_ROW_VALVE), "Valve: 65%");
}
