//! Tank monitoring subsystem firmware.
//!
//! ```text
//!  core 1: SensorTask  ── sonar ──▶ TmsContext.level ──▶ mailbox
//!  core 0: NetworkTask ◀── mailbox ── WiFi + MQTT ──▶ broker
//! ```
//!
//! The two tasks share nothing but the static [`TmsContext`].

use anyhow::{Result, anyhow};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::info;

use tankflow::adapters::{
    LayeredConnection, MqttAdapter, MqttSettings, SystemClock, WifiAdapter, WifiCredentials,
};
use tankflow::config::TmsConfig;
use tankflow::context::TmsContext;
use tankflow::drivers::GpioLight;
use tankflow::kernel::TaskRunner;
use tankflow::kernel::task_pin::Core;
use tankflow::pins;
use tankflow::sensors::Sonar;
use tankflow::tasks::{NetworkTask, SensorTask};

static CONTEXT: TmsContext = TmsContext::new();

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("SYS: tankflow TMS v{}", env!("CARGO_PKG_VERSION"));

    let config = TmsConfig::default();
    config.validate()?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── Sonar ────────────────────────────────────────────────
    info!(
        "SYS: sonar trig GPIO{} echo GPIO{}",
        pins::tms::SONAR_TRIG_GPIO,
        pins::tms::SONAR_ECHO_GPIO
    );
    let trig = PinDriver::output(peripherals.pins.gpio5)?;
    let echo = PinDriver::input(peripherals.pins.gpio18)?;
    let sonar = Sonar::new(trig, echo, Ets, SystemClock::new(), config.sonar_timeout_us);

    // ── Uplink ───────────────────────────────────────────────
    let wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    let network = WifiAdapter::new(wifi, WifiCredentials::from(&config));
    let protocol = MqttAdapter::new(MqttSettings::from(&config));
    let connection = LayeredConnection::new(network, protocol);

    info!(
        "SYS: LEDs alive GPIO{} error GPIO{}",
        pins::tms::LED_ALIVE_GPIO,
        pins::tms::LED_ERROR_GPIO
    );
    let alive = GpioLight::new(PinDriver::output(peripherals.pins.gpio2)?);
    let error = GpioLight::new(PinDriver::output(peripherals.pins.gpio4)?);

    // ── Tasks ────────────────────────────────────────────────
    let sensor_task = SensorTask::new(sonar, &CONTEXT, &config.level_topic);
    let network_task =
        NetworkTask::new(connection, &CONTEXT, alive, error, config.send_interval_ms);

    let sensor = TaskRunner::new(c"sensor", config.sampling_period_ms)
        .core(Core::App)
        .spawn(sensor_task, SystemClock::new())?;
    let network = TaskRunner::new(c"network", config.network_period_ms)
        .core(Core::Pro)
        .stack_kb(8)
        .spawn(network_task, SystemClock::new())?;

    info!("SYS: tasks running");
    sensor.join().map_err(|_| anyhow!("sensor task panicked"))?;
    network.join().map_err(|_| anyhow!("network task panicked"))?;
    Ok(())
}
