//! Water channel subsystem firmware.
//!
//! Four cooperative tasks on one thread, sharing one [`WcsContext`]:
//!
//! | Task   | Period | Owns                        |
//! |--------|--------|-----------------------------|
//! | system | 200 ms | button, potentiometer, mode |
//! | valve  | 100 ms | servo                       |
//! | link   | 100 ms | UART to the central unit    |
//! | lcd    | 250 ms | 20x4 character display      |

use core::cell::RefCell;

use anyhow::{Result, anyhow};
use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::hal::uart::{self, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use log::info;

use tankflow::adapters::hardware::Adc1Channel;
use tankflow::adapters::{SystemClock, UartLink};
use tankflow::config::{LCD_COLS, LCD_I2C_ADDR, LCD_ROWS, WcsConfig};
use tankflow::context::WcsContext;
use tankflow::drivers::{DebouncedButton, Hd44780, PwmServo};
use tankflow::kernel::{Scheduler, Task};
use tankflow::pins;
use tankflow::sensors::AnalogPotentiometer;
use tankflow::tasks::{LcdTask, LinkTask, SystemTask, ValveTask};

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("SYS: tankflow WCS v{}", env!("CARGO_PKG_VERSION"));

    let config = WcsConfig::default();
    config.validate()?;

    let peripherals = Peripherals::take()?;
    let ctx = RefCell::new(WcsContext::new());

    // ── Operator inputs ──────────────────────────────────────
    let mut button_pin = PinDriver::input(peripherals.pins.gpio27)?;
    button_pin.set_pull(Pull::Up)?;
    let button = DebouncedButton::new(button_pin, true);
    let pot = AnalogPotentiometer::new(Adc1Channel::new(pins::wcs::POT_ADC1_CHANNEL)?);
    info!(
        "SYS: button GPIO{} pot GPIO{}",
        pins::wcs::BUTTON_GPIO,
        pins::wcs::POT_ADC_GPIO
    );

    // ── Valve servo (LEDC 50 Hz, 14-bit) ─────────────────────
    let servo_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig {
            frequency: Hertz(50),
            resolution: Resolution::Bits14,
            ..Default::default()
        },
    )?;
    let servo_pwm =
        LedcDriver::new(peripherals.ledc.channel0, &servo_timer, peripherals.pins.gpio13)?;
    let servo = PwmServo::new(servo_pwm);
    info!("SYS: servo GPIO{}", pins::wcs::SERVO_GPIO);

    // ── Serial link ──────────────────────────────────────────
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio16,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart::config::Config::default().baudrate(Hertz(config.serial_baud)),
    )?;
    let link = UartLink::new(uart);
    info!(
        "SYS: link UART1 TX GPIO{} RX GPIO{} at {} bps",
        pins::wcs::LINK_TX_GPIO,
        pins::wcs::LINK_RX_GPIO,
        config.serial_baud
    );

    // ── LCD ──────────────────────────────────────────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(100_000)),
    )?;
    let mut lcd = Hd44780::new(i2c, Ets, LCD_I2C_ADDR, LCD_COLS as u8, LCD_ROWS as u8);
    lcd.init();

    // ── Tasks ────────────────────────────────────────────────
    let mut system = SystemTask::new(&ctx, button, pot, config.link_stale_timeout_ms);
    let mut valve = ValveTask::new(&ctx, servo, config.msec_per_percent);
    let mut link = LinkTask::new(
        &ctx,
        link,
        config.heartbeat_period_ms,
        config.pot_change_threshold,
    );
    let mut lcd = LcdTask::new(&ctx, lcd);

    let mut sched: Scheduler<'_> = Scheduler::new(config.base_period_ms);
    let tasks: [(&mut dyn Task, _); 4] = [
        (&mut system, config.system_period_ms),
        (&mut valve, config.valve_period_ms),
        (&mut link, config.link_period_ms),
        (&mut lcd, config.lcd_period_ms),
    ];
    for (task, period) in tasks {
        let name = task.name();
        sched
            .register(task, period)
            .ok_or_else(|| anyhow!("task '{}' not scheduled", name))?;
    }

    sched.run(&SystemClock::new())
}
