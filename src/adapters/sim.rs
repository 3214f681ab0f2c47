//! Host simulation devices.
//!
//! In-memory stand-ins for every peripheral the tasks touch.  Each one is a
//! cheap handle over shared state: clone it, hand one copy to the driver
//! or adapter under test, and keep the other to poke inputs and inspect
//! outputs.

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation};
use embedded_hal::pwm::{self, SetDutyCycle};

use crate::app::ports::{AnalogInput, Display, ProximitySensor};
use crate::error::SensorError;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ───────────────────────────────────────────────────────────────
// GPIO
// ───────────────────────────────────────────────────────────────

/// A digital line both sides can read and drive.
#[derive(Debug, Clone)]
pub struct SimPin(Arc<AtomicBool>);

impl SimPin {
    pub fn new(high: bool) -> Self {
        Self(Arc::new(AtomicBool::new(high)))
    }

    pub fn set(&self, high: bool) {
        self.0.store(high, Ordering::SeqCst);
    }

    pub fn level(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// PWM / ADC / delay
// ───────────────────────────────────────────────────────────────

/// PWM channel that remembers its last duty.
#[derive(Debug, Clone)]
pub struct SimPwm {
    duty: Arc<AtomicU16>,
    max: u16,
}

impl SimPwm {
    pub fn new(max: u16) -> Self {
        Self {
            duty: Arc::new(AtomicU16::new(0)),
            max,
        }
    }

    pub fn duty(&self) -> u16 {
        self.duty.load(Ordering::SeqCst)
    }
}

impl pwm::ErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.duty.store(duty.min(self.max), Ordering::SeqCst);
        Ok(())
    }
}

/// ADC channel with a settable raw reading.
#[derive(Debug, Clone)]
pub struct SimAnalog {
    raw: Arc<AtomicU16>,
    fail: Arc<AtomicBool>,
    full_scale: u16,
}

impl SimAnalog {
    pub fn new(full_scale: u16) -> Self {
        Self {
            raw: Arc::new(AtomicU16::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
            full_scale,
        }
    }

    pub fn set(&self, raw: u16) {
        self.raw.store(raw, Ordering::SeqCst);
    }

    /// Set the wiper to `percent` of full scale.
    pub fn set_percent(&self, percent: u8) {
        let raw = u32::from(self.full_scale) * u32::from(percent.min(100)) / 100;
        self.set(raw as u16);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl AnalogInput for SimAnalog {
    fn full_scale(&self) -> u16 {
        self.full_scale
    }

    fn read_raw(&mut self) -> Result<u16, SensorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(self.raw.load(Ordering::SeqCst))
    }
}

/// Delay that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimDelay;

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ───────────────────────────────────────────────────────────────
// I2C
// ───────────────────────────────────────────────────────────────

/// I2C bus that records every written byte.
#[derive(Debug, Clone, Default)]
pub struct SimI2c {
    written: Arc<Mutex<Vec<(u8, u8)>>>,
}

impl SimI2c {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(address, byte)` pairs in write order.
    pub fn written(&self) -> Vec<(u8, u8)> {
        lock(&self.written).clone()
    }

    pub fn clear(&self) {
        lock(&self.written).clear();
    }
}

impl i2c::ErrorType for SimI2c {
    type Error = Infallible;
}

impl I2c for SimI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Infallible> {
        let mut written = lock(&self.written);
        for op in operations {
            match op {
                Operation::Write(bytes) => written.extend(bytes.iter().map(|b| (address, *b))),
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Higher-level devices
// ───────────────────────────────────────────────────────────────

/// Character display that keeps the current text of each row and counts
/// how many times each row was written.
#[derive(Debug, Clone, Default)]
pub struct SimDisplay {
    rows: Arc<Mutex<Vec<(String, u32)>>>,
}

impl SimDisplay {
    pub fn new(rows: usize) -> Self {
        Self {
            rows: Arc::new(Mutex::new(vec![(String::new(), 0); rows])),
        }
    }

    pub fn row(&self, row: usize) -> String {
        lock(&self.rows).get(row).map(|r| r.0.clone()).unwrap_or_default()
    }

    pub fn writes(&self, row: usize) -> u32 {
        lock(&self.rows).get(row).map_or(0, |r| r.1)
    }
}

impl Display for SimDisplay {
    fn print_line(&mut self, row: u8, text: &str) {
        if let Some(r) = lock(&self.rows).get_mut(usize::from(row)) {
            r.0 = text.to_owned();
            r.1 += 1;
        }
    }
}

/// Distance sensor fed from a script.  The last reading repeats once the
/// script runs out.
#[derive(Debug, Clone)]
pub struct SimProximity {
    script: Arc<Mutex<VecDeque<f32>>>,
    last: Arc<Mutex<f32>>,
    reads: Arc<AtomicU32>,
}

impl SimProximity {
    pub fn new(initial: f32) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            last: Arc::new(Mutex::new(initial)),
            reads: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn push(&self, reading: f32) {
        lock(&self.script).push_back(reading);
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ProximitySensor for SimProximity {
    fn distance_cm(&mut self) -> f32 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut last = lock(&self.last);
        if let Some(next) = lock(&self.script).pop_front() {
            *last = next;
        }
        *last
    }
}

// ───────────────────────────────────────────────────────────────
// Network and serial peers
// ───────────────────────────────────────────────────────────────

/// The access point a simulated WiFi station associates with.
#[derive(Debug, Clone)]
pub struct SimAccessPoint {
    up: Arc<AtomicBool>,
}

impl SimAccessPoint {
    pub fn new(up: bool) -> Self {
        Self {
            up: Arc::new(AtomicBool::new(up)),
        }
    }

    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }

    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}

/// A broker that records what it receives.
#[derive(Debug, Clone)]
pub struct SimBroker {
    up: Arc<AtomicBool>,
    reject_next: Arc<AtomicU32>,
    published: Arc<Mutex<Vec<(String, String)>>>,
}

impl SimBroker {
    pub fn new(up: bool) -> Self {
        Self {
            up: Arc::new(AtomicBool::new(up)),
            reject_next: Arc::new(AtomicU32::new(0)),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }

    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }

    /// Refuse the next `n` publishes.
    pub fn reject_next(&self, n: u32) {
        self.reject_next.store(n, Ordering::SeqCst);
    }

    /// Accept or refuse one publish.
    pub fn publish(&self, topic: &str, payload: &str) -> bool {
        if !self.is_up() {
            return false;
        }
        let refused = self
            .reject_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return false;
        }
        lock(&self.published).push((topic.to_owned(), payload.to_owned()));
        true
    }

    /// `(topic, payload)` in arrival order.
    pub fn published(&self) -> Vec<(String, String)> {
        lock(&self.published).clone()
    }
}

/// Both ends of a serial cable.
#[derive(Debug, Clone, Default)]
pub struct SimWire {
    to_device: Arc<Mutex<VecDeque<u8>>>,
    tx_partial: Arc<Mutex<Vec<u8>>>,
    from_device: Arc<Mutex<Vec<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl SimWire {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes the remote end sends to the device.
    pub fn inject(&self, data: &str) {
        lock(&self.to_device).extend(data.bytes());
    }

    /// Device side: take up to `buf.len()` pending bytes.
    pub fn read(&self, buf: &mut [u8]) -> usize {
        let mut rx = lock(&self.to_device);
        let n = buf.len().min(rx.len());
        for (slot, b) in buf.iter_mut().zip(rx.drain(..n)) {
            *slot = b;
        }
        n
    }

    /// Device side: raw bytes written.  Each `\n` completes one line.
    pub fn write_bytes(&self, data: &[u8]) -> bool {
        if self.fail_writes.load(Ordering::SeqCst) {
            return false;
        }
        let mut partial = lock(&self.tx_partial);
        for &b in data {
            if b == b'\n' {
                let line = String::from_utf8_lossy(&partial).into_owned();
                lock(&self.from_device).push(line);
                partial.clear();
            } else {
                partial.push(b);
            }
        }
        true
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Complete lines the device wrote, in order, without terminators.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.from_device).clone()
    }

    pub fn clear_sent(&self) {
        lock(&self.from_device).clear();
    }
}
