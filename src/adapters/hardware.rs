//! On-chip peripherals reached through raw ESP-IDF calls.
//!
//! Only the ADC needs this: esp-idf-hal covers GPIO, LEDC, UART and I2C,
//! which the binaries construct directly.

use esp_idf_svc::sys::*;
use log::info;

use crate::app::ports::AnalogInput;
use crate::error::{Error, SensorError};

/// One ADC1 channel in oneshot mode, 12-bit, 12 dB attenuation (0-3.3 V).
pub struct Adc1Channel {
    handle: adc_oneshot_unit_handle_t,
    channel: adc_channel_t,
}

// SAFETY: the handle is owned by this value and only used through
// `&mut self`, so it never crosses threads concurrently.
unsafe impl Send for Adc1Channel {}

impl Adc1Channel {
    pub fn new(channel: u32) -> Result<Self, Error> {
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: both pointers are valid for the duration of the call.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(Error::Init("ADC1 unit"));
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        // SAFETY: `handle` was just created and is exclusively ours.
        let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            // SAFETY: same handle, not used again.
            unsafe { adc_oneshot_del_unit(handle) };
            return Err(Error::Init("ADC1 channel"));
        }

        info!("ADC: ADC1 channel {} configured", channel);
        Ok(Self { handle, channel })
    }
}

impl AnalogInput for Adc1Channel {
    fn full_scale(&self) -> u16 {
        4095
    }

    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let mut raw: i32 = 0;
        // SAFETY: handle is live until drop; `raw` outlives the call.
        let ret = unsafe { adc_oneshot_read(self.handle, self.channel, &mut raw) };
        if ret != ESP_OK as i32 {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(raw.clamp(0, 4095) as u16)
    }
}

impl Drop for Adc1Channel {
    fn drop(&mut self) {
        // SAFETY: last use of the handle.
        unsafe { adc_oneshot_del_unit(self.handle) };
    }
}
