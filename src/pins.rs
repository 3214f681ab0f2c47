//! GPIO / peripheral pin assignments for both rig nodes.
//!
//! Single source of truth: the binaries take their pins from here rather
//! than hard-coding numbers.  Both boards are ESP32-WROOM-32 devkits.

/// Tank monitoring subsystem board.
pub mod tms {
    /// HC-SR04 trigger (output).
    pub const SONAR_TRIG_GPIO: i32 = 5;
    /// HC-SR04 echo (input, 5 V tolerant via divider).
    pub const SONAR_ECHO_GPIO: i32 = 18;
    /// Green LED: uplink healthy.
    pub const LED_ALIVE_GPIO: i32 = 2;
    /// Red LED: uplink lost.
    pub const LED_ERROR_GPIO: i32 = 4;
}

/// Water channel subsystem board.
pub mod wcs {
    /// Valve servo signal, LEDC channel 0 at 50 Hz.
    pub const SERVO_GPIO: i32 = 13;
    /// Potentiometer wiper, ADC1 channel 6 (GPIO 34).
    pub const POT_ADC_GPIO: i32 = 34;
    pub const POT_ADC1_CHANNEL: u32 = 6;
    /// Mode button, active-low with internal pull-up.
    pub const BUTTON_GPIO: i32 = 27;
    /// I2C bus for the 20x4 character LCD (PCF8574 backpack).
    pub const LCD_SDA_GPIO: i32 = 21;
    pub const LCD_SCL_GPIO: i32 = 22;
    /// UART1 to the central unit.  UART0 stays the log console.
    pub const LINK_TX_GPIO: i32 = 17;
    pub const LINK_RX_GPIO: i32 = 16;
}
