//! Raw GPIO and ADC access.
//!
//! Relay and lock pins are claimed and released at runtime as modes come
//! and go, so unlike a one-shot init these helpers are called from the
//! main loop. ADC1 is brought up once from `main()`; channels are
//! configured on demand with the width the caller asks for.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

// ── Error type ────────────────────────────────────────────────

/// Errors during peripheral initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    AdcChannelFailed(i32),
    GpioConfigFailed(i32),
    UnknownAdcPin(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::AdcChannelFailed(rc) => write!(f, "ADC1 channel config failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::UnknownAdcPin(pin)   => write!(f, "GPIO{} is not an ADC1 pin", pin),
        }
    }
}

/// ADC1 channel behind a GPIO on the classic ESP32.
pub fn adc1_channel(gpio: i32) -> Option<u32> {
    match gpio {
        36 => Some(0),
        37 => Some(1),
        38 => Some(2),
        39 => Some(3),
        32 => Some(4),
        33 => Some(5),
        34 => Some(6),
        35 => Some(7),
        _ => None,
    }
}

/// Oneshot ADC supports 9..=12 bit conversions; wider requests get 12.
pub fn hw_adc_bits(requested: u8) -> u8 {
    requested.clamp(9, 12)
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the main task. `init_adc()` writes the
/// handle once before the loop starts; every later access is a read.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
pub fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }
    info!("hw_init: ADC1 unit ready");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_adc() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ADC init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_configure(gpio: i32, bits: u8) -> Result<(), HwInitError> {
    let channel = adc1_channel(gpio).ok_or(HwInitError::UnknownAdcPin(gpio))?;
    let bitwidth = match hw_adc_bits(bits) {
        9 => adc_bitwidth_t_ADC_BITWIDTH_9,
        10 => adc_bitwidth_t_ADC_BITWIDTH_10,
        11 => adc_bitwidth_t_ADC_BITWIDTH_11,
        _ => adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth,
    };
    // SAFETY: adc1_handle() contract; main task only.
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcChannelFailed(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_configure(gpio: i32, _bits: u8) -> Result<(), HwInitError> {
    adc1_channel(gpio).map(|_| ()).ok_or(HwInitError::UnknownAdcPin(gpio))
}

/// One conversion; 0 on any driver error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(gpio: i32) -> u16 {
    let Some(channel) = adc1_channel(gpio) else {
        return 0;
    };
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; main task only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_gpio: i32) -> u16 {
    0
}

// ── GPIO ──────────────────────────────────────────────────────

/// Push-pull output, driven LOW before it is enabled.
#[cfg(target_os = "espidf")]
pub fn gpio_claim_output(pin: i32) -> Result<(), HwInitError> {
    // SAFETY: plain register configuration of a pin the caller owns.
    unsafe {
        gpio_set_level(pin, 0);
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = gpio_config(&cfg);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        gpio_set_level(pin, 0);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_claim_output(_pin: i32) -> Result<(), HwInitError> {
    Ok(())
}

/// Back to a floating input with no pulls.
#[cfg(target_os = "espidf")]
pub fn gpio_release(pin: i32) {
    // SAFETY: resets only the given pin.
    unsafe {
        gpio_reset_pin(pin);
        gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_release(_pin: i32) {}

/// Active-low input with the internal pull-up.
#[cfg(target_os = "espidf")]
pub fn gpio_configure_button(pin: i32) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: one-shot config of the button pin from main().
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    info!("hw_init: button on GPIO{} configured", pin);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_configure_button(_pin: i32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): button config skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Idle level of an active-low input.
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured by gpio_claim_output(); main loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}
