//! Field helpers for IO reports
//!
//! Pure conversions from raw payload bytes to channel values. Channel 1 is
//! always the least significant bit (or bit pair) of a packed byte.

/// Number of digital and analog channels in an IO report
pub const CHANNELS: usize = 4;

/// Raw analog byte marking an unused input (line floating, roughly 2 V or more)
pub const ANALOG_UNUSED: u8 = 0xFF;

/// Reading reported for an unused analog input
pub const ANALOG_UNUSED_MV: i16 = -1;

/// Unpack the low four bits of a bitmap, channel 1 first
///
/// Each entry is 0 when the bit is clear and 1 when it is set.
pub fn digital_bits(bitmap: u8) -> [u8; CHANNELS] {
    core::array::from_fn(|ch| (bitmap >> ch) & 0x1)
}

/// Unpack the four 2-bit analog correction values, channel 1 first
pub fn correction_bits(packed: u8) -> [u8; CHANNELS] {
    core::array::from_fn(|ch| (packed >> (2 * ch)) & 0x3)
}

/// Reconstruct an analog reading in millivolts
///
/// The raw byte holds the upper bits of a 10-bit conversion and `correction`
/// the lower two; each count is 4 mV. [`ANALOG_UNUSED`] maps to
/// [`ANALOG_UNUSED_MV`] whatever the correction bits are.
pub fn analog_millivolts(raw: u8, correction: u8) -> i16 {
    if raw == ANALOG_UNUSED {
        return ANALOG_UNUSED_MV;
    }
    ((raw as i16 * 4) + (correction & 0x3) as i16) * 4
}

/// Approximate received signal strength for a link quality value
pub fn lqi_to_dbm(lqi: u8) -> f32 {
    (7.0 * lqi as f32 - 1970.0) / 20.0
}

/// Convert a timestamp in 1/64 s ticks to seconds
pub fn ticks_to_seconds(ticks: u16) -> f32 {
    ticks as f32 / 64.0
}
