//! LED-bar encodings
//!
//! Pure functions mapping a value onto the byte shifted into the 8-segment
//! bar. Bit 0 is the first LED of the bar.

/// Largest temperature that still has a valid 7.1 encoding (exclusive).
pub const TEMPERATURE_LIMIT: f32 = 127.75;

/// Pattern shown for temperatures outside [0, 127.75).
pub const TEMPERATURE_INVALID: u8 = 0xFF;

/// Number of segments on the bar.
pub const BAR_SEGMENTS: u8 = 8;

/// `floor` for the range of values the encoders see, without libm.
fn floor_i32(value: f32) -> i32 {
    let truncated = value as i32;
    if (truncated as f32) > value {
        truncated.saturating_sub(1)
    } else {
        truncated
    }
}

/// Low-justified bar with `count` segments lit.
///
/// `count` is taken modulo 9, so 9 lit segments wrap to an empty bar instead
/// of saturating.
pub fn bar(count: i32) -> u8 {
    let count = count.rem_euclid(BAR_SEGMENTS as i32 + 1) as u32;
    ((1u16 << count) - 1) as u8
}

/// Potentiometer as a filled bar: `floor(normalized * 8 + 0.5)` segments.
///
/// Inputs outside [0, 1] wrap through [`bar`]: 1.2 lights one segment and a
/// slightly negative value lights all eight. NaN and infinities give an empty
/// bar.
pub fn pot_bar(normalized: f32) -> u8 {
    if !normalized.is_finite() {
        return 0x00;
    }

    bar(floor_i32(normalized * BAR_SEGMENTS as f32 + 0.5))
}

/// Potentiometer as a binary number: the top 8 bits of the 10-bit result.
pub fn pot_raw(raw: u16) -> u8 {
    (raw >> 2) as u8
}

/// Button counter, shown as-is.
pub fn counter(value: u8) -> u8 {
    value
}

/// Temperature as unsigned 7.1 fixed point, rounded to the nearest half degree.
///
/// Negative, NaN and values from 127.75 °C upwards show [`TEMPERATURE_INVALID`].
/// Note that 127.5 °C legitimately encodes to the same pattern.
pub fn temperature(celsius: f32) -> u8 {
    if !(celsius >= 0.0 && celsius < TEMPERATURE_LIMIT) {
        return TEMPERATURE_INVALID;
    }

    ((celsius + 0.25) * 2.0) as u8
}

/// Inverse of [`temperature`] for valid patterns.
pub fn decode_temperature(pattern: u8) -> f32 {
    pattern as f32 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_fill() {
        assert_eq!(bar(0), 0x00);
        assert_eq!(bar(1), 0x01);
        assert_eq!(bar(4), 0x0F);
        assert_eq!(bar(7), 0x7F);
        assert_eq!(bar(8), 0xFF);
    }

    #[test]
    fn test_bar_wraps_modulo_nine() {
        assert_eq!(bar(9), 0x00);
        assert_eq!(bar(10), 0x01);
        assert_eq!(bar(17), 0xFF);
        assert_eq!(bar(-1), 0xFF);
    }

    #[test]
    fn test_pot_bar() {
        assert_eq!(pot_bar(0.0), 0x00);
        assert_eq!(pot_bar(0.5), 0x0F);
        assert_eq!(pot_bar(1.0), 0xFF);

        // Rounds to the nearest segment.
        assert_eq!(pot_bar(0.06), 0x00);
        assert_eq!(pot_bar(0.07), 0x01);
        assert_eq!(pot_bar(0.93), 0x7F);
        assert_eq!(pot_bar(0.94), 0xFF);
    }

    #[test]
    fn test_pot_bar_out_of_range_wraps() {
        // 1.2 * 8 + 0.5 = 10.1 -> 10 mod 9 = 1
        assert_eq!(pot_bar(1.2), 0x01);
        // -0.1 * 8 + 0.5 = -0.3 -> floor -1 -> 8
        assert_eq!(pot_bar(-0.1), 0xFF);
        assert_eq!(pot_bar(f32::NAN), 0x00);
        assert_eq!(pot_bar(f32::INFINITY), 0x00);
        assert_eq!(pot_bar(f32::NEG_INFINITY), 0x00);
        // Saturates at i32::MIN, which is 7 mod 9.
        assert_eq!(pot_bar(-1.0e10), 0x7F);
        assert_eq!(pot_bar(1.0e10), 0x01);
    }

    #[test]
    fn test_pot_raw() {
        assert_eq!(pot_raw(0), 0x00);
        assert_eq!(pot_raw(3), 0x00);
        assert_eq!(pot_raw(4), 0x01);
        assert_eq!(pot_raw(512), 0x80);
        assert_eq!(pot_raw(1023), 0xFF);
    }

    #[test]
    fn test_counter_is_verbatim() {
        for value in [0x00, 0x0A, 0x80, 0xFF] {
            assert_eq!(counter(value), value);
        }
    }

    #[test]
    fn test_temperature_pinned_values() {
        assert_eq!(temperature(0.0), 0);
        assert_eq!(temperature(22.0), 44);
        // (22.1 + 0.25) * 2 = 44.7 -> 44
        assert_eq!(temperature(22.1), 44);
        // (22.25 + 0.25) * 2 = 45.0 exactly
        assert_eq!(temperature(22.25), 45);
        assert_eq!(temperature(22.35), 45);
        // Largest valid value, sharing its pattern with the sentinel.
        assert_eq!(temperature(127.74), 0xFF);
    }

    #[test]
    fn test_temperature_out_of_range() {
        assert_eq!(temperature(-0.1), TEMPERATURE_INVALID);
        assert_eq!(temperature(-9999.0), TEMPERATURE_INVALID);
        assert_eq!(temperature(127.75), TEMPERATURE_INVALID);
        assert_eq!(temperature(128.0), TEMPERATURE_INVALID);
        assert_eq!(temperature(f32::NAN), TEMPERATURE_INVALID);
        assert_eq!(temperature(f32::INFINITY), TEMPERATURE_INVALID);
    }

    #[test]
    fn test_temperature_round_trip() {
        for pattern in 0..=u8::MAX {
            assert_eq!(temperature(decode_temperature(pattern)), pattern);
        }
    }
}
