//! Packed position codec
//!
//! Positions cross the wire as unsigned 16-bit values with two decimal
//! digits: `raw = (position + offset) × 100`. Values below the offset clamp
//! to zero, values past the top of the range clamp to `u16::MAX`. Neither
//! direction ever wraps.

/// Fixed-point scale (two decimal digits)
pub const PACK_SCALE: f32 = 100.0;

/// Pack a physical position into a u16
pub fn pack_position(position: f32, offset: f32) -> u16 {
    let scaled = (position + offset) * PACK_SCALE;
    // NaN also lands here
    if !(scaled > 0.0) {
        return 0;
    }
    if scaled >= u16::MAX as f32 {
        return u16::MAX;
    }
    (scaled + 0.5) as u16
}

/// Recover a physical position from its packed form
pub fn unpack_position(raw: u16, offset: f32) -> f32 {
    raw as f32 / PACK_SCALE - offset
}

/// Pack a position and split it big-endian
pub fn pack_position_be(position: f32, offset: f32) -> [u8; 2] {
    pack_position(position, offset).to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pack_zero_at_offset() {
        assert_eq!(pack_position(0.0, 90.0), 9000);
        assert_eq!(pack_position(-90.0, 90.0), 0);
    }

    #[test]
    fn test_pack_negative_clamps_to_zero() {
        assert_eq!(pack_position(-150.0, 90.0), 0);
        assert_eq!(pack_position(-1.0e9, 200.0), 0);
        assert_eq!(pack_position(f32::NAN, 90.0), 0);
    }

    #[test]
    fn test_pack_overflow_saturates() {
        assert_eq!(pack_position(1000.0, 90.0), u16::MAX);
        assert_eq!(pack_position(f32::INFINITY, 90.0), u16::MAX);
    }

    #[test]
    fn test_pack_big_endian_bytes() {
        // 12.34 + 90 = 102.34 → 10234 = 0x27FA
        assert_eq!(pack_position_be(12.34, 90.0), [0x27, 0xFA]);
    }

    #[test]
    fn test_unpack_applies_offset() {
        assert!((unpack_position(20000, 200.0) - 0.0).abs() < 1e-4);
        assert!((unpack_position(20100, 200.0) - 1.0).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_roundtrip_within_two_decimals(position in -89.99f32..500.0) {
            let decoded = unpack_position(pack_position(position, 90.0), 90.0);
            prop_assert!((decoded - position).abs() <= 0.006, "{} -> {}", position, decoded);
        }

        #[test]
        fn prop_below_range_never_wraps(position in -10_000.0f32..-200.0) {
            prop_assert_eq!(pack_position(position, 200.0), 0);
        }
    }
}
