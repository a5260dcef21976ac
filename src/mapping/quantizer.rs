//! Axis quantizer: real values to the 8-bit axis range.
//!
//! Rounding mode is `floor`, never `round`. The linear map is written as
//! `((v - mid) / half + 1) * 127.5` so symmetric ranges `[-r, r]` produce
//! bit-identical results to `((v / r) + 1) * 127.5`.

/// Rest value of an axis.
pub const NEUTRAL: u8 = 128;

/// Upper bound of an axis.
pub const AXIS_MAX: u8 = 255;

const HALF_SPAN: f64 = AXIS_MAX as f64 / 2.0;

/// Linear map of `value` from `[min, max]` onto `[0.0, 255.0]`, without flooring or clamping.
///
/// A degenerate range maps everything onto the center level.
pub fn scale(value: f64, min: f64, max: f64) -> f64 {
    let half = (max - min) / 2.0;
    if !(half > 0.0) {
        return HALF_SPAN;
    }
    let mid = min + half;
    ((value - mid) / half + 1.0) * HALF_SPAN
}

/// Floors a level and clamps it into `[0, 255]`.
pub fn quantize_level(level: f64) -> u8 {
    level.floor().max(0.0).min(AXIS_MAX as f64) as u8
}

/// `quantize(value, min, max)`: linear map, floor, clamp.
pub fn quantize(value: f64, min: f64, max: f64) -> u8 {
    quantize_level(scale(value, min, max))
}

/// Snaps axis values within `radius` of `center` (inclusive) to exactly `center`.
pub fn deadzone_collapse(value: u8, center: u8, radius: u8) -> u8 {
    if value.abs_diff(center) <= radius {
        center
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn maps_range_endpoints_and_center() {
        assert_eq!(quantize(-45.0, -45.0, 45.0), 0);
        assert_eq!(quantize(45.0, -45.0, 45.0), 255);
        // 127.5 floors to 127, not 128
        assert_eq!(quantize(0.0, -45.0, 45.0), 127);
        assert_eq!(quantize(0.0, 0.0, 1.0), 0);
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(quantize(-1000.0, -10.0, 10.0), 0);
        assert_eq!(quantize(1000.0, -10.0, 10.0), 255);
    }

    #[test]
    fn degenerate_range_is_centered() {
        assert_eq!(quantize(3.0, 5.0, 5.0), 127);
    }

    #[test]
    fn floors_instead_of_rounding() {
        // 0.9 of the way between two levels still floors down
        let r = 45.0;
        let level = scale(10.0, -r, r);
        assert_eq!(quantize(10.0, -r, r), level.floor() as u8);
        assert!(level.fract() > 0.0);
    }

    #[test]
    fn collapse_is_inclusive_at_radius() {
        assert_eq!(deadzone_collapse(118, NEUTRAL, 10), NEUTRAL);
        assert_eq!(deadzone_collapse(138, NEUTRAL, 10), NEUTRAL);
        assert_eq!(deadzone_collapse(117, NEUTRAL, 10), 117);
        assert_eq!(deadzone_collapse(139, NEUTRAL, 10), 139);
        assert_eq!(deadzone_collapse(255, NEUTRAL, 10), 255);
    }

    proptest! {
        #[test]
        fn symmetric_map_matches_reference_formula(r in 1.0f64..500.0, t in -1.0f64..=1.0) {
            let v = r * t;
            let expected = ((v / r) + 1.0) * 127.5;
            prop_assert_eq!(scale(v, -r, r), expected);
            prop_assert_eq!(quantize(v, -r, r), expected.floor().max(0.0).min(255.0) as u8);
        }

        #[test]
        fn quantize_is_monotonic(a in -200.0f64..200.0, b in -200.0f64..200.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(quantize(lo, -100.0, 100.0) <= quantize(hi, -100.0, 100.0));
        }

        #[test]
        fn collapse_never_leaves_the_band(v in 0u8..=255) {
            let out = deadzone_collapse(v, NEUTRAL, 10);
            if v.abs_diff(NEUTRAL) <= 10 {
                prop_assert_eq!(out, NEUTRAL);
            } else {
                prop_assert_eq!(out, v);
            }
        }
    }
}
