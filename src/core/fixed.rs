//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic fixed-point math for combat resolution.
//! All operations use integer arithmetic only - no floats in combat logic.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 units                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Health, damage, armor, durations (seconds) and world coordinates all use
//! this format. Products and squared lengths that can leave the Q16.16 range
//! are computed in `i64` ("wide") and narrowed with saturation.

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

/// 100.0 in fixed-point
pub const FIXED_HUNDRED: Fixed = 100 << FIXED_SCALE;

/// Maximum positive value
pub const FIXED_MAX: Fixed = i32::MAX;

/// Minimum negative value
pub const FIXED_MIN: Fixed = i32::MIN;

// =============================================================================
// COMBAT CONSTANTS (All as integer literals - NO float conversion!)
// =============================================================================

/// Tick duration: 1/60 second = round(65536/60) = 1092
pub const TICK_DURATION: Fixed = 1092;

/// Armor mitigation constant: reduction = armor / (armor + 100)
pub const ARMOR_CONSTANT: Fixed = FIXED_HUNDRED;

/// Default critical hit multiplier: 2.0 = 131072
pub const DEFAULT_CRIT_MULTIPLIER: Fixed = 131072;

/// Healing crit chance: 0.1 = round(0.1 * 65536) = 6554
pub const HEAL_CRIT_CHANCE: Fixed = 6554;

/// Healing crit multiplier: 1.5 = 98304
pub const HEAL_CRIT_MULTIPLIER: Fixed = 98304;

/// Explosive damage always penetrates at least half the armor: 0.5
pub const EXPLOSIVE_MIN_PENETRATION: Fixed = FIXED_HALF;

/// Share of energy damage the shield can absorb: 0.5
pub const ENERGY_SHIELD_RATIO: Fixed = FIXED_HALF;

// =============================================================================
// CORE OPERATIONS (All deterministic)
// =============================================================================

/// Convert a compile-time float to fixed-point.
///
/// # Warning
/// Only use at compile-time or initialization. NEVER in tick loop.
///
/// # Example
/// ```
/// use relic_combat::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert an integer to fixed-point.
#[inline]
pub const fn from_int(i: i32) -> Fixed {
    i << FIXED_SCALE
}

/// Convert fixed-point to float for display/logging.
///
/// # Warning
/// Only use for visual output. NEVER use result in combat logic.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Narrow a wide (i64, Q16.16) value back to `Fixed`, saturating.
#[inline]
pub fn saturate(wide: i64) -> Fixed {
    wide.clamp(FIXED_MIN as i64, FIXED_MAX as i64) as Fixed
}

/// Multiply two fixed-point numbers.
///
/// Uses an i64 intermediate, truncates toward negative infinity and
/// saturates at the Q16.16 range instead of wrapping.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    saturate(wide >> FIXED_SCALE)
}

/// Divide two fixed-point numbers.
///
/// Pre-shifts numerator to maintain precision.
/// Returns 0 on divide-by-zero (deterministic, never panics).
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0;
    }
    let wide = (a as i64) << FIXED_SCALE;
    saturate(wide / b as i64)
}

/// Integer square root of a u128 (floor).
///
/// Newton iteration from an upper bound; terminates when the estimate stops
/// decreasing, so the result is exact and platform independent.
fn isqrt_u128(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let bits = 128 - n.leading_zeros();
    let mut x: u128 = 1 << bits.div_ceil(2);
    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Square root of a fixed-point number.
///
/// Returns 0 for non-positive inputs.
#[inline]
pub fn fixed_sqrt(x: Fixed) -> Fixed {
    fixed_sqrt_wide(x as i64)
}

/// Square root of a wide (i64, Q16.16) value, e.g. a squared distance.
///
/// Returns 0 for non-positive inputs, saturates at `FIXED_MAX`.
#[inline]
pub fn fixed_sqrt_wide(x: i64) -> Fixed {
    if x <= 0 {
        return 0;
    }
    let root = isqrt_u128((x as u128) << FIXED_SCALE);
    root.min(FIXED_MAX as u128) as Fixed
}

/// Minimum of two fixed-point numbers.
#[inline]
pub fn fixed_min(a: Fixed, b: Fixed) -> Fixed {
    if a < b { a } else { b }
}

/// Maximum of two fixed-point numbers.
#[inline]
pub fn fixed_max(a: Fixed, b: Fixed) -> Fixed {
    if a > b { a } else { b }
}

/// Clamp a fixed-point number to a range.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    fixed_max(min, fixed_min(max, value))
}

/// Convert a percentage (25.0 = 25%) to a fraction (0.25).
#[inline]
pub fn fixed_percent(value: Fixed) -> Fixed {
    fixed_div(value, FIXED_HUNDRED)
}

// =============================================================================
// TRIGONOMETRY (degrees)
// =============================================================================

/// 180 degrees in fixed-point
pub const DEG_180: Fixed = 180 << FIXED_SCALE;

/// 360 degrees in fixed-point
pub const DEG_360: Fixed = 360 << FIXED_SCALE;

/// Sine of an angle in degrees.
///
/// Bhaskara I approximation, max error ≈ 0.0016. Exact at 0°, 90°, 180°,
/// 270° so cone boundaries at those angles are exact.
pub fn fixed_sin_deg(degrees: Fixed) -> Fixed {
    let mut x = degrees.rem_euclid(DEG_360) as i64;
    let negative = x > DEG_180 as i64;
    if negative {
        x -= DEG_180 as i64;
    }

    // p = x * (180 - x), still in Q16.16
    let p = (x * (DEG_180 as i64 - x)) >> FIXED_SCALE;
    let denominator = (40500i64 << FIXED_SCALE) - p;
    if denominator == 0 {
        return 0;
    }
    let sin = ((4 * p) << FIXED_SCALE) / denominator;

    let sin = sin as Fixed;
    if negative { -sin } else { sin }
}

/// Cosine of an angle in degrees.
#[inline]
pub fn fixed_cos_deg(degrees: Fixed) -> Fixed {
    fixed_sin_deg(degrees.wrapping_add(90 << FIXED_SCALE))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        assert_eq!(FIXED_ONE, 65536);
        assert_eq!(FIXED_HALF, 32768);
        assert_eq!(FIXED_SCALE, 16);
        assert_eq!(ARMOR_CONSTANT, from_int(100));
        assert_eq!(DEFAULT_CRIT_MULTIPLIER, from_int(2));
        assert_eq!(HEAL_CRIT_MULTIPLIER, to_fixed(1.5));
        assert_eq!(HEAL_CRIT_CHANCE, (0.1 * FIXED_ONE as f64).round() as Fixed);
        assert_eq!(TICK_DURATION, (FIXED_ONE as f64 / 60.0).round() as Fixed);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.0), FIXED_ONE);
        assert_eq!(to_fixed(0.5), FIXED_HALF);
        assert_eq!(to_fixed(2.0), FIXED_ONE * 2);
        assert_eq!(to_fixed(-1.0), -FIXED_ONE);
    }

    #[test]
    fn test_fixed_mul() {
        assert_eq!(fixed_mul(to_fixed(2.0), to_fixed(3.0)), to_fixed(6.0));
        assert_eq!(fixed_mul(FIXED_HALF, FIXED_HALF), to_fixed(0.25));
        assert_eq!(fixed_mul(to_fixed(-2.0), to_fixed(3.0)), to_fixed(-6.0));
    }

    #[test]
    fn test_fixed_mul_saturates() {
        let big = from_int(30000);
        assert_eq!(fixed_mul(big, big), FIXED_MAX);
        assert_eq!(fixed_mul(big, -big), FIXED_MIN);
    }

    #[test]
    fn test_fixed_div() {
        assert_eq!(fixed_div(to_fixed(6.0), to_fixed(2.0)), to_fixed(3.0));
        assert_eq!(fixed_div(FIXED_ONE, to_fixed(4.0)), to_fixed(0.25));
        // Divide by zero returns 0
        assert_eq!(fixed_div(FIXED_ONE, 0), 0);
    }

    #[test]
    fn test_fixed_sqrt() {
        assert_eq!(fixed_sqrt(to_fixed(4.0)), to_fixed(2.0));
        assert_eq!(fixed_sqrt(FIXED_ONE), FIXED_ONE);
        assert_eq!(fixed_sqrt(to_fixed(0.25)), FIXED_HALF);
        assert_eq!(fixed_sqrt(0), 0);
        assert_eq!(fixed_sqrt(-FIXED_ONE), 0);
        assert!(fixed_sqrt(1) >= 0);
    }

    #[test]
    fn test_fixed_sqrt_wide_beyond_fixed_range() {
        // 40000.0 does not fit in Q16.16, its root (200.0) does
        let wide = 40000i64 << FIXED_SCALE;
        assert_eq!(fixed_sqrt_wide(wide), from_int(200));
    }

    #[test]
    fn test_fixed_percent() {
        assert_eq!(fixed_percent(from_int(25)), to_fixed(0.25));
        assert_eq!(fixed_percent(from_int(100)), FIXED_ONE);
        assert_eq!(fixed_percent(from_int(-50)), -FIXED_HALF);
    }

    #[test]
    fn test_trig_exact_points() {
        assert_eq!(fixed_sin_deg(0), 0);
        assert_eq!(fixed_sin_deg(from_int(90)), FIXED_ONE);
        assert_eq!(fixed_sin_deg(from_int(180)), 0);
        assert_eq!(fixed_sin_deg(from_int(270)), -FIXED_ONE);
        assert_eq!(fixed_cos_deg(0), FIXED_ONE);
        assert_eq!(fixed_cos_deg(from_int(180)), -FIXED_ONE);
        assert_eq!(fixed_cos_deg(from_int(-180)), -FIXED_ONE);
    }

    #[test]
    fn test_trig_approximation() {
        // cos(60) = 0.5, sin(30) = 0.5
        assert!((fixed_cos_deg(from_int(60)) - FIXED_HALF).abs() < 150);
        assert!((fixed_sin_deg(from_int(30)) - FIXED_HALF).abs() < 150);
        // cos(45) ≈ 0.7071
        assert!((fixed_cos_deg(from_int(45)) - to_fixed(0.70710678)).abs() < 150);
    }

    #[test]
    fn test_fixed_determinism() {
        for _ in 0..1000 {
            let a = 12345678;
            let b = 87654321;
            assert_eq!(fixed_mul(a, b), fixed_mul(a, b));
            assert_eq!(fixed_div(a, b), fixed_div(a, b));
            assert_eq!(fixed_sqrt(a), fixed_sqrt(a));
        }
    }
}
