//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Rounding behavior when a scaled effect lands between integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rounding {
    /// Round to the nearest integer
    Nearest,
    /// Always round down (floor)
    Down,
    /// Always round up (ceiling)
    Up,
}

/// Clamp a f64 to the i32 range after applying `rounding`, returning 0 for NaN.
#[must_use]
pub fn round_f64_to_i32(value: f64, rounding: Rounding) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max);
    let rounded = match rounding {
        Rounding::Nearest => clamped.round(),
        Rounding::Down => clamped.floor(),
        Rounding::Up => clamped.ceil(),
    };
    cast::<f64, i32>(rounded).unwrap_or(0)
}

/// Scale an integer magnitude by `factor`, rounding as requested.
#[must_use]
pub fn scale_i32(value: i32, factor: f64, rounding: Rounding) -> i32 {
    round_f64_to_i32(f64::from(value) * factor, rounding)
}
