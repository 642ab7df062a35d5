//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Saturate a value between `min` and `max`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// One dimensional piecewise linear interpolation.
///
/// `xs` must be strictly increasing and the same length as `ys`, which the
/// caller is responsible for checking. Values of `x` outside `xs` are held at
/// the first or last value of `ys`, no extrapolation is performed. A NaN `x`
/// returns the first value of `ys`.
///
/// Returns `None` if `xs` is empty or `ys` is shorter than `xs`.
pub fn interp<T>(x: T, xs: &[T], ys: &[T]) -> Option<T>
where
    T: Float
{
    if xs.is_empty() || ys.len() < xs.len() {
        return None
    }

    let first = ys[0];
    let last = ys[xs.len() - 1];

    if x.is_nan() || x <= xs[0] {
        return Some(first)
    }
    if x >= xs[xs.len() - 1] {
        return Some(last)
    }

    // Index of the first point strictly above x, guaranteed to be in 1..len
    let hi = xs.partition_point(|xi| *xi <= x);
    let lo = hi - 1;

    Some(lin_map((xs[lo], xs[hi]), (ys[lo], ys[hi]), x))
}
