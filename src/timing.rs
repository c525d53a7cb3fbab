//! Fixed-point rounding and lap time formatting
//!
//! Every derived time in this crate is rounded to four decimals, and sums are
//! rounded after each addition rather than once at the end. Results must agree
//! to the last digit with other results pipelines fed the same data, so the
//! rounding points are part of the numeric contract.

/// Decimals used for every derived time.
pub const TIME_DECIMALS: i32 = 4;

/// Round `value` half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round a time in seconds to four decimals.
pub fn round4(value: f64) -> f64 {
    round_to(value, TIME_DECIMALS)
}

/// Round a percentage to two decimals.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Add `value` to `total` and round the running sum.
pub fn accumulate(total: f64, value: f64) -> f64 {
    round4(total + value)
}

/// Format seconds as `m:ss.ffff`, or `h:mm:ss.ffff` from one hour on.
///
/// ```rust
/// use lapstats::timing::format_time;
///
/// assert_eq!(format_time(117.0), "1:57.0000");
/// assert_eq!(format_time(3725.5), "1:02:05.5000");
/// assert_eq!(format_time(-1.25), "-0:01.2500");
/// ```
pub fn format_time(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let units = (seconds.abs() * 10_000.0).round() as u64;
    let fraction = units % 10_000;
    let whole = units / 10_000;
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;

    if hours > 0 {
        format!("{sign}{hours}:{minutes:02}:{secs:02}.{fraction:04}")
    } else {
        format!("{sign}{minutes}:{secs:02}.{fraction:04}")
    }
}
