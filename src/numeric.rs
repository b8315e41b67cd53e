//! Grid quantization and deterministic number rendering.
//!
//! Every numeric field in a map file goes through [`Precision::format`], so
//! identical inputs and settings always produce byte-identical output.

use nalgebra::{Point3, Vector3};

/// Round `value` to the nearest multiple of `grid`.
///
/// Ties go to the even multiple. A zero grid leaves the value untouched.
///
/// # Example
/// ```
/// use brushsmith::numeric::snap;
///
/// assert_eq!(snap(5.0, 4.0), 4.0);
/// assert_eq!(snap(6.0, 4.0), 8.0);
/// assert_eq!(snap(0.3, 0.0), 0.3);
/// ```
#[inline]
pub fn snap(value: f64, grid: f64) -> f64 {
    if grid == 0.0 {
        value
    } else {
        (value / grid).round_ties_even() * grid
    }
}

/// Snap every coordinate of a point to the grid.
pub fn snap_point(point: &Point3<f64>, grid: f64) -> Point3<f64> {
    point.map(|c| snap(c, grid))
}

/// How many digits each number is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// At most this many significant digits (at least one is always kept).
    /// Magnitudes below `1e-10` render as `0`.
    Significant(u32),
    /// Exactly this many decimal places before trailing zeros are trimmed.
    Decimals(u32),
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Significant(5)
    }
}

impl Precision {
    /// Render a number in fixed notation with trailing zeros trimmed.
    ///
    /// Negative zero (including values that round to zero) renders as `0`.
    ///
    /// # Example
    /// ```
    /// use brushsmith::numeric::Precision;
    ///
    /// let p = Precision::Significant(5);
    /// assert_eq!(p.format(1.0), "1");
    /// assert_eq!(p.format(-0.000001), "-0.000001");
    /// assert_eq!(p.format(123.456789), "123.46");
    /// assert_eq!(Precision::Decimals(2).format(-0.001), "0");
    /// ```
    pub fn format(self, value: f64) -> String {
        if !value.is_finite() {
            return format!("{}", value);
        }
        let text = match self {
            Precision::Decimals(places) => format!("{:.*}", places as usize, value),
            Precision::Significant(digits) => format_significant(value, digits.max(1)),
        };
        let trimmed = trim_zeros(&text);
        if trimmed == "-0" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Render several numbers separated by single spaces.
    pub fn format_all(self, values: &[f64]) -> String {
        values
            .iter()
            .map(|&v| self.format(v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render the coordinates of a point.
    pub fn format_point(self, point: &Point3<f64>) -> String {
        self.format_all(&[point.x, point.y, point.z])
    }

    /// Render the components of a vector.
    pub fn format_vector(self, vector: &Vector3<f64>) -> String {
        self.format_all(&[vector.x, vector.y, vector.z])
    }
}

/// Magnitudes below this are rounding noise and render as `0` in
/// significant-digit mode.
const NOISE_FLOOR: f64 = 1e-10;

fn format_significant(value: f64, digits: u32) -> String {
    if value.abs() < NOISE_FLOOR {
        return "0".to_string();
    }
    let digits = digits as i32;
    let exponent = value.abs().log10().floor() as i32;
    let decimals = digits - 1 - exponent;
    if decimals >= 0 {
        format!("{:.*}", decimals as usize, value)
    } else {
        // More integer digits than significant digits: round away the excess.
        let factor = 10f64.powi(-decimals);
        format!("{:.0}", (value / factor).round() * factor)
    }
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_basic() {
        assert_eq!(snap(3.1, 1.0), 3.0);
        assert_eq!(snap(-3.6, 1.0), -4.0);
        assert_eq!(snap(10.0, 4.0), 8.0); // 2.5 ties to even
        assert_eq!(snap(14.0, 4.0), 16.0); // 3.5 ties to even
        assert_eq!(snap(0.123, 0.0), 0.123);
    }

    #[test]
    fn test_snap_is_idempotent() {
        let grids = [0.1, 0.25, 1.0, 3.0, 4.0, 16.0, 0.015625];
        for &grid in &grids {
            for i in -200..200 {
                let x = i as f64 * 0.173 + 0.011;
                let once = snap(x, grid);
                assert_eq!(snap(once, grid), once, "x = {}, grid = {}", x, grid);
            }
        }
    }

    #[test]
    fn test_snap_point() {
        let p = snap_point(&Point3::new(1.2, -5.9, 7.5), 2.0);
        assert_eq!(p, Point3::new(2.0, -6.0, 8.0));
    }

    #[test]
    fn test_significant_digits() {
        let p = Precision::Significant(5);
        assert_eq!(p.format(0.0), "0");
        assert_eq!(p.format(-0.0), "0");
        assert_eq!(p.format(64.0), "64");
        assert_eq!(p.format(0.015625), "0.015625");
        assert_eq!(p.format(1.0 / 3.0), "0.33333");
        assert_eq!(p.format(-2.5), "-2.5");
        assert_eq!(p.format(1234567.0), "1234600");
        assert_eq!(p.format(6.123e-17), "0");
        assert_eq!(p.format(-6.123e-17), "0");
    }

    #[test]
    fn test_zero_significant_digits_keeps_one() {
        assert_eq!(Precision::Significant(0).format(3.7), "4");
    }

    #[test]
    fn test_decimal_places() {
        let p = Precision::Decimals(3);
        assert_eq!(p.format(1.23456), "1.235");
        assert_eq!(p.format(2.0), "2");
        assert_eq!(p.format(-0.0001), "0");
        assert_eq!(Precision::Decimals(0).format(12.6), "13");
    }

    #[test]
    fn test_format_all() {
        let p = Precision::default();
        assert_eq!(p.format_all(&[1.0, -0.0, 0.5]), "1 0 0.5");
        assert_eq!(p.format_point(&Point3::new(0.0, 16.0, -8.0)), "0 16 -8");
    }
}
