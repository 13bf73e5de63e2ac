//! Conversion between decimal degrees and the degrees/minutes/seconds
//! rational representation required by the EXIF GPS tag format.

use serde::{Deserialize, Serialize};

/// Largest denominator allowed when approximating the seconds component.
/// Bounds the rounding error to well under a millimetre of Earth surface.
pub const MAX_DENOMINATOR: u32 = 10_000;

/// An unsigned EXIF-style rational number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }

    /// Best rational approximation of a non-negative value with the
    /// denominator bounded by `max_denominator`.
    ///
    /// The value is first snapped to a nanodegree grid, then reduced with
    /// the continued-fraction algorithm, considering the final
    /// semiconvergent as well as the last convergent so the closest of the
    /// two bounds is returned.
    pub fn approximate(value: f64, max_denominator: u32) -> Self {
        const SCALE: u64 = 1_000_000_000;

        if !value.is_finite() || value <= 0.0 {
            return Self::new(0, 1);
        }

        let numerator = (value * SCALE as f64).round() as u64;
        if numerator == 0 {
            return Self::new(0, 1);
        }

        let (n, d) = limit_denominator(numerator, SCALE, u64::from(max_denominator));
        Self::new(n as u32, d as u32)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Reduce n/d to the closest fraction whose denominator does not exceed
/// `max_den`. Mirrors the classic `Fraction.limit_denominator` algorithm.
fn limit_denominator(mut n: u64, mut d: u64, max_den: u64) -> (u64, u64) {
    let g = gcd(n, d);
    n /= g;
    d /= g;
    if d <= max_den {
        return (n, d);
    }

    let target = n as f64 / d as f64;
    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let (mut num, mut den) = (n, d);
    loop {
        let a = num / den;
        let q2 = q0 + a * q1;
        if q2 > max_den {
            break;
        }
        let p2 = p0 + a * p1;
        p0 = p1;
        q0 = q1;
        p1 = p2;
        q1 = q2;
        let rem = num - a * den;
        num = den;
        den = rem;
        if den == 0 {
            break;
        }
    }

    // Semiconvergent bound using the largest admissible coefficient.
    let k = (max_den - q0) / q1;
    let (sp, sq) = (p0 + k * p1, q0 + k * q1);
    let semi_err = (target - sp as f64 / sq as f64).abs();
    let conv_err = (target - p1 as f64 / q1 as f64).abs();
    if semi_err < conv_err {
        (sp, sq)
    } else {
        (p1, q1)
    }
}

/// A coordinate axis decomposed into degrees, minutes and seconds rationals,
/// always unsigned; the hemisphere reference letter carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dms {
    pub degrees: Rational,
    pub minutes: Rational,
    pub seconds: Rational,
}

impl Dms {
    /// Recompose into unsigned decimal degrees.
    pub fn to_decimal(self) -> f64 {
        self.degrees.to_f64() + self.minutes.to_f64() / 60.0 + self.seconds.to_f64() / 3600.0
    }
}

/// Decompose decimal degrees into degrees, minutes and seconds via
/// successive fractional-part extraction. The sign is discarded; callers
/// record it as a hemisphere reference letter.
///
/// The round-trip error is verified against the source decimal and logged
/// when it exceeds 1e-10. That is a self-check, not a failure.
pub fn decimal_to_dms(decimal: f64) -> Dms {
    let value = decimal.abs();
    let degrees = value.trunc();
    let minutes_part = (value - degrees) * 60.0;
    let minutes = minutes_part.trunc();
    let seconds = (minutes_part - minutes) * 60.0;

    let dms = Dms {
        degrees: Rational::new(degrees as u32, 1),
        minutes: Rational::new(minutes as u32, 1),
        seconds: Rational::approximate(seconds, MAX_DENOMINATOR),
    };

    let error = (dms.to_decimal() - value).abs();
    if error > 1e-10 {
        tracing::warn!(decimal, error, "DMS round-trip drift exceeds tolerance");
    }

    dms
}

/// Convert degrees, minutes and seconds back into signed decimal degrees.
/// A hemisphere of `S` or `W` flips the sign.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: char) -> f64 {
    let sign = if matches!(hemisphere, 'S' | 's' | 'W' | 'w') {
        -1.0
    } else {
        1.0
    };
    sign * (degrees + minutes / 60.0 + seconds / 3600.0)
}
