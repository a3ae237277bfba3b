//! # Fixed-Point Ratios
//!
//! Fractions such as `min_signed_per_window` or slash fractions are part of
//! replicated state, so they are held as integer basis points and never as
//! floats. The textual form is a plain decimal string (`"0.05"`, `"-1"`).

use crate::errors::RatioParseError;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

/// Basis points per unit.
pub const BPS_SCALE: i64 = 10_000;

const MAX_FRACTION_DIGITS: usize = 4;

/// Signed fraction with basis-point precision.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Ratio(i64);

impl Ratio {
    pub const ZERO: Ratio = Ratio(0);
    pub const ONE: Ratio = Ratio(BPS_SCALE);

    pub const fn from_bps(bps: i64) -> Self {
        Self(bps)
    }

    pub const fn bps(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `1 - self`.
    pub fn complement(self) -> Self {
        Self(BPS_SCALE.saturating_sub(self.0))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let int = abs / BPS_SCALE as u64;
        let frac = abs % BPS_SCALE as u64;
        let digits = format!("{:04}", frac);
        let trimmed = digits.trim_end_matches('0');
        if trimmed.is_empty() {
            write!(f, "{}{}.0", sign, int)
        } else {
            write!(f, "{}{}.{}", sign, int, trimmed)
        }
    }
}

impl FromStr for Ratio {
    type Err = RatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(RatioParseError::Empty);
        }

        let (negative, body) = match input.as_bytes()[0] {
            b'-' => (true, &input[1..]),
            b'+' => (false, &input[1..]),
            _ => (false, input),
        };

        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };

        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(RatioParseError::Malformed(input.to_string()));
        }
        if frac_part.len() > MAX_FRACTION_DIGITS {
            return Err(RatioParseError::TooPrecise(input.to_string()));
        }

        let overflow = || RatioParseError::Overflow(input.to_string());
        let int: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let frac: i64 = format!("{:0<width$}", frac_part, width = MAX_FRACTION_DIGITS)
            .parse()
            .map_err(|_| RatioParseError::Malformed(input.to_string()))?;

        let magnitude = int
            .checked_mul(BPS_SCALE)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        Ok(Ratio(if negative { -magnitude } else { magnitude }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_strings() {
        assert_eq!("0.60".parse::<Ratio>().unwrap(), Ratio::from_bps(6000));
        assert_eq!("0.022".parse::<Ratio>().unwrap(), Ratio::from_bps(220));
        assert_eq!("0.0089".parse::<Ratio>().unwrap(), Ratio::from_bps(89));
        assert_eq!("1".parse::<Ratio>().unwrap(), Ratio::ONE);
        assert_eq!("-1".parse::<Ratio>().unwrap(), Ratio::from_bps(-10_000));
        assert_eq!(".5".parse::<Ratio>().unwrap(), Ratio::from_bps(5000));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<Ratio>(), Err(RatioParseError::Empty));
        assert!(matches!("abc".parse::<Ratio>(), Err(RatioParseError::Malformed(_))));
        assert!(matches!("1.2.3".parse::<Ratio>(), Err(RatioParseError::Malformed(_))));
        assert!(matches!(
            "0.00001".parse::<Ratio>(),
            Err(RatioParseError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Ratio::from_bps(500).to_string(), "0.05");
        assert_eq!(Ratio::ONE.to_string(), "1.0");
        assert_eq!(Ratio::from_bps(-10_000).to_string(), "-1.0");
        assert_eq!(Ratio::from_bps(89).to_string(), "0.0089");
    }

    #[test]
    fn test_complement() {
        assert_eq!(Ratio::from_bps(5000).complement(), Ratio::from_bps(5000));
        assert_eq!(Ratio::ZERO.complement(), Ratio::ONE);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Ratio::from_bps(220)).unwrap();
        assert_eq!(json, "\"0.022\"");
        let back: Ratio = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Ratio::from_bps(220));
    }
}
