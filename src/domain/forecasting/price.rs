//! Locale-formatted price parsing.
//!
//! Stored prices use `.` as the thousands separator and `,` as the decimal
//! separator (`"1.234,56"`). Values are converted to a [`Decimal`] rounded to
//! two places so that every observation feeds the model on the same scale.

use crate::domain::errors::ForecastError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

const CURRENCY_PREFIX: &str = "R$";

/// Parses a stored price string such as `"12.345,67"` into `12345.67`.
pub fn normalize_price(raw: &str) -> Result<Decimal, ForecastError> {
    let malformed = || ForecastError::MalformedPrice {
        raw: raw.to_string(),
    };

    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix(CURRENCY_PREFIX)
        .map(str::trim_start)
        .unwrap_or(trimmed);

    let (integer, fraction) = match body.split_once(',') {
        Some((int, frac)) => (int, Some(frac)),
        None => (body, None),
    };

    if !is_grouped_integer(integer) {
        return Err(malformed());
    }
    if let Some(frac) = fraction
        && !is_digits(frac)
    {
        return Err(malformed());
    }

    let mut canonical = integer.replace('.', "");
    if let Some(frac) = fraction {
        canonical.push('.');
        canonical.push_str(frac);
    }

    let value = Decimal::from_str(&canonical).map_err(|_| malformed())?;
    Ok(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `1234` or `1.234.567`: either plain digits, or a 1-3 digit lead group
/// followed by 3-digit groups.
fn is_grouped_integer(s: &str) -> bool {
    if !s.contains('.') {
        return is_digits(s);
    }

    let mut groups = s.split('.');
    let lead_ok = groups
        .next()
        .is_some_and(|lead| is_digits(lead) && lead.len() <= 3);

    lead_ok && groups.all(|g| g.len() == 3 && is_digits(g))
}
