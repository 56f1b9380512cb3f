//! Parsing durations with units of measurement, like `1h30m` or `1.5s`.

use std::time::Duration;

/// Error parsing a [`Duration`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDuration {
    /// Input doesn't follow the duration grammar.
    #[error("invalid duration {0:?}")]
    Syntax(String),
    /// A number in the input is not followed by a unit.
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),
    /// Unit is not recognized.
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit {
        /// Unrecognized unit.
        unit: String,
        /// Full input.
        input: String,
    },
    /// Duration is negative.
    #[error("negative duration {0:?} is not supported")]
    Negative(String),
    /// Duration doesn't fit into [`Duration`].
    #[error("duration {0:?} is out of range")]
    Overflow(String),
}

const NANOS_IN_SECOND: u128 = 1_000_000_000;

fn unit_in_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_IN_SECOND,
        "m" => 60 * NANOS_IN_SECOND,
        "h" => 3_600 * NANOS_IN_SECOND,
        _ => return None,
    })
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Parses a duration as a sequence of decimal numbers with units, e.g. `300ms`, `1.5h` or `2h45m`.
/// Supported units are `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A single `0` is accepted without a unit.
pub(crate) fn parse_duration(input: &str) -> Result<Duration, InvalidDuration> {
    let syntax_err = || InvalidDuration::Syntax(input.to_owned());
    let overflow_err = || InvalidDuration::Overflow(input.to_owned());

    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if let Some(abs) = rest.strip_prefix('-') {
        return if abs.trim_start_matches('0').is_empty() && !abs.is_empty() {
            Ok(Duration::ZERO)
        } else {
            Err(InvalidDuration::Negative(input.to_owned()))
        };
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(syntax_err());
    }

    let mut total_nanos = 0_u128;
    while !rest.is_empty() {
        let (int_part, tail) = split_digits(rest);
        let (frac_part, tail) = match tail.strip_prefix('.') {
            Some(tail) => split_digits(tail),
            None => ("", tail),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(syntax_err());
        }

        let unit_end = tail
            .find(|ch: char| ch == '.' || ch.is_ascii_digit())
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        if unit.is_empty() {
            return Err(InvalidDuration::MissingUnit(input.to_owned()));
        }
        let unit_nanos = unit_in_nanos(unit).ok_or_else(|| InvalidDuration::UnknownUnit {
            unit: unit.to_owned(),
            input: input.to_owned(),
        })?;

        let int_value: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow_err())?
        };
        let mut nanos = int_value.checked_mul(unit_nanos).ok_or_else(overflow_err)?;

        // Digits beyond the nanosecond precision of the largest unit don't affect the result.
        let (mut fraction, mut scale) = (0_u128, 1_u128);
        for digit in frac_part.bytes().take(20) {
            fraction = fraction * 10 + u128::from(digit - b'0');
            scale *= 10;
        }
        nanos += fraction * unit_nanos / scale;

        total_nanos = total_nanos.checked_add(nanos).ok_or_else(overflow_err)?;
        rest = tail;
    }

    let secs = u64::try_from(total_nanos / NANOS_IN_SECOND).map_err(|_| overflow_err())?;
    let subsec_nanos = u32::try_from(total_nanos % NANOS_IN_SECOND).map_err(|_| overflow_err())?;
    Ok(Duration::new(secs, subsec_nanos))
}
