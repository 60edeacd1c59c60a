// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidMoney,
    NegativeMoney,
    InvalidDate,
    InvalidInt,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMoney => f.write_str("invalid money value"),
            Self::NegativeMoney => f.write_str("negative money value"),
            Self::InvalidDate => f.write_str("invalid date value"),
            Self::InvalidInt => f.write_str("invalid integer value"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

pub fn parse_required_cents(input: &str) -> ValidationResult<i64> {
    parse_cents(input.trim())
}

pub fn parse_optional_cents(input: &str) -> ValidationResult<Option<i64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_cents(trimmed).map(Some)
}

pub fn format_cents(cents: i64) -> String {
    let (sign, cents) = normalize_sign(cents);
    let dollars = cents / 100;
    let remainder = cents % 100;
    format!("{sign}${}.{:02}", comma_format(dollars), remainder)
}

pub fn format_compact_cents(cents: i64) -> String {
    let (sign, cents) = normalize_sign(cents);
    let dollars = (cents as f64) / 100.0;
    if dollars < 1000.0 {
        return format!("{sign}{}", format_cents(cents));
    }

    let (value, suffix) = if dollars < 1_000_000.0 {
        (dollars / 1000.0, "k")
    } else if dollars < 1_000_000_000.0 {
        (dollars / 1_000_000.0, "M")
    } else {
        (dollars / 1_000_000_000.0, "B")
    };

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract().abs() < f64::EPSILON {
        format!("{sign}${:.0}{suffix}", rounded)
    } else {
        format!("{sign}${rounded:.1}{suffix}")
    }
}

/// Plain decimal rendering for the CSV Value column: whole units when
/// the cent remainder is zero, two decimals otherwise.
pub fn format_plain_cents(cents: i64) -> String {
    let (sign, cents) = normalize_sign(cents);
    let dollars = cents / 100;
    let remainder = cents % 100;
    if remainder == 0 {
        format!("{sign}{dollars}")
    } else {
        format!("{sign}{dollars}.{remainder:02}")
    }
}

pub fn parse_required_date(input: &str) -> ValidationResult<Date> {
    parse_date(input.trim())
}

pub fn parse_optional_date(input: &str) -> ValidationResult<Option<Date>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date(trimmed).map(Some)
}

pub fn format_date(value: Option<Date>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .expect("date format is valid")
}

pub fn parse_optional_int(input: &str) -> ValidationResult<i32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i32>()
        .map_err(|_| ValidationError::InvalidInt)
}

fn parse_date(input: &str) -> ValidationResult<Date> {
    Date::parse(input, &format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidDate)
}

fn parse_cents(input: &str) -> ValidationResult<i64> {
    let clean = input.replace(',', "");
    if clean.starts_with('-') {
        return Err(ValidationError::NegativeMoney);
    }

    let clean = clean.strip_prefix('$').unwrap_or(&clean);
    if clean.is_empty() {
        return Err(ValidationError::InvalidMoney);
    }

    let parts = clean.split('.').collect::<Vec<_>>();
    if parts.len() > 2 {
        return Err(ValidationError::InvalidMoney);
    }

    let whole = parse_digits(parts[0])?;
    if whole > i64::MAX / 100 {
        return Err(ValidationError::InvalidMoney);
    }

    let mut frac = 0i64;
    if parts.len() == 2 {
        if parts[1].len() > 2 {
            return Err(ValidationError::InvalidMoney);
        }
        frac = parse_digits(parts[1])?;
        if parts[1].len() == 1 {
            frac *= 10;
        }
    }

    Ok(whole * 100 + frac)
}

fn parse_digits(input: &str) -> ValidationResult<i64> {
    if input.is_empty() {
        return Ok(0);
    }
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidMoney);
    }
    input
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidMoney)
}

fn normalize_sign(cents: i64) -> (&'static str, i64) {
    if cents < 0 {
        ("-", -cents)
    } else {
        ("", cents)
    }
}

fn comma_format(value: i64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        ValidationError, format_cents, format_compact_cents, format_plain_cents,
        parse_optional_date, parse_required_cents,
    };

    #[test]
    fn parse_cents_accepts_common_forms() {
        assert_eq!(parse_required_cents("1000"), Ok(100_000));
        assert_eq!(parse_required_cents("$1,234.50"), Ok(123_450));
        assert_eq!(parse_required_cents("1234.5"), Ok(123_450));
        assert_eq!(parse_required_cents(" 12 "), Ok(1_200));
    }

    #[test]
    fn parse_cents_rejects_garbage_and_negatives() {
        assert_eq!(
            parse_required_cents("-5"),
            Err(ValidationError::NegativeMoney)
        );
        assert_eq!(
            parse_required_cents("1.234"),
            Err(ValidationError::InvalidMoney)
        );
        assert_eq!(
            parse_required_cents("abc"),
            Err(ValidationError::InvalidMoney)
        );
    }

    #[test]
    fn money_formats() {
        assert_eq!(format_cents(123_450), "$1,234.50");
        assert_eq!(format_compact_cents(123_450_000), "$1.2M");
        assert_eq!(format_plain_cents(100_000), "1000");
        assert_eq!(format_plain_cents(123_450), "1234.50");
    }

    #[test]
    fn optional_date_parses_or_stays_empty() {
        assert_eq!(parse_optional_date(""), Ok(None));
        let parsed = parse_optional_date("2026-04-09").expect("date parses");
        assert_eq!(parsed.map(|d| d.to_string()), Some("2026-04-09".to_owned()));
        assert_eq!(
            parse_optional_date("04/09/2026"),
            Err(ValidationError::InvalidDate)
        );
    }
}
