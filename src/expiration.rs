//! Conversions between the market-data date form (`YYYY-MM-DD`) and the
//! compact form embedded in option symbols (`YYMMDD`). Century is always 20.

use chrono::{Datelike, NaiveDate};

use crate::error::{Result, ScanError};

const EXPANDED: &str = "YYYY-MM-DD";
const COMPACT: &str = "YYMMDD";

/// Parses `YYYY-MM-DD` into a date in 2000..=2099
pub fn parse_expanded(input: &str) -> Result<NaiveDate> {
    let malformed = || ScanError::DateFormat {
        input: input.to_string(),
        expected: EXPANDED,
    };

    let bytes = input.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(malformed());
    }
    if !input[..4].starts_with("20") {
        return Err(malformed());
    }

    let year = digits(&input[0..4]).ok_or_else(malformed)?;
    let month = digits(&input[5..7]).ok_or_else(malformed)?;
    let day = digits(&input[8..10]).ok_or_else(malformed)?;

    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(malformed)
}

/// Parses `YYMMDD` into a date, fixing the century to 20
pub fn parse_compact(input: &str) -> Result<NaiveDate> {
    let malformed = || ScanError::DateFormat {
        input: input.to_string(),
        expected: COMPACT,
    };

    if input.len() != 6 || !input.is_ascii() {
        return Err(malformed());
    }

    let year = digits(&input[0..2]).ok_or_else(malformed)?;
    let month = digits(&input[2..4]).ok_or_else(malformed)?;
    let day = digits(&input[4..6]).ok_or_else(malformed)?;

    NaiveDate::from_ymd_opt(2000 + year as i32, month, day).ok_or_else(malformed)
}

/// Renders a date in the compact symbol form
pub fn format_compact(date: NaiveDate) -> Result<String> {
    check_century(date)?;
    Ok(date.format("%y%m%d").to_string())
}

pub fn format_expanded(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD` -> `YYMMDD`
pub fn to_compact(input: &str) -> Result<String> {
    format_compact(parse_expanded(input)?)
}

/// `YYMMDD` -> `YYYY-MM-DD`
pub fn to_expanded(input: &str) -> Result<String> {
    Ok(format_expanded(parse_compact(input)?))
}

/// Calendar days from `today` to `expiration`, counting the expiration day itself.
pub fn days_to_expiration(expiration: NaiveDate, today: NaiveDate) -> i64 {
    (expiration - today).num_days() + 1
}

fn check_century(date: NaiveDate) -> Result<()> {
    if (2000..=2099).contains(&date.year()) {
        Ok(())
    } else {
        Err(ScanError::DateFormat {
            input: format_expanded(date),
            expected: "a year between 2000 and 2099",
        })
    }
}

fn digits(s: &str) -> Option<u32> {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}
