use chrono::NaiveDate;

use crate::contracts::models::UnitUpStatus;
use crate::errors::AppError;

/// Characters dropped from an amount before parsing.
const AMOUNT_NOISE: &[char] = &['¥', '￥', '$', '€', '£', '円', ',', '，'];

/// Parses a strict `YYYY-MM-DD` calendar date. `field` names the argument in
/// the error message.
pub fn parse_ymd(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{field} is required")));
    }

    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });
    if !shaped {
        return Err(AppError::InvalidInput(format!(
            "{field} must be YYYY-MM-DD, got '{raw}'"
        )));
    }

    let (y, m, d) = (&value[0..4], &value[5..7], &value[8..10]);
    let date = match (y.parse::<i32>(), m.parse::<u32>(), d.parse::<u32>()) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
        _ => None,
    };
    date.ok_or_else(|| AppError::InvalidInput(format!("{field} is not a calendar date: '{raw}'")))
}

/// Parses a price such as `¥120,000` or `120000円`. The result is finite and
/// strictly positive.
pub fn parse_amount(raw: &str) -> Result<f64, AppError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !AMOUNT_NOISE.contains(c))
        .collect();

    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err(AppError::InvalidInput(format!(
            "amount must be a number greater than 0, got '{raw}'"
        ))),
    }
}

/// Row positions address data rows only: the header row is 1.
pub fn row_position(raw: i64) -> Result<u32, AppError> {
    if raw < 2 {
        return Err(AppError::InvalidInput(format!(
            "row position must be 2 or greater, got {raw}"
        )));
    }
    u32::try_from(raw)
        .map_err(|_| AppError::InvalidInput(format!("row position {raw} is out of range")))
}

pub fn unit_up_status(raw: &str) -> Result<UnitUpStatus, AppError> {
    UnitUpStatus::parse(raw).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "unit-up value must be one of 未, 〇, ×; got '{raw}'"
        ))
    })
}
