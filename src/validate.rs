use chrono::{Datelike, NaiveDate};

use crate::{
    error::ScoreError,
    types::{ScoreParams, ScoreRequest},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Checks the five parameters in order: presence, quantity, schedule_date.
/// The first failing rule wins.
pub fn validate(params: ScoreParams) -> Result<ScoreRequest, ScoreError> {
    let ScoreParams {
        supplier,
        quantity,
        warehouse,
        item_name,
        schedule_date,
    } = params;

    let mut missing = Vec::new();
    let mut take = |name: &'static str, value: Option<String>| match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push(name);
            String::new()
        }
    };
    let supplier = take("supplier", supplier);
    let quantity = take("quantity", quantity);
    let warehouse = take("warehouse", warehouse);
    let item_name = take("item_name", item_name);
    let schedule_date = take("schedule_date", schedule_date);
    if !missing.is_empty() {
        return Err(ScoreError::MissingParameters(missing));
    }

    let quantity = parse_quantity(&quantity)?;
    let schedule_month = parse_schedule_month(&schedule_date)?;

    Ok(ScoreRequest {
        supplier,
        quantity,
        warehouse,
        item_name,
        schedule_date,
        schedule_month,
    })
}

fn parse_quantity(raw: &str) -> Result<i64, ScoreError> {
    raw.trim().parse::<i64>().map_err(|_| ScoreError::InvalidQuantity)
}

fn parse_schedule_month(raw: &str) -> Result<u32, ScoreError> {
    if !is_date_shaped(raw) {
        return Err(ScoreError::InvalidScheduleDate);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(|d| d.month())
        .map_err(|_| ScoreError::InvalidScheduleDate)
}

// chrono skips whitespace and accepts a sign before each field, so the
// layout is checked first: a 4-digit year, then 1-2 digit month and day.
fn is_date_shaped(raw: &str) -> bool {
    let parts: Vec<&str> = raw.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return false;
    };
    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    digits(*year, 4, 4) && digits(*month, 1, 2) && digits(*day, 1, 2)
}
