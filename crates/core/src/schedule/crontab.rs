//! Cron variant of [`Schedule`](super::Schedule).
//!
//! Accepts standard 5-field expressions (`minute hour day-of-month month
//! day-of-week`), the usual `@daily`-style descriptors and `@every <duration>`.
//! Evaluation is done by the `cron` crate, which wants a seconds field and
//! numbers weekdays 1-7 from Sunday, so the expression is translated once at
//! parse time. The text the caller supplied is kept verbatim.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use serde_json::Value;

use crate::error::{Error, Result};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A cron-based schedule.
#[derive(Clone)]
pub struct CronSchedule {
    spec: String,
    form: Form,
}

#[derive(Clone)]
enum Form {
    // One entry, or two when both day fields are restricted (either may match).
    Calendar(Vec<::cron::Schedule>),
    /// `@every`: fires a fixed delay after the reference second.
    Every(TimeDelta),
}

impl CronSchedule {
    /// Discriminator for this variant.
    pub const TYPE: &'static str = "cron";

    /// Parses the JSON payload, which must be a string.
    pub fn from_raw(raw: &Value) -> Result<Self> {
        let spec = raw.as_str().ok_or_else(|| {
            Error::InvalidScheduleSpec("cron schedule must be a JSON string".to_string())
        })?;
        spec.parse()
    }

    /// The expression exactly as supplied.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// JSON payload for this schedule.
    pub fn to_raw(&self) -> Value {
        Value::String(self.spec.clone())
    }

    /// Earliest matching instant strictly after `from`.
    ///
    /// Instants within a year of the end of `DateTime<Utc>` have no next
    /// occurrence.
    pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if from.checked_add_signed(TimeDelta::days(366)).is_none() {
            return None;
        }
        let base = from.with_nanosecond(0).unwrap_or(from);
        match &self.form {
            Form::Calendar(compiled) => compiled
                .iter()
                .filter_map(|schedule| schedule.after(&base).next())
                .filter(|next| *next > from)
                .min(),
            Form::Every(delay) => base.checked_add_signed(*delay),
        }
    }
}

impl FromStr for CronSchedule {
    type Err = Error;

    fn from_str(spec: &str) -> Result<Self> {
        let form = compile(spec)
            .map_err(|reason| Error::InvalidScheduleSpec(format!("{spec:?}: {reason}")))?;
        Ok(Self {
            spec: spec.to_string(),
            form,
        })
    }
}

impl PartialEq for CronSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
    }
}

impl Eq for CronSchedule {}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.spec).finish()
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

fn compile(spec: &str) -> std::result::Result<Form, String> {
    let trimmed = spec.trim();
    if let Some(every) = strip_prefix_ignore_case(trimmed, "@every ") {
        return every_delay(every.trim()).map(Form::Every);
    }
    let expanded = if trimmed.starts_with('@') {
        expand_descriptor(trimmed).ok_or_else(|| format!("unknown descriptor {trimmed}"))?
    } else {
        trimmed
    };

    let fields: Vec<&str> = expanded.split_whitespace().collect();
    let [minute, hour, day_of_month, month, day_of_week] = fields.as_slice() else {
        return Err(format!("expected 5 fields, found {}", fields.len()));
    };

    let weekdays = weekday_list(day_of_week)?;
    let days_of_month = if *day_of_month == "?" { "*" } else { *day_of_month };

    // Checked one at a time so errors name the caller's field, not the
    // translated expression.
    check_field("minute", minute, &format!("0 {minute} * * * *"))?;
    check_field("hour", hour, &format!("0 0 {hour} * * *"))?;
    check_field("day-of-month", day_of_month, &format!("0 0 0 {days_of_month} * *"))?;
    check_field("month", month, &format!("0 0 0 * {month} *"))?;

    let build = |dom: &str, dow: &str| {
        ::cron::Schedule::from_str(&format!("0 {minute} {hour} {dom} {month} {dow}"))
            .map_err(|_| format!("invalid expression {expanded:?}"))
    };

    if is_unrestricted(day_of_month) || is_unrestricted(day_of_week) {
        Ok(Form::Calendar(vec![build(days_of_month, &weekdays)?]))
    } else {
        Ok(Form::Calendar(vec![build(days_of_month, "*")?, build("*", &weekdays)?]))
    }
}

fn check_field(name: &str, value: &str, expression: &str) -> std::result::Result<(), String> {
    ::cron::Schedule::from_str(expression)
        .map(|_| ())
        .map_err(|_| format!("invalid {name} field {value:?}"))
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Delay of an `@every` descriptor, truncated to whole seconds; at least 1s.
fn every_delay(text: &str) -> std::result::Result<TimeDelta, String> {
    let nanos = parse_duration(text).ok_or_else(|| format!("invalid duration {text:?}"))?;
    let secs = nanos / 1_000_000_000;
    if secs < 1 {
        return Err(format!("@every needs at least 1s, got {text:?}"));
    }
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| format!("duration {text:?} out of range"))
}

/// Parses durations such as `90s`, `1h30m` or `1.5h` into nanoseconds.
fn parse_duration(text: &str) -> Option<u128> {
    const UNITS: [(&str, u128); 8] = [
        ("ns", 1),
        ("us", 1_000),
        ("\u{b5}s", 1_000),
        ("\u{3bc}s", 1_000),
        ("ms", 1_000_000),
        ("s", 1_000_000_000),
        ("m", 60_000_000_000),
        ("h", 3_600_000_000_000),
    ];

    if text.is_empty() {
        return None;
    }
    let mut rest = text;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }

        // Longest unit first so `ms` is not read as `m`.
        let (unit, scale) = UNITS
            .iter()
            .filter(|(unit, _)| tail.starts_with(unit))
            .max_by_key(|(unit, _)| unit.len())?;

        let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let mut value = whole.checked_mul(*scale)?;
        let mut place = *scale;
        for digit in fraction.chars() {
            place /= 10;
            value = value.checked_add(u128::from(digit.to_digit(10)?) * place)?;
        }
        total = total.checked_add(value)?;
        rest = &tail[unit.len()..];
    }
    Some(total)
}

fn expand_descriptor(descriptor: &str) -> Option<&'static str> {
    let expanded = match descriptor.to_ascii_lowercase().as_str() {
        "@yearly" | "@annually" => "0 0 1 1 *",
        "@monthly" => "0 0 1 * *",
        "@weekly" => "0 0 * * 0",
        "@daily" | "@midnight" => "0 0 * * *",
        "@hourly" => "0 * * * *",
        _ => return None,
    };
    Some(expanded)
}

/// A day field starting with `*` or `?` does not restrict which days match.
fn is_unrestricted(field: &str) -> bool {
    field.starts_with('*') || field.starts_with('?')
}

/// Rewrites a standard day-of-week field as a list of weekday names.
fn weekday_list(field: &str) -> std::result::Result<String, String> {
    if field == "*" || field == "?" {
        return Ok("*".to_string());
    }

    let mut days = [false; 7];
    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: usize = step
                    .parse()
                    .map_err(|_| format!("invalid step in day-of-week {part}"))?;
                if step == 0 {
                    return Err(format!("zero step in day-of-week {part}"));
                }
                (range, step)
            }
            None => (part, 1),
        };

        let (start, end) = match range {
            "*" | "?" => (0, 6),
            _ => match range.split_once('-') {
                Some((start, end)) => (weekday(start)?, weekday(end)?),
                // `N/step` runs from N to the end of the week.
                None if step > 1 => (weekday(range)?, 6),
                None => {
                    let day = weekday(range)?;
                    (day, day)
                }
            },
        };
        if start > end {
            return Err(format!("day-of-week range {range} runs backwards"));
        }
        for day in (start..=end).step_by(step) {
            days[day % 7] = true;
        }
    }

    Ok(WEEKDAYS
        .iter()
        .zip(days)
        .filter(|(_, on)| *on)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(","))
}

/// 0-7 (both 0 and 7 are Sunday) or a three-letter name.
fn weekday(token: &str) -> std::result::Result<usize, String> {
    if let Ok(day) = token.parse::<usize>() {
        return if day <= 7 {
            Ok(day)
        } else {
            Err(format!("day-of-week {day} out of range 0-7"))
        };
    }
    WEEKDAYS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(token))
        .ok_or_else(|| format!("unknown day-of-week {token:?}"))
}
