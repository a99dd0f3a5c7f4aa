//! Schedule engine.
//!
//! A schedule is declared as a `(schedule_type, payload)` pair. The type
//! selects a variant from [`SCHEDULE_TYPES`]; the variant validates its payload
//! once at parse time and afterwards only answers "when next?".

mod crontab;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{Error, Result};

pub use crontab::CronSchedule;

/// Parses a raw payload into a [`Schedule`].
pub type ParseFn = fn(&Value) -> Result<Schedule>;

/// Known schedule variants, keyed by discriminator.
pub const SCHEDULE_TYPES: &[(&str, ParseFn)] = &[(CronSchedule::TYPE, parse_cron)];

fn parse_cron(raw: &Value) -> Result<Schedule> {
    CronSchedule::from_raw(raw).map(Schedule::Cron)
}

/// Defines when a dog barks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Standard 5-field cron expression, evaluated in UTC.
    Cron(CronSchedule),
}

impl Schedule {
    /// Parses `raw` as the variant named by `schedule_type`.
    pub fn parse(schedule_type: &str, raw: &Value) -> Result<Self> {
        let (_, parse) = SCHEDULE_TYPES
            .iter()
            .find(|(name, _)| *name == schedule_type)
            .ok_or_else(|| Error::UnsupportedScheduleType(schedule_type.to_string()))?;
        parse(raw)
    }

    /// Discriminator of this variant.
    pub fn schedule_type(&self) -> &'static str {
        match self {
            Self::Cron(_) => CronSchedule::TYPE,
        }
    }

    /// Earliest occurrence strictly after `from`, if the schedule fires again.
    pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Cron(cron) => cron.next_after(from),
        }
    }

    /// Serialized payload, identical to what was parsed.
    pub fn to_raw(&self) -> Value {
        match self {
            Self::Cron(cron) => cron.to_raw(),
        }
    }
}
