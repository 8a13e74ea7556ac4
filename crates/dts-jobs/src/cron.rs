//! Strict 5-field cron validation, wrapping the `cron` crate's 6-field
//! (with-seconds) grammar.
//!
//! Sub-minute precision is out of scope (spec §1 Non-goals), so a
//! seconds field of `0` is prepended before delegating to
//! `cron::Schedule`, and any expression that doesn't carry exactly five
//! space-separated fields is rejected outright rather than silently
//! accepted with a wildcard seconds field.

use chrono::{DateTime, Timelike, Utc};
use dts_core::error::{Error, Result};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct CronExpression {
    raw: String,
    schedule: cron::Schedule,
}

impl CronExpression {
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(Error::invalid_argument(format!(
                "cron expression must have exactly 5 fields (minute hour dom month dow), got {}: {expression}",
                fields.len()
            )));
        }

        let with_seconds = format!("0 {expression}");
        let schedule = cron::Schedule::from_str(&with_seconds)
            .map_err(|e| Error::invalid_argument(format!("invalid cron expression {expression}: {e}")))?;

        Ok(Self {
            raw: expression.to_string(),
            schedule,
        })
    }

    /// The earliest minute strictly after `from`, truncated to
    /// zero-seconds (spec §3.1: `next_run` invariant).
    pub fn next_run_after(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.schedule
            .after(&from)
            .next()
            .map(truncate_to_minute)
            .ok_or_else(|| Error::invalid_argument(format!("cron expression {} has no future occurrence", self.raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Human-readable summary for logs (supplemented feature, SPEC_FULL §12).
    pub fn describe(&self) -> String {
        format!("fires per schedule `{}`", self.raw)
    }
}

fn truncate_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t - chrono::Duration::seconds(t.second() as i64) - chrono::Duration::nanoseconds(t.timestamp_subsec_nanos() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rejects_expressions_outside_five_field_grammar() {
        assert!(CronExpression::parse("* * * * * *").is_err());
        assert!(CronExpression::parse("* * *").is_err());
        assert!(CronExpression::parse("*/5 * * * *").is_ok());
    }

    #[test]
    fn next_run_is_truncated_to_minute_zero_seconds() {
        let expr = CronExpression::parse("*/5 * * * *").unwrap();
        let from = Utc.with_ymd_and_hms(2026, 7, 27, 12, 3, 17).unwrap();
        let next = expr.next_run_after(from).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 7, 27, 12, 5, 0).unwrap());
    }

    #[test]
    fn rejects_malformed_fields() {
        assert!(CronExpression::parse("99 * * * *").is_err());
    }
}
