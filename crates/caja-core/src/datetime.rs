//! Local-calendar helpers
//!
//! Planned dates are stored in UTC; "today" is the user's calendar day in
//! the configured timezone.

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{Error, Result};

/// Environment variable naming the IANA timezone
pub const TIMEZONE_ENV: &str = "CAJA_TIMEZONE";

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Argentina::Buenos_Aires;

/// Parse an IANA timezone name ("America/Argentina/Buenos_Aires")
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| Error::InvalidData(format!("Unknown timezone '{}': {}", name, e)))
}

/// Timezone from `CAJA_TIMEZONE`, falling back to Buenos Aires
pub fn timezone_from_env() -> Tz {
    match std::env::var(TIMEZONE_ENV) {
        Ok(name) => parse_timezone(&name).unwrap_or_else(|e| {
            warn!("{}; using {}", e, DEFAULT_TIMEZONE);
            DEFAULT_TIMEZONE
        }),
        Err(_) => DEFAULT_TIMEZONE,
    }
}

/// Last instant of the local day `days` days after `now`, in UTC
pub fn due_cutoff(now: DateTime<Utc>, tz: Tz, days: u32) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();
    let target = today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(today);
    let end_of_day = target.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default());

    // DST folds pick the later instant; gaps fall back to treating the time as UTC
    tz.from_local_datetime(&end_of_day)
        .latest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| end_of_day.and_utc())
}
