//! Activity aggregation.
//!
//! Every function here is a pure pass over its input: nothing is cached and
//! nothing is shared between calls. Malformed records are skipped, never
//! reported as errors.
//!
//! Day normalization always uses the UTC calendar day:
//! - ISO 8601 timestamps with an offset (`Z`, `+00:00` or `+0000`) are
//!   converted to UTC, then truncated. Seconds and fractions are optional.
//! - Timestamps without an offset and plain `YYYY-MM-DD` dates are read as UTC.
//! - Integers are epoch milliseconds.

use crate::models::{
    ActivityRecord, DateAxis, DateValue, DayTotal, DenseSeries, SiteDayTotals, SiteDays,
    SiteTotal, SiteTotals,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

pub const DEFAULT_MIN_TRAILING_DAYS: usize = 4;

const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Normalizes a raw `date` value to its UTC calendar day.
pub fn normalize_day(value: &DateValue) -> Option<NaiveDate> {
    match value {
        DateValue::Text(text) => parse_day(text.trim()),
        DateValue::EpochMillis(millis) => {
            DateTime::from_timestamp_millis(*millis).map(|ts| ts.date_naive())
        }
        DateValue::Other(_) => None,
    }
}

fn parse_day(text: &str) -> Option<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(text, format) {
            return Some(ts.with_timezone(&Utc).date_naive());
        }
    }
    // A trailing `Z` is UTC, which is also how offset-less values are read.
    let naive = text.strip_suffix(['Z', 'z']).unwrap_or(text);
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(ts.date());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn record_day(record: &ActivityRecord) -> Option<NaiveDate> {
    record.date.as_ref().and_then(normalize_day)
}

/// Records whose normalized day is `day`.
pub fn records_on_day(records: &[ActivityRecord], day: NaiveDate) -> Vec<ActivityRecord> {
    records
        .iter()
        .filter(|record| record_day(record) == Some(day))
        .cloned()
        .collect()
}

/// Sums time and counts records per site, regardless of date.
pub fn aggregate_by_site(records: &[ActivityRecord]) -> SiteTotals {
    let mut totals = SiteTotals::default();

    for record in records {
        let Some(site) = record.site() else {
            continue;
        };
        let idx = match totals.index.get(site) {
            Some(&idx) => idx,
            None => {
                totals.sites.push(SiteTotal {
                    site: site.to_string(),
                    total_seconds: 0.0,
                    record_count: 0,
                });
                totals.index.insert(site.to_string(), totals.sites.len() - 1);
                totals.sites.len() - 1
            }
        };
        let entry = &mut totals.sites[idx];
        entry.total_seconds += record.seconds();
        entry.record_count += 1;
    }

    totals
}

/// Sums time per `(site, day)`. Records without a site or with an
/// unparseable date are counted in `skipped` and otherwise ignored.
pub fn aggregate_by_site_and_day(records: &[ActivityRecord]) -> SiteDayTotals {
    let mut totals = SiteDayTotals::default();
    let mut site_index: HashMap<&str, usize> = HashMap::new();
    let mut day_index: HashMap<(usize, NaiveDate), usize> = HashMap::new();

    for record in records {
        let (Some(site), Some(day)) = (record.site(), record_day(record)) else {
            debug!(
                id = record.id.as_deref().unwrap_or("-"),
                site = record.site.as_deref().unwrap_or("-"),
                date = ?record.date,
                "skipping malformed activity record"
            );
            totals.skipped += 1;
            continue;
        };

        let site_idx = *site_index.entry(site).or_insert_with(|| {
            totals.sites.push(SiteDays {
                site: site.to_string(),
                days: Vec::new(),
            });
            totals.sites.len() - 1
        });

        let days = &mut totals.sites[site_idx].days;
        match day_index.get(&(site_idx, day)) {
            Some(&day_idx) => days[day_idx].total_seconds += record.seconds(),
            None => {
                day_index.insert((site_idx, day), days.len());
                days.push(DayTotal {
                    day,
                    total_seconds: record.seconds(),
                });
            }
        }
    }

    totals
}

/// Days present in any site's entries, ascending, without padding.
pub fn observed_days(totals: &SiteDayTotals) -> DateAxis {
    let days: BTreeSet<NaiveDate> = totals
        .sites
        .iter()
        .flat_map(|site| site.days.iter().map(|entry| entry.day))
        .collect();
    DateAxis(days.into_iter().collect())
}

pub fn build_date_axis(totals: &SiteDayTotals, min_trailing_days: usize) -> DateAxis {
    build_date_axis_at(totals, min_trailing_days, Utc::now().date_naive())
}

/// Observed days plus `min_trailing_days` consecutive days ending at the
/// latest observed day, or at `today` when nothing was observed.
pub fn build_date_axis_at(
    totals: &SiteDayTotals,
    min_trailing_days: usize,
    today: NaiveDate,
) -> DateAxis {
    let mut days: BTreeSet<NaiveDate> = observed_days(totals).0.into_iter().collect();
    let latest = days.last().copied().unwrap_or(today);

    for offset in 0..min_trailing_days {
        match latest.checked_sub_signed(Duration::days(offset as i64)) {
            Some(day) => {
                days.insert(day);
            }
            None => break,
        }
    }

    DateAxis(days.into_iter().collect())
}

/// One zero-filled series per site, aligned to `axis`.
pub fn project_to_matrix(totals: &SiteDayTotals, axis: &DateAxis) -> Vec<DenseSeries> {
    totals
        .sites
        .iter()
        .map(|site| {
            let by_day: HashMap<NaiveDate, f64> = site
                .days
                .iter()
                .map(|entry| (entry.day, entry.total_seconds))
                .collect();
            DenseSeries {
                site: site.site.clone(),
                values: axis
                    .days()
                    .iter()
                    .map(|day| by_day.get(day).copied().unwrap_or(0.0))
                    .collect(),
            }
        })
        .collect()
}

pub fn count_unique_users(records: &[ActivityRecord]) -> usize {
    records
        .iter()
        .filter_map(ActivityRecord::username)
        .collect::<HashSet<_>>()
        .len()
}

pub fn sum_total_time(records: &[ActivityRecord]) -> f64 {
    records.iter().map(ActivityRecord::seconds).sum()
}

/// Distinct users per site, in first-seen site order.
pub fn users_per_site(records: &[ActivityRecord]) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut users: HashMap<&str, HashSet<&str>> = HashMap::new();

    for record in records {
        let Some(site) = record.site() else {
            continue;
        };
        let entry = users.entry(site).or_insert_with(|| {
            order.push(site);
            HashSet::new()
        });
        if let Some(username) = record.username() {
            entry.insert(username);
        }
    }

    order
        .into_iter()
        .map(|site| (site.to_string(), users.get(site).map_or(0, HashSet::len)))
        .collect()
}
