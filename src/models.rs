use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// One logged observation of time spent by a user on a site.
///
/// Decoding never fails on a single bad field: wrong-typed values come back
/// as `None` so the record can be skipped by whichever view needs the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub site: Option<String>,
    #[serde(default)]
    pub date: Option<DateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub last_updated: Option<String>,
    #[serde(default, alias = "totalTimeSpent", deserialize_with = "lenient_seconds")]
    pub total_time_spent: Option<f64>,
}

impl ActivityRecord {
    pub fn new(site: &str, username: &str, date: &str, seconds: f64) -> Self {
        Self {
            id: None,
            username: Some(username.to_string()),
            site: Some(site.to_string()),
            date: Some(DateValue::Text(date.to_string())),
            last_updated: None,
            total_time_spent: Some(seconds),
        }
    }

    /// The site, if present and non-blank.
    pub fn site(&self) -> Option<&str> {
        non_blank(self.site.as_deref())
    }

    pub fn username(&self) -> Option<&str> {
        non_blank(self.username.as_deref())
    }

    /// Duration in seconds. Missing, negative and non-finite values count as 0.
    pub fn seconds(&self) -> f64 {
        match self.total_time_spent {
            Some(value) if value.is_finite() && value >= 0.0 => value,
            _ => 0.0,
        }
    }
}

/// A decoded upstream payload. Array elements that are not records at all
/// (`null`, strings, numbers) are dropped and counted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityBatch {
    pub records: Vec<ActivityRecord>,
    pub dropped: usize,
}

impl ActivityBatch {
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut batch = Self::default();
        for (position, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<ActivityRecord>(value) {
                Ok(record) => batch.records.push(record),
                Err(err) => {
                    debug!(position, "dropping undecodable activity element: {err}");
                    batch.dropped += 1;
                }
            }
        }
        batch
    }

    /// Keeps one user's records. Dropped elements have no known owner, so
    /// they no longer count against the filtered batch.
    pub fn retain_user(&mut self, username: &str) {
        self.records.retain(|record| record.username() == Some(username));
        self.dropped = 0;
    }
}

/// Raw `date` field as it arrives from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Text(String),
    EpochMillis(i64),
    Other(Value),
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) => Some(value),
        _ => None,
    })
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(value)) => value.as_f64(),
        Some(Value::String(value)) => value.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteTotal {
    pub site: String,
    pub total_seconds: f64,
    pub record_count: usize,
}

/// Per-site totals in first-seen site order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteTotals {
    pub(crate) sites: Vec<SiteTotal>,
    pub(crate) index: HashMap<String, usize>,
}

impl SiteTotals {
    pub fn iter(&self) -> impl Iterator<Item = &SiteTotal> {
        self.sites.iter()
    }

    pub fn get(&self, site: &str) -> Option<&SiteTotal> {
        self.index.get(site).map(|&idx| &self.sites[idx])
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Site with the most records; ties go to the earliest-seen site.
    pub fn most_visited(&self) -> Option<&str> {
        let mut best: Option<&SiteTotal> = None;
        for total in &self.sites {
            if best.is_none_or(|current| total.record_count > current.record_count) {
                best = Some(total);
            }
        }
        best.map(|total| total.site.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayTotal {
    pub day: NaiveDate,
    pub total_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteDays {
    pub site: String,
    /// Days in first-seen order, not sorted.
    pub days: Vec<DayTotal>,
}

impl SiteDays {
    pub fn total_for(&self, day: NaiveDate) -> Option<f64> {
        self.days
            .iter()
            .find(|entry| entry.day == day)
            .map(|entry| entry.total_seconds)
    }
}

/// Per-site, per-day totals in first-seen site order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteDayTotals {
    pub sites: Vec<SiteDays>,
    /// Records left out because of a missing site or an unparseable date.
    pub skipped: usize,
}

impl SiteDayTotals {
    pub fn site(&self, site: &str) -> Option<&SiteDays> {
        self.sites.iter().find(|entry| entry.site == site)
    }

    pub fn total_for(&self, site: &str, day: NaiveDate) -> Option<f64> {
        self.site(site).and_then(|entry| entry.total_for(day))
    }
}

/// Ascending, duplicate-free sequence of calendar days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateAxis(pub(crate) Vec<NaiveDate>);

impl DateAxis {
    pub fn days(&self) -> &[NaiveDate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(|day| day_key(*day)).collect()
    }
}

/// One value per axis day for a single site.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseSeries {
    pub site: String,
    pub values: Vec<f64>,
}

pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Minutes,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub unit: TimeUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub user_count: usize,
    pub total_time_spent: f64,
    pub most_visited_site: Option<String>,
    pub record_count: usize,
    /// Records or array elements left out of the per-day views.
    pub skipped_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub unit: TimeUnit,
    pub summary: DashboardSummary,
    pub time_by_site: ChartData,
    pub users_per_site: ChartData,
    pub daily_time: ChartData,
    pub activity_over_time: ChartData,
    /// Per-site time for records dated today (UTC).
    pub last_24h: ChartData,
}
