use crate::aggregate::{
    aggregate_by_site, aggregate_by_site_and_day, build_date_axis_at, count_unique_users,
    observed_days, project_to_matrix, records_on_day, sum_total_time, users_per_site,
};
use crate::models::{
    ActivityBatch, ActivityRecord, ChartData, DashboardResponse, DashboardSummary, Dataset, DateAxis,
    DenseSeries, SiteTotals, TimeUnit,
};
use chrono::NaiveDate;

impl TimeUnit {
    pub fn convert(self, seconds: f64) -> f64 {
        match self {
            TimeUnit::Seconds => seconds,
            TimeUnit::Minutes => (seconds / 60.0 * 100.0).round() / 100.0,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "secs",
            TimeUnit::Minutes => "mins",
        }
    }
}

pub fn time_by_site(totals: &SiteTotals, unit: TimeUnit) -> ChartData {
    site_time_chart(totals, unit, "Total Time Spent")
}

/// Per-site time for records dated `today`.
pub fn last_24h(records: &[ActivityRecord], today: NaiveDate, unit: TimeUnit) -> ChartData {
    let totals = aggregate_by_site(&records_on_day(records, today));
    site_time_chart(&totals, unit, "Time Spent Last 24 Hours")
}

fn site_time_chart(totals: &SiteTotals, unit: TimeUnit, title: &str) -> ChartData {
    ChartData {
        labels: totals.iter().map(|total| total.site.clone()).collect(),
        datasets: vec![Dataset {
            label: format!("{title} ({})", unit.suffix()),
            data: totals
                .iter()
                .map(|total| unit.convert(total.total_seconds))
                .collect(),
        }],
    }
}

pub fn users_per_site_chart(counts: &[(String, usize)]) -> ChartData {
    ChartData {
        labels: counts.iter().map(|(site, _)| site.clone()).collect(),
        datasets: vec![Dataset {
            label: "Number of Users".to_string(),
            data: counts.iter().map(|(_, users)| *users as f64).collect(),
        }],
    }
}

/// One dataset per site over a shared day axis.
pub fn series_chart(axis: &DateAxis, series: &[DenseSeries], unit: TimeUnit) -> ChartData {
    ChartData {
        labels: axis.labels(),
        datasets: series
            .iter()
            .map(|series| Dataset {
                label: series.site.clone(),
                data: series.values.iter().map(|value| unit.convert(*value)).collect(),
            })
            .collect(),
    }
}

pub fn build_dashboard(
    records: &[ActivityRecord],
    unit: TimeUnit,
    min_trailing_days: usize,
    today: NaiveDate,
) -> DashboardResponse {
    let site_totals = aggregate_by_site(records);
    let day_totals = aggregate_by_site_and_day(records);

    let bar_axis = observed_days(&day_totals);
    let line_axis = build_date_axis_at(&day_totals, min_trailing_days, today);

    DashboardResponse {
        unit,
        summary: DashboardSummary {
            user_count: count_unique_users(records),
            total_time_spent: unit.convert(sum_total_time(records)),
            most_visited_site: site_totals.most_visited().map(str::to_string),
            record_count: records.len(),
            skipped_records: day_totals.skipped,
        },
        time_by_site: time_by_site(&site_totals, unit),
        users_per_site: users_per_site_chart(&users_per_site(records)),
        daily_time: series_chart(&bar_axis, &project_to_matrix(&day_totals, &bar_axis), unit),
        activity_over_time: series_chart(
            &line_axis,
            &project_to_matrix(&day_totals, &line_axis),
            unit,
        ),
        last_24h: last_24h(records, today, unit),
    }
}

/// Dashboard for a decoded payload. Undecodable elements count as skipped.
pub fn build_batch_dashboard(
    batch: &ActivityBatch,
    unit: TimeUnit,
    min_trailing_days: usize,
    today: NaiveDate,
) -> DashboardResponse {
    let mut dashboard = build_dashboard(&batch.records, unit, min_trailing_days, today);
    dashboard.summary.record_count += batch.dropped;
    dashboard.summary.skipped_records += batch.dropped;
    dashboard
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ActivityRecord> {
        vec![
            ActivityRecord::new("a.com", "ann", "2024-01-01", 60.0),
            ActivityRecord::new("a.com", "bob", "2024-01-01", 30.0),
            ActivityRecord::new("b.com", "bob", "2024-01-03", 45.0),
            ActivityRecord::new("c.com", "cat", "garbage", 100.0),
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    #[test]
    fn minutes_round_to_two_decimals() {
        assert_eq!(TimeUnit::Minutes.convert(90.0), 1.5);
        assert_eq!(TimeUnit::Minutes.convert(100.0), 1.67);
        assert_eq!(TimeUnit::Seconds.convert(100.0), 100.0);
    }

    #[test]
    fn dashboard_summary() {
        let dashboard = build_dashboard(&records(), TimeUnit::Seconds, 4, today());
        assert_eq!(dashboard.summary.user_count, 3);
        assert_eq!(dashboard.summary.total_time_spent, 235.0);
        assert_eq!(dashboard.summary.most_visited_site.as_deref(), Some("a.com"));
        assert_eq!(dashboard.summary.record_count, 4);
        assert_eq!(dashboard.summary.skipped_records, 1);
    }

    #[test]
    fn pie_includes_undated_sites() {
        let dashboard = build_dashboard(&records(), TimeUnit::Seconds, 4, today());
        assert_eq!(dashboard.time_by_site.labels, vec!["a.com", "b.com", "c.com"]);
        assert_eq!(dashboard.time_by_site.datasets[0].data, vec![90.0, 45.0, 100.0]);
        assert_eq!(dashboard.users_per_site.datasets[0].data, vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn bar_uses_observed_days_and_line_uses_padded_axis() {
        let dashboard = build_dashboard(&records(), TimeUnit::Seconds, 4, today());
        assert_eq!(dashboard.daily_time.labels, vec!["2024-01-01", "2024-01-03"]);
        assert_eq!(dashboard.daily_time.datasets[0].data, vec![90.0, 0.0]);
        assert_eq!(dashboard.daily_time.datasets[1].data, vec![0.0, 45.0]);

        assert_eq!(
            dashboard.activity_over_time.labels,
            vec!["2023-12-31", "2024-01-01", "2024-01-02", "2024-01-03"]
        );
        assert_eq!(dashboard.activity_over_time.datasets[0].label, "a.com");
        assert_eq!(
            dashboard.activity_over_time.datasets[1].data,
            vec![0.0, 0.0, 0.0, 45.0]
        );
    }

    #[test]
    fn minutes_apply_to_every_chart() {
        let dashboard = build_dashboard(&records(), TimeUnit::Minutes, 4, today());
        assert_eq!(dashboard.unit, TimeUnit::Minutes);
        assert_eq!(dashboard.summary.total_time_spent, 3.92);
        assert_eq!(dashboard.time_by_site.datasets[0].data, vec![1.5, 0.75, 1.67]);
        assert_eq!(dashboard.time_by_site.datasets[0].label, "Total Time Spent (mins)");
        assert_eq!(dashboard.daily_time.datasets[0].data, vec![1.5, 0.0]);
        // User counts are not durations.
        assert_eq!(dashboard.users_per_site.datasets[0].data, vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn last_24h_only_counts_today() {
        let mut recs = records();
        recs.push(ActivityRecord::new("b.com", "ann", "2024-02-01T08:00:00Z", 90.0));
        recs.push(ActivityRecord::new("a.com", "bob", "2024-02-01", 30.0));
        recs.push(ActivityRecord::new("b.com", "cat", "2024-02-01T23:00:00-05:00", 600.0));

        let dashboard = build_dashboard(&recs, TimeUnit::Minutes, 4, today());
        assert_eq!(dashboard.last_24h.labels, vec!["b.com", "a.com"]);
        assert_eq!(dashboard.last_24h.datasets[0].data, vec![1.5, 0.5]);
        assert_eq!(
            dashboard.last_24h.datasets[0].label,
            "Time Spent Last 24 Hours (mins)"
        );

        let empty = build_dashboard(&records(), TimeUnit::Seconds, 4, today());
        assert!(empty.last_24h.labels.is_empty());
    }

    #[test]
    fn dropped_elements_count_as_skipped() {
        let values: Vec<serde_json::Value> = serde_json::from_str(
            r#"[null, {"site": "a.com", "username": "ann", "date": "2024-01-01", "total_time_spent": 60}, "junk"]"#,
        )
        .unwrap();
        let batch = ActivityBatch::from_values(values);
        let dashboard = build_batch_dashboard(&batch, TimeUnit::Seconds, 4, today());
        assert_eq!(dashboard.summary.record_count, 3);
        assert_eq!(dashboard.summary.skipped_records, 2);
        assert_eq!(dashboard.time_by_site.datasets[0].data, vec![60.0]);
    }

    #[test]
    fn empty_dashboard_still_has_an_axis() {
        let dashboard = build_dashboard(&[], TimeUnit::Seconds, 4, today());
        assert_eq!(dashboard.summary.most_visited_site, None);
        assert!(dashboard.time_by_site.labels.is_empty());
        assert!(dashboard.daily_time.labels.is_empty());
        assert_eq!(dashboard.activity_over_time.labels.len(), 4);
        assert_eq!(dashboard.activity_over_time.labels[3], "2024-02-01");
        assert!(dashboard.activity_over_time.datasets.is_empty());
    }
}
