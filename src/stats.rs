use crate::models::DailyStatsPayload;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourBucket {
    pub hour: u32,
    pub minutes: f64,
}

/// Today's statistics, normalized from whichever shape the server sent.
/// Legacy summary shapes carry no hourly series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyStats {
    pub hours: Vec<HourBucket>,
    pub total_minutes: f64,
    pub total_tasks: Option<u64>,
    pub productivity: Option<f64>,
    pub categories: BTreeMap<String, f64>,
}

impl From<DailyStatsPayload> for DailyStats {
    fn from(payload: DailyStatsPayload) -> Self {
        match payload {
            DailyStatsPayload::Hourly { hours, durations } => {
                let hours: Vec<HourBucket> = hours
                    .into_iter()
                    .zip(durations)
                    .filter(|(hour, minutes)| *hour < 24 && minutes.is_finite())
                    .map(|(hour, minutes)| HourBucket {
                        hour,
                        minutes: minutes.max(0.0),
                    })
                    .collect();
                let total_minutes = hours.iter().map(|bucket| bucket.minutes).sum();
                DailyStats {
                    hours,
                    total_minutes,
                    ..DailyStats::default()
                }
            }
            DailyStatsPayload::Summary {
                total_time,
                total_tasks,
                productivity,
            } => DailyStats {
                total_minutes: total_time,
                total_tasks: Some(total_tasks),
                productivity: Some(productivity),
                ..DailyStats::default()
            },
            DailyStatsPayload::ByCategory {
                total_time,
                categories,
            } => DailyStats {
                total_minutes: total_time,
                categories,
                ..DailyStats::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBar {
    pub hour: u32,
    pub minutes: u64,
    pub height_pct: f64,
    pub label: String,
}

pub fn build_chart(stats: &DailyStats, scale_floor: f64) -> Vec<ChartBar> {
    let hours: Vec<u32> = stats.hours.iter().map(|bucket| bucket.hour).collect();
    let durations: Vec<f64> = stats.hours.iter().map(|bucket| bucket.minutes).collect();
    build_bars(&hours, &durations, scale_floor)
}

/// One bar per hour, scaled against the largest duration or `scale_floor`,
/// whichever is bigger. Extra entries on either side are ignored.
pub fn build_bars(hours: &[u32], durations: &[f64], scale_floor: f64) -> Vec<ChartBar> {
    let max = durations
        .iter()
        .copied()
        .fold(scale_floor.max(0.0), f64::max);

    hours
        .iter()
        .zip(durations)
        .map(|(&hour, &minutes)| {
            let height_pct = if max > 0.0 {
                (minutes / max * 100.0).clamp(0.0, 100.0)
            } else {
                0.0
            };
            let minutes = minutes.max(0.0).round() as u64;
            ChartBar {
                hour,
                minutes,
                height_pct,
                label: format!("{hour}:00 - {minutes} min."),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_scale_against_the_largest_bucket() {
        let bars = build_bars(&[9, 10, 11, 12], &[0.0, 10.0, 40.0, 0.0], 0.0);
        let heights: Vec<f64> = bars.iter().map(|bar| bar.height_pct).collect();
        assert_eq!(heights, vec![0.0, 25.0, 100.0, 0.0]);
        assert_eq!(bars[2].label, "11:00 - 40 min.");
    }

    #[test]
    fn scale_floor_keeps_short_days_low() {
        let bars = build_bars(&[9, 10], &[30.0, 15.0], 60.0);
        assert_eq!(bars[0].height_pct, 50.0);
        assert_eq!(bars[1].height_pct, 25.0);
    }

    #[test]
    fn empty_day_renders_flat_baseline() {
        let bars = build_bars(&[8, 9, 10], &[0.0, 0.0, 0.0], 0.0);
        assert_eq!(bars.len(), 3);
        assert!(bars.iter().all(|bar| bar.height_pct == 0.0));
    }

    #[test]
    fn hourly_payload_drops_invalid_buckets() {
        let payload: DailyStatsPayload =
            serde_json::from_str(r#"{"hours": [9, 10, 30], "durations": [15, 45]}"#).unwrap();
        let stats = DailyStats::from(payload);
        assert_eq!(stats.hours.len(), 2);
        assert_eq!(stats.total_minutes, 60.0);
        assert_eq!(stats.total_tasks, None);
    }

    #[test]
    fn legacy_payloads_map_to_summary() {
        let payload: DailyStatsPayload = serde_json::from_str(
            r#"{"total_time": 95, "total_tasks": 3, "productivity": 4.5}"#,
        )
        .unwrap();
        let stats = DailyStats::from(payload);
        assert!(stats.hours.is_empty());
        assert_eq!(stats.total_tasks, Some(3));
        assert_eq!(stats.productivity, Some(4.5));

        let payload: DailyStatsPayload =
            serde_json::from_str(r#"{"total_time": 50, "categories": {"Work": 50}}"#).unwrap();
        let stats = DailyStats::from(payload);
        assert_eq!(stats.total_minutes, 50.0);
        assert_eq!(stats.categories.get("Work"), Some(&50.0));
        assert!(build_chart(&stats, 60.0).is_empty());
    }
}
