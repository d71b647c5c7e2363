// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Forecast aggregation: reduces the 3-hourly feed to one entry per day.
//!
//! Two reducers coexist. The display path keeps the first sample of each
//! day; the persistence path averages the day's samples. They can disagree
//! for the same day and both are kept as-is.

use crate::models::{BucketMode, Condition, DailyForecast, WeatherSample};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Maximum number of daily entries produced.
pub const MAX_FORECAST_DAYS: usize = 5;

/// Label shown when a timestamp cannot be turned into a date.
pub const INVALID_DATE: &str = "Invalid date";

/// Round to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to a whole degree, halves toward positive infinity (-2.5 → -2).
pub fn round_display(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Bucket samples by UTC calendar date.
pub fn bucket_by_day(samples: &[WeatherSample], mode: BucketMode) -> Vec<DailyForecast> {
    bucket_by_day_in(samples, mode, Utc.fix())
}

/// Bucket samples by calendar date at a fixed UTC offset.
///
/// Samples without a timestamp or condition are skipped before bucketing.
/// The output holds at most [`MAX_FORECAST_DAYS`] entries, earliest date first.
pub fn bucket_by_day_in(
    samples: &[WeatherSample],
    mode: BucketMode,
    offset: FixedOffset,
) -> Vec<DailyForecast> {
    let mut buckets: BTreeMap<NaiveDate, Bucket<'_>> = BTreeMap::new();

    for sample in samples {
        let Some((timestamp, condition)) = sample.timestamp.zip(sample.condition()) else {
            continue;
        };
        let Some(date) = local_date(timestamp, offset) else {
            continue;
        };

        buckets
            .entry(date)
            .and_modify(|bucket| bucket.add(sample))
            .or_insert_with(|| Bucket::new(sample, timestamp, condition));
    }

    buckets
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .map(|(date, bucket)| bucket.finish(date, mode))
        .collect()
}

/// Convert a fixed offset in seconds, falling back to UTC when out of range.
pub fn offset_from_secs(secs: i32) -> FixedOffset {
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}

fn local_date(timestamp: i64, offset: FixedOffset) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(&offset).date_naive())
}

/// Running state for one calendar day.
struct Bucket<'a> {
    first: &'a WeatherSample,
    first_timestamp: i64,
    condition: &'a Condition,
    count: u32,
    temperature_sum: f64,
    humidity_sum: f64,
    wind_sum: f64,
}

impl<'a> Bucket<'a> {
    fn new(sample: &'a WeatherSample, timestamp: i64, condition: &'a Condition) -> Self {
        Self {
            first: sample,
            first_timestamp: timestamp,
            condition,
            count: 1,
            temperature_sum: sample.temperature,
            humidity_sum: sample.humidity,
            wind_sum: sample.wind_speed,
        }
    }

    fn add(&mut self, sample: &WeatherSample) {
        self.count += 1;
        self.temperature_sum += sample.temperature;
        self.humidity_sum += sample.humidity;
        self.wind_sum += sample.wind_speed;
    }

    fn finish(self, date: NaiveDate, mode: BucketMode) -> DailyForecast {
        let (temperature, humidity, wind_speed, display_temp) = match mode {
            BucketMode::First => (
                self.first.temperature,
                self.first.humidity,
                self.first.wind_speed,
                round_display(self.first.temperature),
            ),
            BucketMode::Mean => {
                let n = f64::from(self.count);
                let mean = self.temperature_sum / n;
                // Whole degrees come from the unrounded mean.
                (
                    round_one_decimal(mean),
                    round_one_decimal(self.humidity_sum / n),
                    round_one_decimal(self.wind_sum / n),
                    round_display(mean),
                )
            }
        };

        DailyForecast {
            date,
            timestamp: self.first_timestamp,
            temperature,
            display_temp,
            humidity,
            wind_speed,
            condition: self.condition.clone(),
        }
    }
}

/// Weekday and short date for a forecast card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayLabel {
    pub day: String,
    pub date: String,
}

/// Build a display label ("Monday", "Jun 3") for a timestamp.
///
/// Missing or unrepresentable timestamps yield the [`INVALID_DATE`] marker
/// instead of an error.
pub fn day_label(timestamp: Option<i64>, offset: FixedOffset) -> DayLabel {
    match timestamp
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.with_timezone(&offset))
    {
        Some(dt) => DayLabel {
            day: dt.format("%A").to_string(),
            date: dt.format("%b %-d").to_string(),
        },
        None => DayLabel {
            day: INVALID_DATE.to_string(),
            date: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY1: i64 = 1_717_200_000; // 2024-06-01T00:00:00Z
    const HOUR: i64 = 3600;
    const DAY: i64 = 24 * HOUR;

    fn condition(icon: &str) -> Condition {
        Condition {
            id: 800,
            main: "Clear".to_string(),
            description: "clear sky".to_string(),
            icon: icon.to_string(),
        }
    }

    fn sample(timestamp: i64, temperature: f64) -> WeatherSample {
        WeatherSample {
            timestamp: Some(timestamp),
            temperature,
            feels_like: temperature,
            humidity: 50.0,
            wind_speed: 3.0,
            conditions: vec![condition("01d")],
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_mode_keeps_earliest_sample() {
        let samples = vec![sample(DAY1, 10.0), sample(DAY1 + 3 * HOUR, 14.0), sample(DAY1 + DAY, 8.0)];

        let daily = bucket_by_day(&samples, BucketMode::First);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, date(2024, 6, 1));
        assert_eq!(daily[0].temperature, 10.0);
        assert_eq!(daily[0].timestamp, DAY1);
        assert_eq!(daily[1].date, date(2024, 6, 2));
        assert_eq!(daily[1].temperature, 8.0);
    }

    #[test]
    fn test_mean_mode_averages_day() {
        let samples = vec![sample(DAY1, 10.0), sample(DAY1 + 3 * HOUR, 14.0), sample(DAY1 + DAY, 8.0)];

        let daily = bucket_by_day(&samples, BucketMode::Mean);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].temperature, 12.0);
        assert_eq!(daily[1].temperature, 8.0);
    }

    #[test]
    fn test_mean_mode_rounds_to_one_decimal() {
        let mut a = sample(DAY1, 10.0);
        a.humidity = 40.0;
        a.wind_speed = 1.0;
        let mut b = sample(DAY1 + HOUR, 10.0);
        b.humidity = 41.0;
        b.wind_speed = 1.0;
        let mut c = sample(DAY1 + 2 * HOUR, 10.5);
        c.humidity = 41.0;
        c.wind_speed = 2.0;

        let daily = bucket_by_day(&[a, b, c], BucketMode::Mean);

        assert_eq!(daily[0].temperature, 10.2);
        assert_eq!(daily[0].humidity, 40.7);
        assert_eq!(daily[0].wind_speed, 1.3);
        assert_eq!(daily[0].display_temp, 10);
    }

    #[test]
    fn test_mean_display_uses_unrounded_mean() {
        // 7.4 / 3 = 2.466..., stored as 2.5 but displayed as 2.
        let samples = vec![
            sample(DAY1, 2.4),
            sample(DAY1 + HOUR, 2.5),
            sample(DAY1 + 2 * HOUR, 2.5),
        ];

        let daily = bucket_by_day(&samples, BucketMode::Mean);

        assert_eq!(daily[0].temperature, 2.5);
        assert_eq!(daily[0].display_temp, 2);
    }

    #[test]
    fn test_round_display_halves_go_up() {
        assert_eq!(round_display(2.5), 3);
        assert_eq!(round_display(2.49), 2);
        assert_eq!(round_display(-2.5), -2);
        assert_eq!(round_display(-2.51), -3);
        assert_eq!(round_display(-0.4), 0);

        let daily = bucket_by_day(&[sample(DAY1, -2.5)], BucketMode::First);
        assert_eq!(daily[0].display_temp, -2);
    }

    #[test]
    fn test_caps_at_five_days() {
        let samples: Vec<_> = (0..8).map(|d| sample(DAY1 + d * DAY, d as f64)).collect();

        let daily = bucket_by_day(&samples, BucketMode::First);

        assert_eq!(daily.len(), MAX_FORECAST_DAYS);
        assert_eq!(daily[0].date, date(2024, 6, 1));
        assert_eq!(daily[4].date, date(2024, 6, 5));
    }

    #[test]
    fn test_invalid_samples_contribute_nothing() {
        let mut no_timestamp = sample(DAY1, 100.0);
        no_timestamp.timestamp = None;
        let mut no_condition = sample(DAY1 + HOUR, 100.0);
        no_condition.conditions.clear();
        let out_of_range = sample(i64::MAX, 100.0);

        let samples = vec![no_timestamp, no_condition, out_of_range, sample(DAY1 + 2 * HOUR, 12.0)];

        for mode in [BucketMode::First, BucketMode::Mean] {
            let daily = bucket_by_day(&samples, mode);
            assert_eq!(daily.len(), 1);
            assert_eq!(daily[0].temperature, 12.0);
            assert_eq!(daily[0].timestamp, DAY1 + 2 * HOUR);
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(bucket_by_day(&[], BucketMode::First).is_empty());

        let mut invalid = sample(DAY1, 1.0);
        invalid.timestamp = None;
        assert!(bucket_by_day(&[invalid], BucketMode::Mean).is_empty());
    }

    #[test]
    fn test_output_bounded_by_distinct_dates() {
        let samples = vec![
            sample(DAY1, 1.0),
            sample(DAY1 + HOUR, 2.0),
            sample(DAY1 + 2 * HOUR, 3.0),
            sample(DAY1 + DAY, 4.0),
        ];

        for mode in [BucketMode::First, BucketMode::Mean] {
            let daily = bucket_by_day(&samples, mode);
            assert_eq!(daily.len(), 2);
            assert!(daily.len() <= MAX_FORECAST_DAYS);
        }
    }

    #[test]
    fn test_bucketing_is_deterministic() {
        let samples: Vec<_> = (0..40).map(|i| sample(DAY1 + i * 3 * HOUR, (i % 7) as f64)).collect();

        for mode in [BucketMode::First, BucketMode::Mean] {
            assert_eq!(bucket_by_day(&samples, mode), bucket_by_day(&samples, mode));
        }
    }

    #[test]
    fn test_offset_moves_day_boundary() {
        // 22:00 UTC on June 1 is already June 2 at UTC+3.
        let samples = vec![sample(DAY1 + 22 * HOUR, 5.0)];

        let utc = bucket_by_day(&samples, BucketMode::First);
        let east = bucket_by_day_in(&samples, BucketMode::First, offset_from_secs(3 * 3600));

        assert_eq!(utc[0].date, date(2024, 6, 1));
        assert_eq!(east[0].date, date(2024, 6, 2));
    }

    #[test]
    fn test_condition_from_first_sample_in_mean_mode() {
        let mut later = sample(DAY1 + HOUR, 20.0);
        later.conditions = vec![condition("10d")];

        let daily = bucket_by_day(&[sample(DAY1, 10.0), later], BucketMode::Mean);

        assert_eq!(daily[0].condition.icon, "01d");
    }

    #[test]
    fn test_day_label() {
        let label = day_label(Some(DAY1), Utc.fix());
        assert_eq!(label.day, "Saturday");
        assert_eq!(label.date, "Jun 1");

        let invalid = day_label(None, Utc.fix());
        assert_eq!(invalid.day, INVALID_DATE);
        assert_eq!(invalid.date, "");

        assert_eq!(day_label(Some(i64::MAX), Utc.fix()).day, INVALID_DATE);
    }

    #[test]
    fn test_offset_from_secs_out_of_range() {
        assert_eq!(offset_from_secs(100_000), Utc.fix());
        assert_eq!(offset_from_secs(-18_000).local_minus_utc(), -18_000);
    }
}
