// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather observation and forecast models.
//!
//! These are request-scoped: nothing here is persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A weather condition as reported by the upstream feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Upstream condition code (e.g. 800 = clear sky)
    pub id: i64,
    /// Condition group ("Rain", "Clouds", ...)
    #[serde(default)]
    pub main: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Icon identifier ("10d")
    #[serde(default)]
    pub icon: String,
}

/// One timestamped sample from the 3-hourly forecast feed.
///
/// `timestamp` is optional and `conditions` may be empty: the feed is not
/// trusted, and samples missing either are dropped before bucketing.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSample {
    /// Seconds since the Unix epoch
    pub timestamp: Option<i64>,
    /// Temperature in °C
    pub temperature: f64,
    /// Feels-like temperature in °C
    pub feels_like: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Wind speed (m/s)
    pub wind_speed: f64,
    pub conditions: Vec<Condition>,
}

impl WeatherSample {
    /// The primary condition, if the sample has one.
    pub fn condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }
}

/// Current conditions at a location.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Location name as resolved by the upstream service
    pub location_name: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub condition: Option<Condition>,
    /// Observation time (seconds since the Unix epoch)
    pub observed_at: Option<i64>,
}

/// Raw forecast feed for a location.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastFeed {
    /// City name as resolved by the upstream service
    pub city: Option<String>,
    /// Shift in seconds from UTC for the location
    pub timezone_offset_secs: i32,
    /// Samples in the order delivered (chronologically non-decreasing)
    pub samples: Vec<WeatherSample>,
}

/// How same-day samples are reduced to a single daily entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketMode {
    /// Keep the earliest sample of each day.
    #[default]
    First,
    /// Average temperature, humidity and wind across the day's samples.
    Mean,
}

/// One representative entry per calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    /// Timestamp of the first sample seen for `date`
    pub timestamp: i64,
    /// One decimal place in mean mode
    pub temperature: f64,
    /// Whole degrees, rounded from the unrounded temperature
    pub display_temp: i64,
    pub humidity: f64,
    pub wind_speed: f64,
    /// Taken from the first sample seen for `date`
    pub condition: Condition,
}
