// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod history;
pub mod search;
pub mod weather;

pub use history::{HistoryPatch, HistoryRecord, NewHistoryRecord};
pub use search::{NewSearchEntry, SearchEntry};
pub use weather::{
    BucketMode, Condition, CurrentConditions, DailyForecast, ForecastFeed, WeatherSample,
};
