// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod firebase_auth;
pub mod forecast;
pub mod history;
pub mod maps;
pub mod searches;
pub mod videos;
pub mod weather;

pub use firebase_auth::{AuthError, FirebaseTokenVerifier, IdentityVerifier, VerifiedUser};
pub use history::{HistoryManager, HistoryUpdate};
pub use maps::GeocodingClient;
pub use searches::SearchService;
pub use videos::VideoSearchClient;
pub use weather::{OpenWeatherClient, WeatherSource};
