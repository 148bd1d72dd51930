//! Weather retrieval for Skycast
//!
//! Client for the Open-Meteo Forecast API plus processing of the raw
//! column-oriented payload into typed hourly and daily rows.

pub mod provider;
pub mod types;

pub use provider::WeatherProvider;
pub use types::{
    CurrentWeather, DailyEntry, HourlyEntry, WeatherCondition, WeatherError, WeatherReport,
};
