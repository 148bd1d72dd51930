//! Open-Meteo Forecast API client and payload processing.
//!
//! The API returns hourly and daily data as parallel column arrays. Rows are
//! zipped up to the shortest column; rows with an unparseable timestamp or
//! missing metrics are skipped rather than failing the whole report.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{
    CurrentWeather, DailyEntry, HourlyEntry, WeatherCondition, WeatherError, WeatherReport,
};

const WEATHER_API_BASE: &str = "https://api.open-meteo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const HOURLY_FIELDS: &str =
    "temperature_2m,weather_code,precipitation_probability,windspeed_10m,winddirection_10m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min";

#[derive(Debug, Deserialize)]
struct RawForecast {
    current_weather: Option<RawCurrent>,
    hourly: Option<RawHourly>,
    daily: Option<RawDaily>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
    elevation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    time: String,
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    #[serde(alias = "weathercode")]
    weather_code: i32,
}

#[derive(Debug, Default, Deserialize)]
struct RawHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<i32>>,
    #[serde(default)]
    windspeed_10m: Vec<Option<f64>>,
    #[serde(default)]
    winddirection_10m: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
}

impl WeatherProvider {
    /// Create a provider against the public Open-Meteo forecast endpoint.
    ///
    /// A `timeout_secs` of zero falls back to the default timeout.
    pub fn new(timeout_secs: u64) -> Result<Self, WeatherError> {
        let timeout = if timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_secs
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: WEATHER_API_BASE.to_string(),
        })
    }

    /// Point the provider at a different base URL (test servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch and process the forecast for a coordinate pair.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherReport, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("current_weather", "true".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let raw: RawForecast = response.json().await?;
        Ok(process_forecast(raw))
    }
}

fn process_forecast(raw: RawForecast) -> WeatherReport {
    let current = raw.current_weather.map(|c| {
        let condition = WeatherCondition::from_wmo_code(c.weather_code);
        CurrentWeather {
            time: c.time,
            temperature: c.temperature,
            windspeed: c.windspeed,
            winddirection: c.winddirection,
            weather_code: c.weather_code,
            condition,
            description: condition.description().to_string(),
        }
    });

    WeatherReport {
        current,
        hourly: raw.hourly.map(process_hourly).unwrap_or_default(),
        daily: raw.daily.map(process_daily).unwrap_or_default(),
        latitude: raw.latitude,
        longitude: raw.longitude,
        timezone: raw.timezone,
        elevation: raw.elevation,
    }
}

fn process_hourly(h: RawHourly) -> Vec<HourlyEntry> {
    let rows = [
        h.time.len(),
        h.temperature_2m.len(),
        h.weather_code.len(),
        h.precipitation_probability.len(),
        h.windspeed_10m.len(),
        h.winddirection_10m.len(),
    ]
    .into_iter()
    .min()
    .unwrap_or(0);

    let mut entries = Vec::with_capacity(rows);
    for i in 0..rows {
        let Some(time) = parse_hour(&h.time[i]) else {
            tracing::warn!("skipping hourly row {i}: bad timestamp {:?}", h.time[i]);
            continue;
        };
        let (Some(temperature), Some(code), Some(windspeed), Some(winddirection)) = (
            h.temperature_2m[i],
            h.weather_code[i],
            h.windspeed_10m[i],
            h.winddirection_10m[i],
        ) else {
            tracing::warn!("skipping hourly row {i}: missing metrics");
            continue;
        };
        entries.push(HourlyEntry {
            time,
            temperature,
            weather_code: code,
            condition: WeatherCondition::from_wmo_code(code),
            precipitation_probability: h.precipitation_probability[i],
            windspeed,
            winddirection,
        });
    }
    entries
}

fn process_daily(d: RawDaily) -> Vec<DailyEntry> {
    let rows = [
        d.time.len(),
        d.weather_code.len(),
        d.temperature_2m_max.len(),
        d.temperature_2m_min.len(),
    ]
    .into_iter()
    .min()
    .unwrap_or(0);

    let mut entries = Vec::with_capacity(rows);
    for i in 0..rows {
        let Ok(day) = NaiveDate::parse_from_str(&d.time[i], "%Y-%m-%d") else {
            tracing::warn!("skipping daily row {i}: bad date {:?}", d.time[i]);
            continue;
        };
        let (Some(code), Some(temp_max), Some(temp_min)) = (
            d.weather_code[i],
            d.temperature_2m_max[i],
            d.temperature_2m_min[i],
        ) else {
            tracing::warn!("skipping daily row {i}: missing metrics");
            continue;
        };
        entries.push(DailyEntry {
            day,
            temp_max,
            temp_min,
            weather_code: code,
            condition: WeatherCondition::from_wmo_code(code),
        });
    }
    entries
}

/// The API reports hourly timestamps without seconds ("2024-06-01T13:00").
fn parse_hour(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_body() -> serde_json::Value {
        json!({
            "latitude": 48.14,
            "longitude": 11.58,
            "timezone": "Europe/Berlin",
            "elevation": 521.0,
            "current_weather": {
                "time": "2024-06-01T13:00",
                "temperature": 21.4,
                "windspeed": 7.2,
                "winddirection": 180.0,
                "weathercode": 2
            },
            "hourly": {
                "time": ["2024-06-01T13:00", "2024-06-01T14:00"],
                "temperature_2m": [21.4, 22.0],
                "weather_code": [2, 61],
                "precipitation_probability": [5, null],
                "windspeed_10m": [7.2, 8.0],
                "winddirection_10m": [180.0, 190.0]
            },
            "daily": {
                "time": ["2024-06-01", "2024-06-02"],
                "weather_code": [2, 61],
                "temperature_2m_max": [24.0, 19.5],
                "temperature_2m_min": [12.1, 11.0]
            }
        })
    }

    #[tokio::test]
    async fn fetch_processes_full_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("current_weather", "true"))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .mount(&server)
            .await;

        let provider = WeatherProvider::new(10).unwrap().with_base_url(server.uri());
        let report = provider.fetch(48.14, 11.58).await.unwrap();

        let current = report.current.unwrap();
        assert_eq!(current.condition, WeatherCondition::PartlyCloudy);
        assert_eq!(current.description, "Partly Cloudy");

        assert_eq!(report.hourly.len(), 2);
        assert_eq!(report.hourly[0].precipitation_probability, Some(5));
        assert_eq!(report.hourly[1].precipitation_probability, None);
        assert_eq!(report.hourly[1].condition, WeatherCondition::Rain);

        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.daily[1].temp_min, 11.0);
        assert_eq!(report.timezone.as_deref(), Some("Europe/Berlin"));
    }

    #[tokio::test]
    async fn fetch_upstream_error_is_a_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = WeatherProvider::new(10).unwrap().with_base_url(server.uri());
        let result = provider.fetch(0.0, 0.0).await;
        assert!(matches!(result, Err(WeatherError::Request(_))));
    }

    #[test]
    fn process_zips_to_shortest_column() {
        let raw = RawHourly {
            time: vec!["2024-06-01T13:00".into(), "2024-06-01T14:00".into()],
            temperature_2m: vec![Some(21.0)],
            weather_code: vec![Some(0), Some(1)],
            precipitation_probability: vec![Some(0), Some(0)],
            windspeed_10m: vec![Some(5.0), Some(5.0)],
            winddirection_10m: vec![Some(90.0), Some(90.0)],
        };
        assert_eq!(process_hourly(raw).len(), 1);
    }

    #[test]
    fn process_skips_bad_timestamps() {
        let raw = RawHourly {
            time: vec!["not-a-time".into(), "2024-06-01T14:00".into()],
            temperature_2m: vec![Some(21.0), Some(22.0)],
            weather_code: vec![Some(0), Some(1)],
            precipitation_probability: vec![Some(0), Some(0)],
            windspeed_10m: vec![Some(5.0), Some(5.0)],
            winddirection_10m: vec![Some(90.0), Some(90.0)],
        };
        let entries = process_hourly(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].temperature, 22.0);
    }

    #[test]
    fn process_skips_rows_missing_metrics() {
        let raw = RawDaily {
            time: vec!["2024-06-01".into(), "2024-06-02".into()],
            weather_code: vec![Some(0), None],
            temperature_2m_max: vec![Some(20.0), Some(21.0)],
            temperature_2m_min: vec![Some(10.0), Some(11.0)],
        };
        assert_eq!(process_daily(raw).len(), 1);
    }

    #[test]
    fn missing_blocks_yield_empty_report() {
        let raw = RawForecast {
            current_weather: None,
            hourly: None,
            daily: None,
            latitude: None,
            longitude: None,
            timezone: None,
            elevation: None,
        };
        let report = process_forecast(raw);
        assert!(report.current.is_none());
        assert!(report.hourly.is_empty());
        assert!(report.daily.is_empty());
    }
}
