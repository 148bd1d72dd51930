use std::sync::Arc;

use sea_orm::DatabaseConnection;
use skycast_core::Config;
use skycast_geo::GeoClient;
use skycast_weather::WeatherProvider;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub geo: GeoClient,
    pub weather: WeatherProvider,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the upstream clients from config.
    ///
    /// The database connection is established by the caller so tests can
    /// inject their own.
    pub fn new(db: DatabaseConnection, config: Config) -> anyhow::Result<Self> {
        let geo = GeoClient::new(config.geocoding.timeout_secs)?
            .with_base_url(config.geocoding.base_url.clone());
        let weather = WeatherProvider::new(config.weather.timeout_secs)?
            .with_base_url(config.weather.base_url.clone());

        Ok(Self {
            db,
            geo,
            weather,
            config: Arc::new(config),
        })
    }
}
