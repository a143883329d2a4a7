use std::error::Error;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use super::model::{
  CountryInfo, DestinationOverview, Forecast, GeocodedLocation, NominatimPlace, OpenMeteoResponse, RestCountry,
};
use crate::config::ExternalApiConfig;

pub const WEATHER_UNAVAILABLE: &str = "Unavailable";

#[derive(Debug)]
pub enum DestinationError {
  NotFound(String),
  Upstream(String),
}

impl Error for DestinationError {}

impl std::fmt::Display for DestinationError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      DestinationError::NotFound(msg) => write!(f, "Not Found: {}", msg),
      DestinationError::Upstream(msg) => write!(f, "Upstream Error: {}", msg),
    }
  }
}

impl From<reqwest::Error> for DestinationError {
  fn from(err: reqwest::Error) -> Self {
    DestinationError::Upstream(err.to_string())
  }
}

/// Country, weather and geocoding lookups against public APIs.
#[async_trait]
pub trait DestinationService: Send + Sync {
  async fn country(&self, name: &str) -> Result<CountryInfo, DestinationError>;
  async fn forecast(&self, lat: f64, lon: f64) -> Result<Forecast, DestinationError>;
  async fn geocode(&self, query: &str) -> Result<GeocodedLocation, DestinationError>;
}

/// Country details plus its forecast. A missing forecast does not fail the lookup.
pub async fn destination_overview(
  service: &dyn DestinationService,
  name: &str,
) -> Result<DestinationOverview, DestinationError> {
  let country = service.country(name).await?;

  let weather = match country.coordinates() {
    Some((lat, lon)) => match service.forecast(lat, lon).await {
      Ok(forecast) => Some(forecast),
      Err(e) => {
        tracing::warn!(country = %country.name, "Forecast lookup failed: {}", e);
        None
      }
    },
    None => None,
  };

  Ok(DestinationOverview { country, weather })
}

/// Current temperature at `location`, formatted for storage on a trip.
/// Never fails: any lookup error yields [`WEATHER_UNAVAILABLE`].
pub async fn weather_snapshot(service: &dyn DestinationService, location: &str) -> String {
  let lookup = async {
    let place = service.geocode(location).await?;
    service.forecast(place.lat, place.lon).await
  };

  match lookup.await {
    Ok(Forecast {
      current_temperature: Some(temperature),
      ..
    }) => format!("{:.1}°C", temperature),
    Ok(_) => WEATHER_UNAVAILABLE.to_string(),
    Err(e) => {
      tracing::warn!(%location, "Weather snapshot failed: {}", e);
      WEATHER_UNAVAILABLE.to_string()
    }
  }
}

pub struct HttpDestinationService {
  client: reqwest::Client,
  config: ExternalApiConfig,
}

impl HttpDestinationService {
  pub fn new(client: reqwest::Client, config: ExternalApiConfig) -> Self {
    Self { client, config }
  }

  pub fn build_client(config: &ExternalApiConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
      .timeout(config.timeout)
      .user_agent(config.user_agent.clone())
      .build()
  }
}

/// Appends path segments to `base`, percent-encoding each one.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, DestinationError> {
  let mut url = Url::parse(base).map_err(|e| DestinationError::Upstream(format!("Invalid API URL {}: {}", base, e)))?;
  url
    .path_segments_mut()
    .map_err(|_| DestinationError::Upstream(format!("API URL cannot be a base: {}", base)))?
    .pop_if_empty()
    .extend(segments);
  Ok(url)
}

#[async_trait]
impl DestinationService for HttpDestinationService {
  async fn country(&self, name: &str) -> Result<CountryInfo, DestinationError> {
    let name = name.trim();
    if name.is_empty() {
      return Err(DestinationError::NotFound("Country not found".to_string()));
    }

    let url = endpoint(&self.config.countries_url, &["name", name])?;
    tracing::debug!(%url, "Fetching country");

    let response = self.client.get(url).send().await?;
    if response.status() == StatusCode::NOT_FOUND {
      return Err(DestinationError::NotFound("Country not found".to_string()));
    }

    let countries: Vec<RestCountry> = response.error_for_status()?.json().await?;
    countries
      .into_iter()
      .next()
      .map(CountryInfo::from)
      .ok_or_else(|| DestinationError::NotFound("Country not found".to_string()))
  }

  async fn forecast(&self, lat: f64, lon: f64) -> Result<Forecast, DestinationError> {
    let url = endpoint(&self.config.weather_url, &["forecast"])?;

    let response: OpenMeteoResponse = self
      .client
      .get(url)
      .query(&[
        ("latitude", lat.to_string()),
        ("longitude", lon.to_string()),
        ("daily", "temperature_2m_max,temperature_2m_min".to_string()),
        ("current_weather", "true".to_string()),
        ("timezone", "auto".to_string()),
      ])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    Ok(response.into())
  }

  async fn geocode(&self, query: &str) -> Result<GeocodedLocation, DestinationError> {
    let query = query.trim();
    if query.is_empty() {
      return Err(DestinationError::NotFound("Location not found".to_string()));
    }

    let url = endpoint(&self.config.geocoding_url, &["search"])?;

    let places: Vec<NominatimPlace> = self
      .client
      .get(url)
      .query(&[("format", "json"), ("limit", "1"), ("q", query)])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    places
      .into_iter()
      .find_map(NominatimPlace::into_location)
      .ok_or_else(|| DestinationError::NotFound("Location not found".to_string()))
  }
}
