use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryInfo {
  pub name: String,
  pub capital: Option<String>,
  pub population: u64,
  pub timezone: String,
  pub flag: String,
  pub lat: Option<f64>,
  pub lon: Option<f64>,
}

impl CountryInfo {
  pub fn coordinates(&self) -> Option<(f64, f64)> {
    self.lat.zip(self.lon)
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTemperature {
  pub date: String,
  pub max: f64,
  pub min: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
  pub current_temperature: Option<f64>,
  pub current_windspeed: Option<f64>,
  pub daily: Vec<DailyTemperature>,
  /// Rounded mean of the daily `(max + min) / 2` midpoints.
  pub average_temperature: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationOverview {
  pub country: CountryInfo,
  pub weather: Option<Forecast>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedLocation {
  pub lat: f64,
  pub lon: f64,
  pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeQuery {
  pub q: String,
}

// Upstream payloads. Only the fields we read are declared.

#[derive(Debug, Deserialize)]
pub(crate) struct RestCountry {
  pub name: RestCountryName,
  #[serde(default)]
  pub capital: Vec<String>,
  #[serde(default)]
  pub population: u64,
  #[serde(default)]
  pub timezones: Vec<String>,
  pub flags: Option<RestCountryFlags>,
  #[serde(default)]
  pub latlng: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestCountryName {
  pub common: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestCountryFlags {
  pub png: Option<String>,
}

impl From<RestCountry> for CountryInfo {
  fn from(country: RestCountry) -> Self {
    Self {
      name: country.name.common,
      capital: country.capital.into_iter().next(),
      population: country.population,
      timezone: country.timezones.into_iter().next().unwrap_or_else(|| "N/A".to_string()),
      flag: country.flags.and_then(|flags| flags.png).unwrap_or_default(),
      lat: country.latlng.first().copied(),
      lon: country.latlng.get(1).copied(),
    }
  }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenMeteoResponse {
  pub current_weather: Option<OpenMeteoCurrent>,
  pub daily: Option<OpenMeteoDaily>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenMeteoCurrent {
  pub temperature: Option<f64>,
  pub windspeed: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenMeteoDaily {
  #[serde(default)]
  pub time: Vec<String>,
  #[serde(default)]
  pub temperature_2m_max: Vec<Option<f64>>,
  #[serde(default)]
  pub temperature_2m_min: Vec<Option<f64>>,
}

impl From<OpenMeteoResponse> for Forecast {
  fn from(response: OpenMeteoResponse) -> Self {
    let daily: Vec<DailyTemperature> = response
      .daily
      .map(|daily| {
        daily
          .time
          .into_iter()
          .zip(daily.temperature_2m_max)
          .zip(daily.temperature_2m_min)
          .filter_map(|((date, max), min)| Some(DailyTemperature { date, max: max?, min: min? }))
          .collect()
      })
      .unwrap_or_default();

    let average_temperature = if daily.is_empty() {
      None
    } else {
      let total: f64 = daily.iter().map(|day| (day.max + day.min) / 2.0).sum();
      Some((total / daily.len() as f64).round() as i64)
    };

    Self {
      current_temperature: response.current_weather.as_ref().and_then(|c| c.temperature),
      current_windspeed: response.current_weather.as_ref().and_then(|c| c.windspeed),
      daily,
      average_temperature,
    }
  }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NominatimPlace {
  pub lat: String,
  pub lon: String,
  #[serde(default)]
  pub display_name: String,
}

impl NominatimPlace {
  pub fn into_location(self) -> Option<GeocodedLocation> {
    Some(GeocodedLocation {
      lat: self.lat.trim().parse().ok()?,
      lon: self.lon.trim().parse().ok()?,
      display_name: self.display_name,
    })
  }
}
