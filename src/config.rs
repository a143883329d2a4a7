use std::{env, fmt, time::Duration};

use anyhow::{anyhow, Context, Result};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";
const DEFAULT_COUNTRIES_API_URL: &str = "https://restcountries.com/v3.1";
const DEFAULT_WEATHER_API_URL: &str = "https://api.open-meteo.com/v1";
const DEFAULT_GEOCODING_API_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  pub database_max_connections: u32,
  pub bind_address: String,
  pub jwt: JwtConfig,
  pub cors_allowed_origin: Option<String>,
  pub apis: ExternalApiConfig,
  pub s3: Option<S3Config>,
}

#[derive(Clone)]
pub struct JwtConfig {
  pub secret: String,
  pub ttl_hours: i64,
}

impl fmt::Debug for JwtConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JwtConfig")
      .field("secret", &"<redacted>")
      .field("ttl_hours", &self.ttl_hours)
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct ExternalApiConfig {
  pub countries_url: String,
  pub weather_url: String,
  pub geocoding_url: String,
  pub timeout: Duration,
  pub user_agent: String,
}

impl Default for ExternalApiConfig {
  fn default() -> Self {
    Self {
      countries_url: DEFAULT_COUNTRIES_API_URL.to_string(),
      weather_url: DEFAULT_WEATHER_API_URL.to_string(),
      geocoding_url: DEFAULT_GEOCODING_API_URL.to_string(),
      timeout: Duration::from_secs(10),
      user_agent: format!("trip-planner-api/{}", env!("CARGO_PKG_VERSION")),
    }
  }
}

#[derive(Clone)]
pub struct S3Config {
  pub bucket: String,
  pub access_key: String,
  pub secret_key: String,
  pub region: String,
  pub endpoint: Option<String>,
  pub public_endpoint: Option<String>,
}

impl fmt::Debug for S3Config {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("S3Config")
      .field("bucket", &self.bucket)
      .field("region", &self.region)
      .field("endpoint", &self.endpoint)
      .field("public_endpoint", &self.public_endpoint)
      .finish_non_exhaustive()
  }
}

impl AppConfig {
  /// Reads the configuration from the process environment.
  ///
  /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let required = |key: &str| get(key).ok_or_else(|| anyhow!("{} environment variable must be set", key));

    let defaults = ExternalApiConfig::default();
    let timeout_secs: u64 = parse_or(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", 10)?;

    let apis = ExternalApiConfig {
      countries_url: get("COUNTRIES_API_URL").unwrap_or(defaults.countries_url),
      weather_url: get("WEATHER_API_URL").unwrap_or(defaults.weather_url),
      geocoding_url: get("GEOCODING_API_URL").unwrap_or(defaults.geocoding_url),
      timeout: Duration::from_secs(timeout_secs),
      user_agent: defaults.user_agent,
    };

    let s3 = match get("S3_BUCKET") {
      Some(bucket) => Some(S3Config {
        bucket,
        access_key: required("S3_ACCESS_KEY").context("S3_BUCKET is set")?,
        secret_key: required("S3_SECRET_KEY").context("S3_BUCKET is set")?,
        region: get("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        endpoint: get("S3_ENDPOINT"),
        public_endpoint: get("S3_PUBLIC_ENDPOINT"),
      }),
      None => None,
    };

    Ok(Self {
      database_url: required("DATABASE_URL")?,
      database_max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
      bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
      jwt: JwtConfig {
        secret: required("JWT_SECRET")?,
        ttl_hours: parse_or(get("JWT_TTL_HOURS"), "JWT_TTL_HOURS", 24)?,
      },
      cors_allowed_origin: get("CORS_ALLOWED_ORIGIN"),
      apis,
      s3,
    })
  }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
  T: std::str::FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  match value {
    Some(raw) => raw
      .trim()
      .parse()
      .with_context(|| format!("{} has an invalid value: {}", key, raw)),
    None => Ok(default),
  }
}
