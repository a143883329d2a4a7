use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
  body::{Body, Bytes},
  http::{header, Request, StatusCode},
  Router,
};
use chrono::Utc;
use serde::Serialize;
use tower::ServiceExt;

use crate::{
  app::create_app,
  config::JwtConfig,
  db::RepositoryError,
  domains::{
    destination::{
      client::{DestinationError, DestinationService},
      model::{CountryInfo, DailyTemperature, Forecast, GeocodedLocation},
    },
    trip::{
      model::{CreateTripRequest, NewTrip, Trip},
      repository::{CreateOutcome, TripRepository},
      service::TripServiceImpl,
      validation::validate,
    },
    user::{
      model::{LoginRequest, NewUser, RegisterUserRequest, UpdateProfileRequest, User},
      repository::UserRepository,
      service::UserServiceImpl,
    },
  },
  state::{AppState, SharedAppState},
  storage::ObjectStorage,
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

/// Smallest valid PNG header. Content is never decoded.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

const MULTIPART_BOUNDARY: &str = "trip-planner-test-boundary";
const MEMORY_URL_PREFIX: &str = "memory://";

#[derive(Default)]
pub struct InMemoryUserRepository {
  users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
  async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
    let mut users = self.users.lock().unwrap();
    if users.iter().any(|u| u.email == new_user.email) {
      return Err(RepositoryError::Conflict("Email already registered".to_string()));
    }

    let user = User {
      id: users.len() as i32 + 1,
      email: new_user.email.clone(),
      password: new_user.password_hash.clone(),
      fullname: new_user.fullname.clone(),
      sex: new_user.sex.clone(),
      country: new_user.country.clone(),
      avatar: new_user.avatar.clone(),
      created_at: Utc::now(),
    };
    users.push(user.clone());
    Ok(user)
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
    Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
  }

  async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepositoryError> {
    Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
  }

  async fn update_profile(&self, id: i32, changes: &UpdateProfileRequest) -> Result<Option<User>, RepositoryError> {
    let mut users = self.users.lock().unwrap();
    let Some(user) = users.iter_mut().find(|u| u.id == id) else {
      return Ok(None);
    };

    if let Some(fullname) = &changes.fullname {
      user.fullname = fullname.clone();
    }
    if changes.sex.is_some() {
      user.sex = changes.sex.clone();
    }
    if changes.country.is_some() {
      user.country = changes.country.clone();
    }
    if changes.avatar.is_some() {
      user.avatar = changes.avatar.clone();
    }
    Ok(Some(user.clone()))
  }

  async fn set_avatar(&self, id: i32, avatar_url: &str) -> Result<Option<User>, RepositoryError> {
    let mut users = self.users.lock().unwrap();
    Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
      user.avatar = Some(avatar_url.to_string());
      user.clone()
    }))
  }
}

/// Holds the lock across the overlap check and the insert, like the row lock in Postgres.
#[derive(Default)]
pub struct InMemoryTripRepository {
  trips: Mutex<Vec<Trip>>,
  next_id: Mutex<i32>,
}

#[async_trait]
impl TripRepository for InMemoryTripRepository {
  async fn create_unless_overlapping(&self, user_id: i32, trip: &NewTrip) -> Result<CreateOutcome, RepositoryError> {
    let mut trips = self.trips.lock().unwrap();
    let owned: Vec<Trip> = trips.iter().filter(|t| t.user_id == user_id).cloned().collect();

    if let Err(rejection) = validate(&trip.range, &owned) {
      return Ok(CreateOutcome::Rejected(rejection));
    }

    let mut next_id = self.next_id.lock().unwrap();
    *next_id += 1;
    let created = Trip {
      id: *next_id,
      user_id,
      location: trip.location.clone(),
      start_date: trip.range.start,
      end_date: trip.range.end,
      weather_summary: trip.weather_summary.clone(),
      created_at: Utc::now(),
    };
    trips.push(created.clone());
    Ok(CreateOutcome::Created(created))
  }

  async fn find_by_user(&self, user_id: i32) -> Result<Vec<Trip>, RepositoryError> {
    let trips = self.trips.lock().unwrap();
    Ok(trips.iter().filter(|t| t.user_id == user_id).cloned().collect())
  }

  async fn find_by_id_for_user(&self, trip_id: i32, user_id: i32) -> Result<Option<Trip>, RepositoryError> {
    let trips = self.trips.lock().unwrap();
    Ok(trips.iter().find(|t| t.id == trip_id && t.user_id == user_id).cloned())
  }

  async fn delete_for_user(&self, trip_id: i32, user_id: i32) -> Result<bool, RepositoryError> {
    let mut trips = self.trips.lock().unwrap();
    let before = trips.len();
    trips.retain(|t| !(t.id == trip_id && t.user_id == user_id));
    Ok(trips.len() < before)
  }
}

#[derive(Default)]
pub struct MemoryStorage {
  objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
  /// Stores a placeholder object and returns its URL.
  pub fn seed(&self, key: &str) -> String {
    self.objects.lock().unwrap().insert(key.to_string(), PNG_BYTES.to_vec());
    format!("{}{}", MEMORY_URL_PREFIX, key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.objects.lock().unwrap().contains_key(key)
  }

  pub fn object_count(&self) -> usize {
    self.objects.lock().unwrap().len()
  }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
  async fn upload_file(&self, key: &str, data: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
    self.objects.lock().unwrap().insert(key.to_string(), data);
    Ok(format!("{}{}", MEMORY_URL_PREFIX, key))
  }

  async fn delete_file(&self, key: &str) -> anyhow::Result<()> {
    self.objects.lock().unwrap().remove(key);
    Ok(())
  }

  fn extract_key_from_url(&self, url: &str) -> Option<String> {
    url.strip_prefix(MEMORY_URL_PREFIX).map(str::to_string)
  }
}

/// Canned answers for a handful of countries. Geocoding echoes the query back.
#[derive(Default)]
pub struct FakeDestinationService {
  pub current_temperature: Option<f64>,
  pub fail_upstream: bool,
  pub fail_forecast: bool,
}

const KNOWN_COUNTRIES: &[(&str, &str, f64, f64)] = &[
  ("Portugal", "Lisbon", 39.5, -8.0),
  ("United Kingdom", "London", 54.0, -2.0),
  ("Japan", "Tokyo", 36.0, 138.0),
  ("Norway", "Oslo", 62.0, 10.0),
];

#[async_trait]
impl DestinationService for FakeDestinationService {
  async fn country(&self, name: &str) -> Result<CountryInfo, DestinationError> {
    if self.fail_upstream {
      return Err(DestinationError::Upstream("countries API unreachable".to_string()));
    }

    KNOWN_COUNTRIES
      .iter()
      .find(|(country, ..)| country.eq_ignore_ascii_case(name.trim()))
      .map(|(country, capital, lat, lon)| CountryInfo {
        name: country.to_string(),
        capital: Some(capital.to_string()),
        population: 1_000_000,
        timezone: "UTC".to_string(),
        flag: String::new(),
        lat: Some(*lat),
        lon: Some(*lon),
      })
      .ok_or_else(|| DestinationError::NotFound("Country not found".to_string()))
  }

  async fn forecast(&self, _lat: f64, _lon: f64) -> Result<Forecast, DestinationError> {
    if self.fail_upstream || self.fail_forecast {
      return Err(DestinationError::Upstream("weather API unreachable".to_string()));
    }

    Ok(Forecast {
      current_temperature: self.current_temperature,
      current_windspeed: None,
      daily: vec![DailyTemperature {
        date: "2030-01-01".to_string(),
        max: 20.0,
        min: 10.0,
      }],
      average_temperature: Some(15),
    })
  }

  async fn geocode(&self, query: &str) -> Result<GeocodedLocation, DestinationError> {
    if self.fail_upstream {
      return Err(DestinationError::Upstream("geocoding API unreachable".to_string()));
    }
    if query.trim().is_empty() {
      return Err(DestinationError::NotFound("Location not found".to_string()));
    }

    Ok(GeocodedLocation {
      lat: 0.0,
      lon: 0.0,
      display_name: query.trim().to_string(),
    })
  }
}

/// Application wired to in-memory repositories and fakes.
pub struct TestApp {
  pub state: SharedAppState,
  pub storage: Arc<MemoryStorage>,
}

impl TestApp {
  pub fn new() -> Self {
    Self::build(FakeDestinationService::default(), true)
  }

  pub fn without_storage() -> Self {
    Self::build(FakeDestinationService::default(), false)
  }

  pub fn with_failing_upstream() -> Self {
    let destinations = FakeDestinationService {
      fail_upstream: true,
      ..FakeDestinationService::default()
    };
    Self::build(destinations, true)
  }

  fn build(destinations: FakeDestinationService, with_storage: bool) -> Self {
    let jwt = JwtConfig {
      secret: TEST_JWT_SECRET.to_string(),
      ttl_hours: 1,
    };
    let storage = Arc::new(MemoryStorage::default());
    let destinations: Arc<dyn DestinationService> = Arc::new(destinations);

    let object_storage = with_storage.then(|| storage.clone() as Arc<dyn ObjectStorage>);
    let user_service = Arc::new(UserServiceImpl::new(
      InMemoryUserRepository::default(),
      object_storage,
      jwt.clone(),
    ));
    let trip_service = Arc::new(TripServiceImpl::new(
      InMemoryTripRepository::default(),
      destinations.clone(),
    ));

    Self {
      state: SharedAppState::from_parts(user_service, trip_service, destinations, jwt),
      storage,
    }
  }

  pub fn router(&self) -> Router {
    create_app(self.state.clone())
  }

  /// Registers a user named "Test User" and returns a bearer token for it.
  pub async fn register_user(&self, email: &str, password: &str) -> String {
    self
      .state
      .register(RegisterUserRequest {
        email: email.to_string(),
        fullname: "Test User".to_string(),
        password: password.to_string(),
        ..RegisterUserRequest::default()
      })
      .await
      .expect("register test user");

    self
      .state
      .login(LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
      })
      .await
      .expect("log in test user")
      .token
  }

  pub async fn create_trip(&self, token: &str, location: &str, start: &str, end: &str) -> Trip {
    let body = CreateTripRequest {
      location: Some(location.to_string()),
      start_date: Some(start.to_string()),
      end_date: Some(end.to_string()),
      weather_summary: None,
    };
    let (status, bytes) = post_json_with_token(self.router(), "/api/v1/trips", token, &body).await;
    assert_eq!(status, StatusCode::CREATED, "{}", String::from_utf8_lossy(&bytes));
    serde_json::from_slice(&bytes).expect("deserialize trip")
  }
}

pub enum FormPart<'a> {
  Text {
    name: &'a str,
    value: &'a str,
  },
  File {
    name: &'a str,
    file_name: &'a str,
    content_type: &'a str,
    data: &'a [u8],
  },
}

impl<'a> FormPart<'a> {
  pub fn text(name: &'a str, value: &'a str) -> Self {
    FormPart::Text { name, value }
  }

  pub fn file(name: &'a str, file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
    FormPart::File {
      name,
      file_name,
      content_type,
      data,
    }
  }
}

fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
  let mut body = Vec::new();
  for part in parts {
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    match part {
      FormPart::Text { name, value } => {
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
        body.extend_from_slice(value.as_bytes());
      }
      FormPart::File {
        name,
        file_name,
        content_type,
        data,
      } => {
        body.extend_from_slice(
          format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            name, file_name, content_type
          )
          .as_bytes(),
        );
        body.extend_from_slice(data);
      }
    }
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
  body
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Bytes) {
  let response = app.oneshot(request).await.expect("handle request");
  let status = response.status();
  let body = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .expect("read response body");
  (status, body)
}

fn bearer(token: &str) -> String {
  format!("Bearer {}", token)
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Bytes) {
  let request = Request::builder()
    .method("GET")
    .uri(uri)
    .body(Body::empty())
    .expect("build request");
  send(app, request).await
}

pub async fn get_with_token(app: Router, uri: &str, token: &str) -> (StatusCode, Bytes) {
  let request = Request::builder()
    .method("GET")
    .uri(uri)
    .header(header::AUTHORIZATION, bearer(token))
    .body(Body::empty())
    .expect("build request");
  send(app, request).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> (StatusCode, Bytes) {
  let request = Request::builder()
    .method("DELETE")
    .uri(uri)
    .header(header::AUTHORIZATION, bearer(token))
    .body(Body::empty())
    .expect("build request");
  send(app, request).await
}

pub async fn post_json<T: Serialize>(app: Router, uri: &str, body: &T) -> (StatusCode, Bytes) {
  let request = Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(serde_json::to_vec(body).expect("serialize request body")))
    .expect("build request");
  send(app, request).await
}

pub async fn post_json_with_token<T: Serialize>(app: Router, uri: &str, token: &str, body: &T) -> (StatusCode, Bytes) {
  let request = Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .header(header::AUTHORIZATION, bearer(token))
    .body(Body::from(serde_json::to_vec(body).expect("serialize request body")))
    .expect("build request");
  send(app, request).await
}

pub async fn patch_json<T: Serialize>(app: Router, uri: &str, token: &str, body: &T) -> (StatusCode, Bytes) {
  let request = Request::builder()
    .method("PATCH")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .header(header::AUTHORIZATION, bearer(token))
    .body(Body::from(serde_json::to_vec(body).expect("serialize request body")))
    .expect("build request");
  send(app, request).await
}

pub async fn post_multipart(
  app: Router,
  uri: &str,
  token: Option<&str>,
  parts: &[FormPart<'_>],
) -> (StatusCode, Bytes) {
  let mut builder = Request::builder().method("POST").uri(uri).header(
    header::CONTENT_TYPE,
    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
  );
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, bearer(token));
  }

  let request = builder.body(Body::from(multipart_body(parts))).expect("build request");
  send(app, request).await
}
