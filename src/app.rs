use std::time::Duration;

use axum::{
  extract::DefaultBodyLimit,
  http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
  },
  routing::get,
  Router,
};
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

use crate::{
  domains::{destination::rest::destination_routes, trip::rest::trip_routes, user::rest::user_routes},
  state::SharedAppState,
};

/// Room for a 5 MB avatar plus the other multipart fields.
const BODY_LIMIT_BYTES: usize = 6 * 1024 * 1024;

pub fn create_app(state: SharedAppState) -> Router {
  Router::new()
    .route("/", get(health_handler))
    .nest(
      "/api/v1",
      user_routes().merge(trip_routes()).merge(destination_routes()),
    )
    .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

pub async fn health_handler() -> &'static str {
  "Trip planner API is running"
}

/// CORS for the browser client. Without a configured origin any origin is allowed.
pub fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
  let origin = match allowed_origin {
    Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin)?),
    None => AllowOrigin::any(),
  };

  Ok(
    CorsLayer::new()
      .allow_origin(origin)
      .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
      .allow_headers([CONTENT_TYPE, AUTHORIZATION])
      .max_age(Duration::from_secs(60 * 60)),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{get, TestApp};
  use axum::http::StatusCode;

  #[tokio::test]
  async fn health_check() {
    let app = TestApp::new();
    let (status, body) = get(app.router(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"Trip planner API is running");
  }

  #[tokio::test]
  async fn unknown_route_is_not_found() {
    let app = TestApp::new();
    let (status, _) = get(app.router(), "/api/v1/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[test]
  fn cors_layer_rejects_invalid_origin() {
    assert!(cors_layer(Some("https://planner.example.com")).is_ok());
    assert!(cors_layer(None).is_ok());
    assert!(cors_layer(Some("bad\norigin")).is_err());
  }
}
