use std::{future::Future, sync::Arc};

use sqlx::PgPool;

use crate::{
  config::{AppConfig, JwtConfig},
  domains::{
    destination::{
      client::{destination_overview, DestinationError, DestinationService, HttpDestinationService},
      model::{DestinationOverview, GeocodedLocation},
    },
    trip::{
      model::{CreateTripRequest, Trip, TripListQuery, TripsResponse},
      repository::SqlxTripRepository,
      service::{TripService, TripServiceError, TripServiceImpl},
    },
    user::{
      model::{
        AvatarUpload, LoginRequest, LoginResponse, RegisterUserRequest, UpdateProfileRequest, UserProfile,
        UserWithTrips,
      },
      repository::SqlxUserRepository,
      service::{UserService, UserServiceError, UserServiceImpl},
    },
  },
  storage::ObjectStorage,
  AppError,
};

pub trait AppState: Clone + Send + Sync + 'static {
  fn jwt_secret(&self) -> &str;

  fn register(&self, req: RegisterUserRequest) -> impl Future<Output = Result<UserProfile, UserServiceError>> + Send;
  fn login(&self, req: LoginRequest) -> impl Future<Output = Result<LoginResponse, UserServiceError>> + Send;
  fn get_user_with_trips(&self, user_id: i32) -> impl Future<Output = Result<UserWithTrips, AppError>> + Send;
  fn update_profile(
    &self,
    user_id: i32,
    req: UpdateProfileRequest,
  ) -> impl Future<Output = Result<UserProfile, UserServiceError>> + Send;
  fn replace_avatar(
    &self,
    user_id: i32,
    upload: AvatarUpload,
  ) -> impl Future<Output = Result<UserProfile, UserServiceError>> + Send;

  fn create_trip(
    &self,
    user_id: i32,
    req: CreateTripRequest,
  ) -> impl Future<Output = Result<Trip, TripServiceError>> + Send;
  fn list_trips(
    &self,
    user_id: i32,
    query: TripListQuery,
  ) -> impl Future<Output = Result<TripsResponse, TripServiceError>> + Send;
  fn get_trip(&self, user_id: i32, trip_id: i32) -> impl Future<Output = Result<Trip, TripServiceError>> + Send;
  fn delete_trip(&self, user_id: i32, trip_id: i32) -> impl Future<Output = Result<(), TripServiceError>> + Send;

  fn destination_overview(
    &self,
    name: &str,
  ) -> impl Future<Output = Result<DestinationOverview, DestinationError>> + Send;
  fn geocode(&self, query: &str) -> impl Future<Output = Result<GeocodedLocation, DestinationError>> + Send;
}

#[derive(Clone)]
pub struct SharedAppState {
  pub user_service: Arc<dyn UserService>,
  pub trip_service: Arc<dyn TripService>,
  pub destination_service: Arc<dyn DestinationService>,
  pub jwt: JwtConfig,
}

impl SharedAppState {
  pub fn new(
    pool: PgPool,
    config: &AppConfig,
    storage: Option<Arc<dyn ObjectStorage>>,
    http_client: reqwest::Client,
  ) -> Self {
    let destination_service: Arc<dyn DestinationService> =
      Arc::new(HttpDestinationService::new(http_client, config.apis.clone()));

    let user_repository = SqlxUserRepository::new(pool.clone());
    let user_service = Arc::new(UserServiceImpl::new(user_repository, storage, config.jwt.clone()));

    let trip_repository = SqlxTripRepository::new(pool);
    let trip_service = Arc::new(TripServiceImpl::new(trip_repository, destination_service.clone()));

    Self::from_parts(user_service, trip_service, destination_service, config.jwt.clone())
  }

  pub fn from_parts(
    user_service: Arc<dyn UserService>,
    trip_service: Arc<dyn TripService>,
    destination_service: Arc<dyn DestinationService>,
    jwt: JwtConfig,
  ) -> Self {
    Self {
      user_service,
      trip_service,
      destination_service,
      jwt,
    }
  }
}

impl AppState for SharedAppState {
  fn jwt_secret(&self) -> &str {
    &self.jwt.secret
  }

  async fn register(&self, req: RegisterUserRequest) -> Result<UserProfile, UserServiceError> {
    self.user_service.register(req).await
  }

  async fn login(&self, req: LoginRequest) -> Result<LoginResponse, UserServiceError> {
    self.user_service.login(req).await
  }

  async fn get_user_with_trips(&self, user_id: i32) -> Result<UserWithTrips, AppError> {
    let user = self.user_service.get_profile(user_id).await?;
    let trips = self.trip_service.list_trips(user_id, TripListQuery::default()).await?.trips;

    Ok(UserWithTrips { user, trips })
  }

  async fn update_profile(&self, user_id: i32, req: UpdateProfileRequest) -> Result<UserProfile, UserServiceError> {
    self.user_service.update_profile(user_id, req).await
  }

  async fn replace_avatar(&self, user_id: i32, upload: AvatarUpload) -> Result<UserProfile, UserServiceError> {
    self.user_service.replace_avatar(user_id, upload).await
  }

  async fn create_trip(&self, user_id: i32, req: CreateTripRequest) -> Result<Trip, TripServiceError> {
    self.trip_service.create_trip(user_id, req).await
  }

  async fn list_trips(&self, user_id: i32, query: TripListQuery) -> Result<TripsResponse, TripServiceError> {
    self.trip_service.list_trips(user_id, query).await
  }

  async fn get_trip(&self, user_id: i32, trip_id: i32) -> Result<Trip, TripServiceError> {
    self.trip_service.get_trip(user_id, trip_id).await
  }

  async fn delete_trip(&self, user_id: i32, trip_id: i32) -> Result<(), TripServiceError> {
    self.trip_service.delete_trip(user_id, trip_id).await
  }

  async fn destination_overview(&self, name: &str) -> Result<DestinationOverview, DestinationError> {
    destination_overview(self.destination_service.as_ref(), name).await
  }

  async fn geocode(&self, query: &str) -> Result<GeocodedLocation, DestinationError> {
    self.destination_service.geocode(query).await
  }
}
