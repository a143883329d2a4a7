pub mod destination;
pub mod trip;
pub mod user;
