//! SQLite storage implementation for platform connections.

mod model;
mod repository;

pub use model::PlatformConnectionDB;
pub use repository::ConnectionRepository;
