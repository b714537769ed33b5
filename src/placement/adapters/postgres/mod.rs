//! `PostgreSQL` adapters for placement workflow persistence.

mod models;
mod schema;
mod store;


pub use store::{PlacementPgPool, PostgresPlacementStore};
