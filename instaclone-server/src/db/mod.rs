pub mod schema;
pub mod connection;
pub mod query;
pub mod repositories;

pub use connection::{Database, DbConnection, DbPool};
