pub mod connection;
pub mod entities;
pub mod schema;
pub mod services;
