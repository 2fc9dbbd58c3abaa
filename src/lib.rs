//! Trivia API: categories, paginated questions, search and quiz rounds over
//! a SQLite store, served as JSON with axum.

pub mod db;
pub mod pagination;
pub mod quiz;
pub mod server;
pub mod settings;
pub mod telemetry;
