#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Shared code of the two `taskboard` services: the authentication service"]
#![doc = "(signup, login, email verification, token introspection) and the task"]
#![doc = "service (task CRUD with tag filtering), which delegates identity checks to"]
#![doc = "the authentication service over HTTP. Each binary under `src/bin` wires"]
#![doc = "these modules into one actix-web application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use error::AppError;
