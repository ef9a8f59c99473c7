#![doc = "The `task_manager` library crate."]
#![doc = ""]
#![doc = "Domain models, repositories, services, token security and HTTP routes for the"]
#![doc = "task manager. The binary (`main.rs`) only loads configuration, picks a store and"]
#![doc = "runs the server built from [`app::AppState`]."]

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod security;
pub mod services;

pub use app::AppState;
pub use config::Config;
pub use error::AppError;
