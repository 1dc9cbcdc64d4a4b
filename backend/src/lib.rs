pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod query;
pub mod routes;
pub mod services;
pub mod state;
pub mod status;
pub mod validation;
