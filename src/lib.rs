pub mod api;
pub mod config;
pub mod db;
pub mod import_error;
pub mod importers;
pub mod models;
pub mod processing;
pub mod services;
pub mod validation;
