pub mod analytics;
pub mod assets;
pub mod config;
pub mod database;
pub mod errors;
pub mod history;
pub mod ingestor;
pub mod models;
pub mod sources;
pub mod utils;
pub mod web;
