pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod normalizer;
pub mod service;
pub mod store;
