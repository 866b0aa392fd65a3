pub mod auth;
pub mod config;
pub mod error;
pub mod geocode;
pub mod images;
pub mod state;
pub mod web;
