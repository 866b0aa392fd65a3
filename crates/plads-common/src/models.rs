pub mod auth;
pub mod place;
pub mod user;
