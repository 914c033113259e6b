pub mod app;
pub mod auth_session;
pub mod claims;
pub mod refresh_token;
pub mod user;

pub type UserId = i64;
pub type AppId = i64;
