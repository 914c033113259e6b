pub mod app;
pub mod refresh_token;
pub mod user;

pub use app::AppRecord;
pub use refresh_token::RefreshTokenRecord;
pub use user::{AppUserRecord, UserRecord};
