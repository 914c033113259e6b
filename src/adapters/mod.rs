pub mod database;
pub mod memory;
pub mod store;

pub use store::{CredentialStore, RefreshTokenStore};
