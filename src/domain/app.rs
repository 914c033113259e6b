use super::AppId;
use time::OffsetDateTime;

/// A registered client application. `secret` keys every access token minted for it.
#[derive(Clone)]
pub struct App {
    pub id: AppId,
    pub name: String,
    pub secret: String,
    pub link: String,
    pub enabled: bool,
    pub created_at: OffsetDateTime,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("link", &self.link)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct NewApp {
    pub name: String,
    pub secret: String,
    pub link: String,
}

impl std::fmt::Debug for NewApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewApp").field("name", &self.name).field("link", &self.link).finish_non_exhaustive()
    }
}

/// Rename or relink an app; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct AppUpdate {
    pub name: Option<String>,
    pub link: Option<String>,
}

impl AppUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.link.is_none()
    }
}
