use crate::domain::app::App;
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(FromRow)]
pub struct AppRecord {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) secret: String,
    pub(crate) link: String,
    pub(crate) enabled: bool,
    pub(crate) created_at: OffsetDateTime,
}

impl std::fmt::Debug for AppRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRecord").field("id", &self.id).field("name", &self.name).finish_non_exhaustive()
    }
}

impl From<AppRecord> for App {
    fn from(record: AppRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            secret: record.secret,
            link: record.link,
            enabled: record.enabled,
            created_at: record.created_at,
        }
    }
}
