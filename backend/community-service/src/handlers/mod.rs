pub mod auth;
pub mod comments;
pub mod connections;
pub mod events;
pub mod groups;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod payments;
pub mod users;

use serde::Deserialize;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// `(limit, offset)` clamped to sane bounds
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}
