mod connections;
mod events;
mod groups;
mod notifications;
mod users;

pub use connections::PgConnectionRepository;
pub use events::PgEventRepository;
pub use groups::PgGroupRepository;
pub use notifications::PgNotificationRepository;
pub use users::PgUserRepository;

/// Columns selected whenever a `UserSummary` is built from `users u`
pub(crate) const USER_SUMMARY_COLUMNS: &str = "u.id, u.username, u.first_name, u.last_name, u.avatar_url";
