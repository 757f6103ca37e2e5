//! Business logic. The four core managers (attendance, connections,
//! notifications, groups) depend only on repository traits; the remaining
//! services query PostgreSQL through `crate::db` directly.

pub mod attendance;
pub mod auth;
pub mod comments;
pub mod connections;
pub mod events;
pub mod groups;
pub mod messaging;
pub mod notifications;
pub mod oauth;
pub mod payments;
pub mod profiles;

pub use attendance::AttendanceManager;
pub use auth::AuthService;
pub use comments::CommentService;
pub use connections::ConnectionWorkflow;
pub use events::EventCatalog;
pub use groups::GroupMembership;
pub use messaging::MessagingService;
pub use notifications::NotificationDispatcher;
pub use oauth::GoogleOAuth;
pub use payments::{PaymentGateway, PaymentService, StripeGateway};
pub use profiles::ProfileService;
