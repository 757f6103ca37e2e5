pub mod comment;
pub mod connection;
pub mod event;
pub mod group;
pub mod message;
pub mod notification;
pub mod user;

pub use comment::{Comment, CommentTarget, Like};
pub use connection::{ConnectionRequest, Decision, RequestStatus};
pub use event::{Attendance, Event, NewEvent, PriceBand, Reservation};
pub use group::{Group, NewGroup};
pub use message::Message;
pub use notification::{NewNotification, Notification, NotificationKind};
pub use user::{ProfileUpdate, User, UserProfile, UserRole, UserSummary, Visibility};
