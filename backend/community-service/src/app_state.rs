use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::repository::Repositories;
use crate::security::JwtKeys;
use crate::services::{
    AttendanceManager, AuthService, CommentService, ConnectionWorkflow, EventCatalog,
    GoogleOAuth, GroupMembership, MessagingService, NotificationDispatcher, PaymentGateway,
    PaymentService, ProfileService,
};
use crate::websocket::{LivePush, SocketRegistry};

/// Shared state handed to every handler through `web::Data`
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: PgPool,
    pub keys: JwtKeys,
    pub attendance: AttendanceManager,
    pub connections: ConnectionWorkflow,
    pub notifications: NotificationDispatcher,
    pub groups: GroupMembership,
    pub events: EventCatalog,
    pub auth: AuthService,
    pub oauth: Option<GoogleOAuth>,
    pub comments: CommentService,
    pub messaging: MessagingService,
    pub payments: PaymentService,
    pub profiles: ProfileService,
    /// Sockets on `/ws/notifications`
    pub notification_sockets: SocketRegistry,
    /// Sockets on `/ws/chat`
    pub chat_sockets: SocketRegistry,
}

/// Transport pieces chosen at startup
pub struct Transports {
    /// Where notification pushes go: the local registry, or Redis fan-out
    pub live: Arc<dyn LivePush>,
    pub notification_sockets: SocketRegistry,
    pub chat_sockets: SocketRegistry,
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(config: Config, db: PgPool, repos: Repositories, transports: Transports) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);

        let notifications = NotificationDispatcher::new(
            repos.notifications.clone(),
            repos.users.clone(),
            repos.events.clone(),
            transports.live,
        );
        let attendance = AttendanceManager::new(repos.events.clone(), repos.users.clone());
        let connections = ConnectionWorkflow::new(
            repos.connections.clone(),
            repos.users.clone(),
            notifications.clone(),
        );
        let groups = GroupMembership::new(repos.groups.clone(), repos.users.clone());
        let events = EventCatalog::new(repos.events.clone(), repos.groups.clone());
        let payments = PaymentService::new(
            transports.payments,
            repos.events.clone(),
            attendance.clone(),
            &config.payment,
        );
        let oauth = config
            .oauth
            .google
            .clone()
            .map(|google| GoogleOAuth::new(google, db.clone()));

        Self {
            keys: keys.clone(),
            auth: AuthService::new(db.clone(), keys),
            comments: CommentService::new(db.clone(), notifications.clone()),
            messaging: MessagingService::new(
                db.clone(),
                repos.connections.clone(),
                transports.chat_sockets.clone(),
            ),
            profiles: ProfileService::new(db.clone(), repos.connections.clone()),
            oauth,
            attendance,
            connections,
            notifications,
            groups,
            events,
            payments,
            notification_sockets: transports.notification_sockets,
            chat_sockets: transports.chat_sockets,
            config: Arc::new(config),
            db,
        }
    }
}
