//! Route configuration
//!
//! Each domain registers its own scope; literal segments are registered
//! before the `{id}` patterns they would otherwise collide with.

use actix_web::web;

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::websocket::{chat_ws, notifications_ws};

/// Configure all routes for the application
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health::health))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/ws/notifications", web::get().to(notifications_ws))
        .route("/ws/chat", web::get().to(chat_ws))
        .configure(auth)
        .configure(users)
        .configure(groups)
        .configure(events)
        .configure(connections)
        .configure(comments)
        .configure(messages)
        .configure(notifications)
        .configure(payments);
}

fn auth(cfg: &mut web::ServiceConfig) {
    use handlers::auth::*;

    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/signin", web::post().to(signin))
            .route("/signout", web::post().to(signout))
            .route("/whoami", web::get().to(whoami))
            .route("/google", web::get().to(google_start))
            .route("/google/callback", web::get().to(google_callback)),
    );
}

fn users(cfg: &mut web::ServiceConfig) {
    use handlers::users::*;

    cfg.service(
        web::scope("/users")
            .route("/me", web::patch().to(update_me))
            .route("/{id}", web::get().to(get_profile)),
    );
}

fn groups(cfg: &mut web::ServiceConfig) {
    use handlers::groups::*;

    cfg.service(
        web::scope("/groups")
            .route("", web::get().to(list_groups))
            .route("", web::post().to(create_group))
            .route("/{id}", web::get().to(get_group))
            .route("/{id}/members", web::get().to(list_members))
            .route("/{id}/join", web::post().to(join_group))
            .route("/{id}/leave", web::post().to(leave_group)),
    );
}

fn events(cfg: &mut web::ServiceConfig) {
    use handlers::events::*;

    cfg.service(
        web::scope("/events")
            .route("", web::get().to(list_events))
            .route("", web::post().to(create_event))
            .route("/{id}", web::get().to(get_event))
            .route("/{id}/attendees", web::get().to(list_attendees))
            .route("/{id}/join", web::post().to(join_event))
            .route("/{id}/leave", web::post().to(leave_event)),
    );
}

fn connections(cfg: &mut web::ServiceConfig) {
    use handlers::connections::*;

    cfg.service(
        web::scope("/connections")
            .route("/requests/pending", web::get().to(pending_requests))
            .route("/accept/{request_id}", web::post().to(accept_request))
            .route("/reject/{request_id}", web::post().to(reject_request))
            .route(
                "/{sender_id}/request/{recipient_id}",
                web::post().to(send_request),
            )
            .route(
                "/{sender_id}/cancel/{recipient_id}",
                web::post().to(cancel_request),
            )
            .route("/{id}", web::get().to(list_connections))
            .route("/{id}", web::delete().to(remove_connection)),
    );
}

fn comments(cfg: &mut web::ServiceConfig) {
    use handlers::comments::*;

    cfg.service(
        web::scope("/comments")
            .route("", web::get().to(list_comments))
            .route("", web::post().to(create_comment))
            .route("/{id}", web::delete().to(delete_comment))
            .route("/{id}/like", web::post().to(like_comment))
            .route("/{id}/like", web::delete().to(unlike_comment)),
    );
}

fn messages(cfg: &mut web::ServiceConfig) {
    use handlers::messages::*;

    cfg.service(
        web::scope("/messages")
            .route("/send", web::post().to(send_message))
            .route("/conversation", web::get().to(conversation)),
    );
}

fn notifications(cfg: &mut web::ServiceConfig) {
    use handlers::notifications::*;

    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_notifications))
            .route("", web::patch().to(mark_all_read))
            .route("/{id}", web::patch().to(mark_read))
            .route("/{id}", web::delete().to(delete_notification)),
    );
}

fn payments(cfg: &mut web::ServiceConfig) {
    use handlers::payments::*;

    cfg.service(
        web::scope("/payments")
            .route("/intent", web::post().to(create_intent))
            .route("/webhook", web::post().to(webhook)),
    );
}
