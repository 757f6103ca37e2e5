//! `/ws/notifications`: server-to-client push of notifications and
//! connection events for one user.
use actix::{Actor, ActorContext, AsyncContext, Handler, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use futures::StreamExt;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use super::session::{authorize, Outbound, WsQuery, CLIENT_TIMEOUT, HEARTBEAT_INTERVAL};
use super::{SocketRegistry, SubscriberId};
use crate::app_state::AppState;
use crate::metrics::ACTIVE_SOCKETS;

const CHANNEL: &str = "notifications";

pub struct NotificationSocket {
    user_id: Uuid,
    subscriber_id: SubscriberId,
    registry: SocketRegistry,
    frames: Option<UnboundedReceiver<String>>,
    hb: Instant,
}

impl NotificationSocket {
    pub fn new(
        user_id: Uuid,
        subscriber_id: SubscriberId,
        registry: SocketRegistry,
        frames: UnboundedReceiver<String>,
    ) -> Self {
        Self {
            user_id,
            subscriber_id,
            registry,
            frames: Some(frames),
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(user_id = %act.user_id, "notification socket heartbeat timed out");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for NotificationSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "notification socket opened");
        ACTIVE_SOCKETS.with_label_values(&[CHANNEL]).inc();
        self.hb(ctx);

        if let Some(frames) = self.frames.take() {
            ctx.add_message_stream(UnboundedReceiverStream::new(frames).map(Outbound));
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "notification socket closed");
        ACTIVE_SOCKETS.with_label_values(&[CHANNEL]).dec();

        let registry = self.registry.clone();
        let user_id = self.user_id;
        let subscriber_id = self.subscriber_id;
        actix::spawn(async move {
            registry.unsubscribe(user_id, subscriber_id).await;
        });
    }
}

impl Handler<Outbound> for NotificationSocket {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for NotificationSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            // The channel is push-only; any client text just counts as liveness
            Ok(ws::Message::Text(_)) | Ok(ws::Message::Binary(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "notification socket protocol error");
                ctx.stop();
            }
            _ => {}
        }
    }
}

/// GET /ws/notifications?userId=&token=
pub async fn notifications_ws(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsQuery>,
) -> Result<HttpResponse, Error> {
    if let Err(status) = authorize(&req, &query, &state) {
        return Ok(HttpResponse::build(status).finish());
    }

    let registry = state.notification_sockets.clone();
    let (subscriber_id, frames) = registry.subscribe(query.user_id).await;
    ws::start(
        NotificationSocket::new(query.user_id, subscriber_id, registry, frames),
        &req,
        stream,
    )
}
