//! `/ws/chat`: direct messages between connected users.
//!
//! Inbound `{"type":"send","recipientId":..,"content":..}` frames are stored
//! and relayed to the recipient's chat sockets. The author gets a `sent`
//! frame back, or an `error` frame with code `NOT_CONNECTED` when the two
//! users are not connected.
use actix::{Actor, ActorContext, AsyncContext, Handler, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use futures::StreamExt;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use super::session::{authorize, Outbound, WsQuery, CLIENT_TIMEOUT, HEARTBEAT_INTERVAL};
use super::{ChatInbound, LiveEvent, SocketRegistry, SubscriberId};
use crate::app_state::AppState;
use crate::error::AppError;
use crate::metrics::ACTIVE_SOCKETS;
use crate::services::MessagingService;

const CHANNEL: &str = "chat";

pub struct ChatSocket {
    user_id: Uuid,
    subscriber_id: SubscriberId,
    registry: SocketRegistry,
    messaging: MessagingService,
    frames: Option<UnboundedReceiver<String>>,
    hb: Instant,
}

impl ChatSocket {
    pub fn new(
        user_id: Uuid,
        subscriber_id: SubscriberId,
        registry: SocketRegistry,
        messaging: MessagingService,
        frames: UnboundedReceiver<String>,
    ) -> Self {
        Self {
            user_id,
            subscriber_id,
            registry,
            messaging,
            frames: Some(frames),
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(user_id = %act.user_id, "chat socket heartbeat timed out");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn reply(ctx: &mut ws::WebsocketContext<Self>, event: &LiveEvent) {
        match event.to_json() {
            Ok(frame) => ctx.text(frame),
            Err(e) => tracing::error!(error = %e, "failed to encode chat frame"),
        }
    }

    fn handle_inbound(&self, frame: ChatInbound, ctx: &mut ws::WebsocketContext<Self>) {
        let ChatInbound::Send {
            recipient_id,
            content,
        } = frame;

        let messaging = self.messaging.clone();
        let sender_id = self.user_id;
        let addr = ctx.address();

        actix::spawn(async move {
            let reply = match messaging.send(sender_id, recipient_id, &content).await {
                Ok(message) => LiveEvent::Sent { message },
                Err(AppError::Forbidden(msg)) => LiveEvent::error("NOT_CONNECTED", msg),
                Err(AppError::InvalidInput(msg)) => LiveEvent::error("INVALID_MESSAGE", msg),
                Err(e) => {
                    tracing::error!(sender_id = %sender_id, error = %e, "chat send failed");
                    LiveEvent::error("SEND_FAILED", "message could not be sent")
                }
            };
            match reply.to_json() {
                Ok(frame) => addr.do_send(Outbound(frame)),
                Err(e) => tracing::error!(error = %e, "failed to encode chat frame"),
            }
        });
    }
}

impl Actor for ChatSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "chat socket opened");
        ACTIVE_SOCKETS.with_label_values(&[CHANNEL]).inc();
        self.hb(ctx);

        if let Some(frames) = self.frames.take() {
            ctx.add_message_stream(UnboundedReceiverStream::new(frames).map(Outbound));
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "chat socket closed");
        ACTIVE_SOCKETS.with_label_values(&[CHANNEL]).dec();

        let registry = self.registry.clone();
        let user_id = self.user_id;
        let subscriber_id = self.subscriber_id;
        actix::spawn(async move {
            registry.unsubscribe(user_id, subscriber_id).await;
        });
    }
}

impl Handler<Outbound> for ChatSocket {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChatSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                match serde_json::from_str::<ChatInbound>(&text) {
                    Ok(frame) => self.handle_inbound(frame, ctx),
                    Err(e) => {
                        tracing::debug!(user_id = %self.user_id, error = %e, "unparseable chat frame");
                        Self::reply(ctx, &LiveEvent::error("BAD_FRAME", e.to_string()));
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                Self::reply(
                    ctx,
                    &LiveEvent::error("BAD_FRAME", "binary frames are not supported"),
                );
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "chat socket protocol error");
                ctx.stop();
            }
            _ => {}
        }
    }
}

/// GET /ws/chat?userId=&token=
pub async fn chat_ws(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsQuery>,
) -> Result<HttpResponse, Error> {
    if let Err(status) = authorize(&req, &query, &state) {
        return Ok(HttpResponse::build(status).finish());
    }

    let registry = state.chat_sockets.clone();
    let (subscriber_id, frames) = registry.subscribe(query.user_id).await;
    ws::start(
        ChatSocket::new(
            query.user_id,
            subscriber_id,
            registry,
            state.messaging.clone(),
            frames,
        ),
        &req,
        stream,
    )
}
