/// Connection workflow: request, accept/reject, cancel, remove.
///
/// A request lives only while pending. Accepting links both users in the
/// symmetric connections relation in the same step that deletes the request
/// row; that delete decides which of two concurrent responses wins.
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::NotificationDispatcher;
use crate::error::{AppError, Result};
use crate::metrics::record_connection_action;
use crate::models::{ConnectionRequest, Decision, NotificationKind, UserSummary};
use crate::repository::{ConnectionRepository, UserRepository};
use crate::websocket::LiveEvent;

#[derive(Clone)]
pub struct ConnectionWorkflow {
    connections: Arc<dyn ConnectionRepository>,
    users: Arc<dyn UserRepository>,
    notifier: NotificationDispatcher,
}

impl ConnectionWorkflow {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        users: Arc<dyn UserRepository>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            connections,
            users,
            notifier,
        }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<UserSummary> {
        self.users
            .find_summary(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
    }

    pub async fn send_request(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<ConnectionRequest> {
        if sender_id == recipient_id {
            return Err(AppError::InvalidInput(
                "cannot send a connection request to yourself".into(),
            ));
        }

        let sender = self.require_user(sender_id).await?;
        self.require_user(recipient_id).await?;

        if self.connections.are_connected(sender_id, recipient_id).await? {
            return Err(AppError::Conflict("users are already connected".into()));
        }
        if self
            .connections
            .find_pending_between(sender_id, recipient_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "a connection request is already pending".into(),
            ));
        }

        let Some(request) = self
            .connections
            .create_request(sender_id, recipient_id)
            .await?
        else {
            // lost a race with another request or an accept for the same pair
            return Err(AppError::Conflict(
                "a connection request is already pending or the users are connected".into(),
            ));
        };

        record_connection_action("requested");
        info!(
            request_id = %request.id,
            sender_id = %sender_id,
            recipient_id = %recipient_id,
            "connection request sent"
        );

        if let Err(e) = self
            .notifier
            .dispatch(
                recipient_id,
                sender_id,
                NotificationKind::ConnectionRequest.as_str(),
                format!("{} sent you a connection request", sender.username),
                None,
            )
            .await
        {
            error!(request_id = %request.id, error = %e, "failed to notify recipient");
        }

        Ok(request)
    }

    /// Accept or reject a pending request. Only its recipient may respond.
    pub async fn respond(
        &self,
        request_id: Uuid,
        responder_id: Uuid,
        decision: Decision,
    ) -> Result<ConnectionRequest> {
        let request = self
            .connections
            .find_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("connection request {request_id}")))?;

        if request.recipient_id != responder_id {
            return Err(AppError::Forbidden(
                "only the recipient can respond to a connection request".into(),
            ));
        }

        let not_found = || AppError::NotFound(format!("connection request {request_id}"));

        match decision {
            Decision::Accepted => {
                let recipient = self.require_user(request.recipient_id).await?;
                if self.connections.accept_request(request_id).await?.is_none() {
                    return Err(not_found());
                }

                record_connection_action("accepted");
                info!(
                    request_id = %request_id,
                    requester_id = %request.requester_id,
                    recipient_id = %request.recipient_id,
                    "connection accepted"
                );

                if let Err(e) = self
                    .notifier
                    .dispatch(
                        request.requester_id,
                        request.recipient_id,
                        NotificationKind::ConnectionAccepted.as_str(),
                        format!("{} accepted your connection request", recipient.username),
                        None,
                    )
                    .await
                {
                    error!(request_id = %request_id, error = %e, "failed to notify requester");
                }
            }
            Decision::Rejected => {
                if !self.connections.delete_request(request_id).await? {
                    return Err(not_found());
                }
                record_connection_action("rejected");
                info!(request_id = %request_id, "connection rejected");
            }
        }

        Ok(request)
    }

    /// Withdraw a pending request. Only the original sender may cancel.
    pub async fn cancel(&self, caller_id: Uuid, sender_id: Uuid, recipient_id: Uuid) -> Result<()> {
        if caller_id != sender_id {
            return Err(AppError::Unauthorized(
                "only the sender can cancel a connection request".into(),
            ));
        }

        let request = self
            .connections
            .find_pending(sender_id, recipient_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no pending connection request".into()))?;

        if !self.connections.delete_request(request.id).await? {
            return Err(AppError::NotFound("no pending connection request".into()));
        }

        if let Err(e) = self
            .notifier
            .retract(
                recipient_id,
                sender_id,
                NotificationKind::ConnectionRequest.as_str(),
            )
            .await
        {
            error!(request_id = %request.id, error = %e, "failed to retract request notification");
        }
        self.notifier
            .push(
                recipient_id,
                sender_id,
                LiveEvent::ConnectionCancelled {
                    sender_id,
                    recipient_id,
                },
            )
            .await;

        record_connection_action("cancelled");
        info!(request_id = %request.id, "connection request cancelled");
        Ok(())
    }

    /// Unlink two users in both directions. Removing a missing link succeeds.
    pub async fn remove(&self, user_id: Uuid, connection_id: Uuid) -> Result<()> {
        self.require_user(user_id).await?;
        self.require_user(connection_id).await?;

        if self.connections.unlink(user_id, connection_id).await? {
            record_connection_action("removed");
            info!(user_id = %user_id, connection_id = %connection_id, "connection removed");
        }
        Ok(())
    }

    pub async fn are_connected(&self, a: Uuid, b: Uuid) -> Result<bool> {
        self.connections.are_connected(a, b).await
    }

    pub async fn list_connections(&self, user_id: Uuid) -> Result<Vec<UserSummary>> {
        self.require_user(user_id).await?;
        self.connections.connections_of(user_id).await
    }

    pub async fn pending_requests(&self, user_id: Uuid) -> Result<Vec<ConnectionRequest>> {
        self.connections.pending_for(user_id).await
    }
}
