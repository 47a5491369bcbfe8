//! Inbound chat surface: the transport posts each driver message here and
//! delivers the reply text we hand back.

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct InboundMessage {
    pub from: String,
    pub body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageReply {
    pub reply: String,
}

pub async fn inbound_message(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> impl IntoResponse {
    tracing::info!(from = %message.from, "inbound message");

    let reply = state
        .command_router
        .dispatch(&message.from, &message.body)
        .await;

    (StatusCode::OK, Json(MessageReply { reply }))
}
