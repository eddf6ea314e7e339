//! Conversation Handlers
//!
//! Direct one-to-one conversations. Only participants may read or post.

use axum::{extract::State, http::StatusCode};

use crate::application::dto::parse_id;
use crate::application::dto::request::{CreateConversationRequest, PageQuery, SendMessageRequest};
use crate::application::dto::response::{ConversationResponse, MessageResponse};
use crate::presentation::http::extractors::{PathId, ValidatedJson, ValidatedQuery};
use crate::presentation::middleware::AuthContext;
use crate::shared::response::{ApiResponse, ApiResult};
use crate::startup::AppState;

/// Conversations ordered by last activity
pub async fn list_conversations(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<ConversationResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let viewer = ctx.user_id;

    let conversations = state.conversation_service().list(viewer, page).await?;
    Ok(ApiResponse::page(
        conversations.map(|c| ConversationResponse::from_summary(c, viewer)),
    ))
}

/// Find or create; 201 when created, 200 when it already existed
pub async fn open_conversation(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(body): ValidatedJson<CreateConversationRequest>,
) -> ApiResult<ConversationResponse> {
    let participant_id = parse_id("participantId", &body.participant_id)?;
    let (conversation, created) = state
        .conversation_service()
        .open(ctx.user_id, participant_id)
        .await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok(ApiResponse::success(ConversationResponse::from_summary(conversation, ctx.user_id)).with_status(status))
}

pub async fn list_messages(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(conversation_id): PathId,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<MessageResponse>> {
    let page = state.page(query.cursor.as_deref(), query.limit)?;
    let viewer = ctx.user_id;

    let messages = state
        .conversation_service()
        .messages(viewer, conversation_id, page)
        .await?;
    Ok(ApiResponse::page(messages.map(|m| MessageResponse::from_message(m, viewer))))
}

pub async fn send_message(
    State(state): State<AppState>,
    ctx: AuthContext,
    PathId(conversation_id): PathId,
    ValidatedJson(body): ValidatedJson<SendMessageRequest>,
) -> ApiResult<MessageResponse> {
    let message = state
        .conversation_service()
        .send(ctx.user_id, conversation_id, body)
        .await?;

    Ok(ApiResponse::created(MessageResponse::from_message(message, ctx.user_id)))
}
