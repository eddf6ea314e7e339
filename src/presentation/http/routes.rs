//! Route Configuration
//!
//! Configures all HTTP routes for the API. Path parameters are named in
//! camelCase so validation errors on them use the wire field name.

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    http::StatusCode,
    middleware,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;

use super::handlers;
use crate::domain::UploadKind;
use crate::presentation::middleware::cors::create_cors_layer;
use crate::presentation::middleware::{
    create_security_headers_layer, rate_limit_post_create, rate_limit_report, rate_limit_upload,
    rate_limit_verification, trace_requests,
};
use crate::shared::error::{AppError, ErrorCode};
use crate::shared::response::error_response;
use crate::startup::AppState;

/// Room for multipart boundaries and the `type` part on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let settings = state.settings.clone();

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(handlers::health::metrics))
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(trace_requests))
        .layer(CompressionLayer::new())
        // Outermost so headers land on every response, including errors
        .layer(create_security_headers_layer(&settings))
        .layer(create_cors_layer(&settings.cors))
        .with_state(state)
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/users", user_routes())
        .route("/blocks", get(handlers::user::blocks))
        .nest("/posts", post_routes(state.clone()))
        .route("/comments/{commentId}", delete(handlers::comment::delete_comment))
        .nest("/friends", friend_routes())
        .nest("/conversations", conversation_routes())
        .nest("/notifications", notification_routes())
        .nest("/events", event_routes())
        .route(
            "/reports",
            post(handlers::report::create_report
                .layer(middleware::from_fn_with_state(state.clone(), rate_limit_report))),
        )
        .route("/search", get(handlers::search::search))
        .route(
            "/uploads",
            post(handlers::upload::upload)
                .layer(DefaultBodyLimit::max(upload_body_limit()))
                .route_layer(middleware::from_fn_with_state(state, rate_limit_upload)),
        )
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route(
            "/verification/resend",
            post(handlers::auth::resend_verification
                .layer(middleware::from_fn_with_state(state, rate_limit_verification))),
        )
        .route("/verification/confirm", post(handlers::auth::confirm_verification))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::user::me).patch(handlers::user::update_me))
        .route("/me/saved", get(handlers::user::saved))
        .route("/suggestions", get(handlers::user::suggestions))
        .route("/{userId}", get(handlers::user::get_user))
        .route("/{userId}/posts", get(handlers::user::user_posts))
        .route("/{userId}/followers", get(handlers::user::followers))
        .route("/{userId}/following", get(handlers::user::following))
        .route("/{userId}/mutual-friends", get(handlers::user::mutual_friends))
        .route(
            "/{userId}/follow",
            post(handlers::user::follow).delete(handlers::user::unfollow),
        )
        .route(
            "/{userId}/block",
            post(handlers::user::block).delete(handlers::user::unblock),
        )
}

fn post_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::post::feed).post(
                handlers::post::create_post
                    .layer(middleware::from_fn_with_state(state, rate_limit_post_create)),
            ),
        )
        .route(
            "/{postId}",
            get(handlers::post::get_post)
                .patch(handlers::post::update_post)
                .delete(handlers::post::delete_post),
        )
        .route(
            "/{postId}/comments",
            get(handlers::comment::list_comments).post(handlers::comment::create_comment),
        )
        .route(
            "/{postId}/like",
            post(handlers::engagement::like).delete(handlers::engagement::unlike),
        )
        .route(
            "/{postId}/save",
            post(handlers::engagement::save).delete(handlers::engagement::unsave),
        )
        .route("/{postId}/share", post(handlers::engagement::share))
}

fn friend_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::friend::list_friends))
        .route(
            "/requests",
            get(handlers::friend::list_requests).post(handlers::friend::send_request),
        )
        .route("/requests/{requestId}/accept", post(handlers::friend::accept_request))
        .route("/requests/{requestId}/decline", post(handlers::friend::decline_request))
        .route("/{userId}", delete(handlers::friend::remove_friend))
}

fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::conversation::list_conversations)
                .post(handlers::conversation::open_conversation),
        )
        .route(
            "/{conversationId}/messages",
            get(handlers::conversation::list_messages).post(handlers::conversation::send_message),
        )
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::notification::list_notifications))
        .route("/unread-count", get(handlers::notification::unread_count))
        .route("/read-all", post(handlers::notification::mark_all_read))
        .route("/{notificationId}/read", post(handlers::notification::mark_read))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::event::list_events).post(handlers::event::create_event),
        )
        .route("/{eventId}", get(handlers::event::get_event))
        .route(
            "/{eventId}/attend",
            post(handlers::event::attend).delete(handlers::event::unattend),
        )
}

fn upload_body_limit() -> usize {
    UploadKind::largest_limit() as usize + MULTIPART_OVERHEAD
}

async fn route_not_found() -> AppError {
    AppError::not_found("Route")
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");

    error_response(
        ErrorCode::InternalError,
        "Internal server error",
        StatusCode::INTERNAL_SERVER_ERROR,
        None,
    )
}
