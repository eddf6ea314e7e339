//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints. Handlers only extract, call a
//! service and shape the response envelope.

pub mod auth;
pub mod comment;
pub mod conversation;
pub mod engagement;
pub mod event;
pub mod friend;
pub mod health;
pub mod notification;
pub mod post;
pub mod report;
pub mod search;
pub mod upload;
pub mod user;
