//! # Domain Layer
//!
//! Entities, value objects and repository traits of the social network. It is
//! independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: users, posts, comments, relationships, conversations, events...
//! - **value_objects**: identity, upload policy, session tokens
//! - **services**: hashtag extraction and friend-graph rules
//! - **ports**: rate-limit counters, object storage, readiness probes

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;
