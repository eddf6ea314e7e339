//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! - **Identity**: who is acting on a request
//! - **UploadKind**: upload purpose with its content-type allow-list and size limit
//! - **session_token**: opaque token generation and hashing

mod identity;
mod session_token;
mod upload;

pub use identity::Identity;
pub use session_token::{generate_token, hash_token};
pub use upload::{object_key, UploadKind};
