//! # Domain Services
//!
//! Pure business rules that don't belong to a single entity.
//!
//! - **hashtags**: tag extraction from post content
//! - **social_graph**: mutual friends and friend suggestions

mod hashtags;
mod social_graph;

pub use hashtags::{extract_hashtags, normalize_tag, MAX_TAGS, MAX_TAG_LENGTH};
pub use social_graph::{mutual_friends, suggest_friends, Suggestion};
