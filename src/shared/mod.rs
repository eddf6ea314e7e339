//! Shared Utilities
//!
//! The request contract pieces used across all layers: error vocabulary,
//! response envelope, pagination, input validation and trace ids.

pub mod error;
pub mod pagination;
pub mod response;
pub mod snowflake;
pub mod trace_id;
pub mod validation;

pub use error::{AppError, ErrorCode, FieldError};
pub use pagination::{Cursor, Keyset, Page, PageLimits, PageRequest, SortDirection};
pub use response::{ApiResponse, ApiResult, ResponseMeta};
pub use trace_id::TraceId;
