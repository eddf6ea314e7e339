//! Integration Tests Entry Point
//!
//! Tests are organized by module:
//! - `api/` - Envelope, pagination, validation, upload policy and rate limiting
//!   exercised through the public crate API
//! - `common/` - Shared test utilities

mod api;
mod common;
