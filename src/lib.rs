//! # Social Server Library
//!
//! Backend for a social network: profiles, follows and friendships, posts
//! with comments and engagement, direct messages, notifications, events,
//! moderation reports, search and media uploads.
//!
//! - RESTful HTTP API under `/api/v1` with a uniform JSON envelope
//! - PostgreSQL for persistent storage
//! - Redis (or in-process counters) for rate limiting
//!
//! ## Architecture
//!
//! - **Domain Layer**: Entities, value objects, repository traits and ports
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Postgres repositories, Redis, storage, metrics
//! - **Presentation Layer**: HTTP routes, handlers, extractors and middleware
//!
//! ## Module Structure
//!
//! ```text
//! social_server/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, value objects, and traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Database, cache and storage implementations
//! +-- presentation/   HTTP routes and middleware
//! +-- shared/         Errors, envelope, pagination, validation, ids
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
