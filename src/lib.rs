//! B2B Moderator Gateway Library
//!
//! This library provides the core functionality for the supplier moderation
//! dashboard gateway: the mock/forwarding request proxy, the reliability
//! deriver over supplier registry data, and the auth-status relay.
//!
//! # Modules
//!
//! - `auth`: auth-status endpoint and cookie handling.
//! - `backend_client`: HTTP client for the moderation backend.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and shared state.
//! - `mock_router`: Mock-mode dispatch over the static fixture.
//! - `models`: Core data models.
//! - `proxy`: Generic request proxy surface.
//! - `reliability`: Reliability score and fact derivation.

pub mod auth;
pub mod backend_client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod mock_router;
pub mod models;
pub mod proxy;
pub mod reliability;
