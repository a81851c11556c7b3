//! Router modules, split by who may call them.
//!
//! Access control is applied per module by `create_router`: nothing under
//! `authenticated` runs without a session and nothing under `admin` runs without an
//! admin session.

/// Anonymous, read-only routes plus the login/registration gateway.
pub mod public;

/// Routes wrapped in the `require_auth` middleware.
pub mod authenticated;

/// Routes nested under `/api/admin` and wrapped in the `require_admin` middleware.
pub mod admin;
