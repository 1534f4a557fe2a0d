//! Middleware and request guards.

pub mod admin;
pub mod error;
