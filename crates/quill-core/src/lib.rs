//! # Quill Core
//!
//! The domain layer of the Quill blog.
//! Posts, comments, tags and the repository ports that storage backends
//! implement. No infrastructure dependencies live here.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::{DomainError, RepoError};
