//! Ports - trait definitions for storage backends.
//! Infrastructure provides the implementations.

mod repository;

pub use repository::{BaseRepository, CommentRepository, PostRepository, UserRepository};
