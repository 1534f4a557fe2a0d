//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{CommentRepository, PostRepository, UserRepository};
use quill_infra::InMemoryStore;

use crate::config::AppConfig;

#[cfg(feature = "postgres")]
use quill_infra::database::{
    DatabaseConnections, PostgresCommentRepository, PostgresPostRepository,
    PostgresUserRepository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
    pub posts_per_page: u64,
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Build the application state, using PostgreSQL when configured and
    /// reachable and the in-memory store otherwise.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        if let Some(db_config) = config.database.as_ref() {
            match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let conn = Arc::new(connections);
                    let state = Self {
                        users: Arc::new(PostgresUserRepository::new(conn.main.clone())),
                        posts: Arc::new(PostgresPostRepository::new(conn.main.clone())),
                        comments: Arc::new(PostgresCommentRepository::new(conn.main.clone())),
                        db: Some(conn),
                        posts_per_page: config.posts_per_page,
                        admin_token: config.admin_token.as_deref().map(Arc::from),
                    };
                    tracing::info!("Application state initialized (postgres)");
                    return state;
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory store");

        let mut state = Self::in_memory(InMemoryStore::new(), config.posts_per_page);
        state.admin_token = config.admin_token.as_deref().map(Arc::from);
        tracing::info!("Application state initialized (in-memory)");
        state
    }

    /// State backed by an in-memory store.
    pub fn in_memory(store: InMemoryStore, posts_per_page: u64) -> Self {
        Self {
            users: Arc::new(store.users()),
            posts: Arc::new(store.posts()),
            comments: Arc::new(store.comments()),
            #[cfg(feature = "postgres")]
            db: None,
            posts_per_page,
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: impl Into<Arc<str>>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Name of the active storage backend.
    pub fn storage(&self) -> &'static str {
        #[cfg(feature = "postgres")]
        if self.db.is_some() {
            return "postgres";
        }
        "memory"
    }
}
